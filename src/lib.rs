pub mod config;
pub mod error;
pub mod hostname;
pub mod http_client;
pub mod nss_http_client;
pub mod request_url;
pub mod response_buffer;

#[cfg(test)]
mod test_server;

use libnss::group::{Group, GroupHooks};
use libnss::interop::Response;
use libnss::passwd::{Passwd, PasswdHooks};
use libnss::shadow::{Shadow, ShadowHooks};
use libnss::{
    libnss_group_hooks,
    libnss_passwd_hooks,
    libnss_shadow_hooks,
};
use crate::config::CONFIG_FILE;
use crate::nss_http_client::NssHttpClient;

/// Loads the configuration for this lookup and hands the client to `lookup`.
fn with_client<T, F>(lookup: F) -> Response<T>
where F: FnOnce(&NssHttpClient) -> Response<T>,
{
    match NssHttpClient::from_config_file(CONFIG_FILE) {
        Ok(client) => lookup(&client),
        Err(err) => {
            log::error!("{err}");
            Response::Unavail
        }
    }
}

struct HttpPasswd;
libnss_passwd_hooks!(http, HttpPasswd);

impl PasswdHooks for HttpPasswd {
    fn get_all_entries() -> Response<Vec<Passwd>> {
        with_client(|client| client.all_passwd())
    }

    fn get_entry_by_uid(uid: libc::uid_t) -> Response<Passwd> {
        with_client(|client| client.passwd_by_uid(uid))
    }

    fn get_entry_by_name(name: String) -> Response<Passwd> {
        with_client(|client| client.passwd_by_name(&name))
    }
}

struct HttpGroup;
libnss_group_hooks!(http, HttpGroup);

impl GroupHooks for HttpGroup {
    fn get_all_entries() -> Response<Vec<Group>> {
        with_client(|client| client.all_groups())
    }

    fn get_entry_by_gid(gid: libc::gid_t) -> Response<Group> {
        with_client(|client| client.group_by_gid(gid))
    }

    fn get_entry_by_name(name: String) -> Response<Group> {
        with_client(|client| client.group_by_name(&name))
    }
}

struct HttpShadow;
libnss_shadow_hooks!(http, HttpShadow);

impl ShadowHooks for HttpShadow {
    fn get_all_entries() -> Response<Vec<Shadow>> {
        with_client(|client| client.all_shadow())
    }

    fn get_entry_by_name(name: String) -> Response<Shadow> {
        with_client(|client| client.shadow_by_name(&name))
    }
}
