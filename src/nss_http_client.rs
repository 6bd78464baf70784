use crate::config::Config;
use crate::error::ConfigError;
use crate::hostname::local_hostname;
use crate::http_client::HttpClient;
use crate::request_url::request_url;
use libnss::group::Group;
use libnss::interop::Response;
use libnss::passwd::Passwd;
use libnss::shadow::Shadow;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;

#[derive(Debug, PartialEq, Deserialize)]
pub struct PasswdEntry {
    pub pw_name   : String,
    #[serde(default = "default_passwd")]
    pub pw_passwd : String,
    pub pw_uid    : u32,
    pub pw_gid    : u32,
    #[serde(default)]
    pub pw_gecos  : String,
    #[serde(default = "default_dir")]
    pub pw_dir    : String,
    #[serde(default = "default_shell")]
    pub pw_shell  : String,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct GroupEntry {
    pub gr_name   : String,
    #[serde(default = "default_passwd")]
    pub gr_passwd : String,
    pub gr_gid    : u32,
    #[serde(default)]
    pub gr_mem    : Vec<String>,
}

/// Day counts left out of the JSON mean "unset" (`-1`), as in `/etc/shadow`.
#[derive(Debug, PartialEq, Deserialize)]
pub struct ShadowEntry {
    pub sp_namp   : String,
    #[serde(default = "default_passwd")]
    pub sp_pwdp   : String,
    #[serde(default = "unset")]
    pub sp_lstchg : isize,
    #[serde(default = "unset")]
    pub sp_min    : isize,
    #[serde(default = "unset")]
    pub sp_max    : isize,
    #[serde(default = "unset")]
    pub sp_warn   : isize,
    #[serde(default = "unset")]
    pub sp_inact  : isize,
    #[serde(default = "unset")]
    pub sp_expire : isize,
    #[serde(default)]
    pub sp_flag   : usize,
}

fn default_passwd() -> String {
    String::from("x")
}

fn default_dir() -> String {
    String::from("/")
}

fn default_shell() -> String {
    String::from("/bin/sh")
}

fn unset() -> isize {
    -1
}

impl From<PasswdEntry> for Passwd {
    fn from(entry: PasswdEntry) -> Passwd {
        Passwd {
            name    : entry.pw_name,
            passwd  : entry.pw_passwd,
            uid     : entry.pw_uid,
            gid     : entry.pw_gid,
            gecos   : entry.pw_gecos,
            dir     : entry.pw_dir,
            shell   : entry.pw_shell,
        }
    }
}

impl From<GroupEntry> for Group {
    fn from(entry: GroupEntry) -> Group {
        Group {
            name    : entry.gr_name,
            passwd  : entry.gr_passwd,
            gid     : entry.gr_gid,
            members : entry.gr_mem,
        }
    }
}

impl From<ShadowEntry> for Shadow {
    fn from(entry: ShadowEntry) -> Shadow {
        Shadow {
            name                 : entry.sp_namp,
            passwd               : entry.sp_pwdp,
            last_change          : entry.sp_lstchg,
            change_min_days      : entry.sp_min,
            change_max_days      : entry.sp_max,
            change_warn_days     : entry.sp_warn,
            change_inactive_days : entry.sp_inact,
            expire_date          : entry.sp_expire,
            reserved             : entry.sp_flag,
        }
    }
}

fn create_nss_error<T>(message: &str, error: impl Display, response: Response<T>) -> Response<T> {
    log::error!("{message}: {error}");
    response
}

fn map_response<T, U, F>(response: Response<T>, f: F) -> Response<U>
where F: FnOnce(T) -> U,
{
    match response {
        Response::Success(value) => Response::Success(f(value)),
        Response::NotFound => Response::NotFound,
        Response::Unavail => Response::Unavail,
        Response::TryAgain => Response::TryAgain,
        Response::Return => Response::Return,
    }
}

fn convert_all<E, T: From<E>>(response: Response<Vec<E>>) -> Response<Vec<T>> {
    match map_response(response, |entries| entries.into_iter().map(T::from).collect()) {
        Response::NotFound => Response::Success(Vec::new()),
        response => response,
    }
}

/// Names travel unencoded in the query string, so only a conservative alphabet is let through.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || "._@$-".contains(c))
}

/// Answers passwd, group and shadow lookups from the configured HTTP server.
pub struct NssHttpClient {
    config: Config,
}

impl NssHttpClient {
    pub fn new(config: Config) -> NssHttpClient {
        NssHttpClient { config }
    }

    /// Loads `path` and switches logging on according to its `DEBUG` flag.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<NssHttpClient, ConfigError> {
        let config = Config::load(path)?;
        config.init_logging();
        log::debug!("Loaded {:?}", config);
        Ok(NssHttpClient::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn fetch<T: DeserializeOwned>(&self, endpoint: &str, key: &str) -> Response<T> {
        let hostname = match local_hostname() {
            Some(hostname) => hostname,
            None => return create_nss_error("Cannot get hostname", "none", Response::Unavail),
        };

        let url = request_url(&self.config.server, endpoint, key, &hostname);

        let client = match HttpClient::new(&self.config) {
            Ok(client) => client,
            Err(err) => return create_nss_error("Cannot create http client", err, Response::Unavail),
        };

        let http_response = match client.get(&url) {
            Ok(response) => response,
            Err(err) => return create_nss_error("Cannot get response", err, Response::Unavail),
        };

        match http_response.status {
            200 => {}
            404 => return Response::NotFound,
            status => {
                log::warn!("Response status is not 200: {status}");
                return Response::TryAgain;
            }
        }

        let body = http_response.body;
        if body.is_truncated() {
            return create_nss_error(
                "Response body too large",
                format!("limit is {} bytes", body.max_size()),
                Response::Unavail,
            );
        }

        if body.is_empty() {
            return Response::NotFound;
        }

        match serde_json::from_slice(body.as_bytes()) {
            Ok(entry) => Response::Success(entry),
            Err(err) => create_nss_error("Cannot deserialize response", err, Response::Unavail),
        }
    }

    fn fetch_by_name<E: DeserializeOwned>(&self, endpoint: &str, name: &str) -> Response<E> {
        if !is_safe_name(name) {
            log::error!("Refusing to look up {endpoint} entry with unsafe name {name:?}");
            return Response::NotFound;
        }
        self.fetch(endpoint, &format!("name={name}"))
    }

    pub fn all_passwd(&self) -> Response<Vec<Passwd>> {
        convert_all(self.fetch::<Vec<PasswdEntry>>("passwd", ""))
    }

    pub fn passwd_by_name(&self, name: &str) -> Response<Passwd> {
        map_response(self.fetch_by_name::<PasswdEntry>("passwd", name), Passwd::from)
    }

    pub fn passwd_by_uid(&self, uid: libc::uid_t) -> Response<Passwd> {
        map_response(self.fetch::<PasswdEntry>("passwd", &format!("uid={uid}")), Passwd::from)
    }

    pub fn all_groups(&self) -> Response<Vec<Group>> {
        convert_all(self.fetch::<Vec<GroupEntry>>("group", ""))
    }

    pub fn group_by_name(&self, name: &str) -> Response<Group> {
        map_response(self.fetch_by_name::<GroupEntry>("group", name), Group::from)
    }

    pub fn group_by_gid(&self, gid: libc::gid_t) -> Response<Group> {
        map_response(self.fetch::<GroupEntry>("group", &format!("gid={gid}")), Group::from)
    }

    pub fn all_shadow(&self) -> Response<Vec<Shadow>> {
        convert_all(self.fetch::<Vec<ShadowEntry>>("shadow", ""))
    }

    pub fn shadow_by_name(&self, name: &str) -> Response<Shadow> {
        map_response(self.fetch_by_name::<ShadowEntry>("shadow", name), Shadow::from)
    }
}
