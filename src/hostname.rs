use gethostname::gethostname;
use std::ffi::{CStr, CString};
use std::{mem, ptr};

/// The machine's canonical name, or its short hostname when that cannot be resolved.
pub fn local_hostname() -> Option<String> {
    let short = match gethostname().to_str() {
        Some(hostname) => hostname.to_string(),
        None => {
            log::error!("Hostname is not valid UTF-8");
            return None;
        }
    };

    match canonical_name(&short) {
        Some(canonical) => Some(canonical),
        None => {
            log::debug!("Cannot canonicalise '{short}', using it as is");
            Some(short)
        }
    }
}

/// `getaddrinfo(AI_CANONNAME)` lookup of `name`.
pub fn canonical_name(name: &str) -> Option<String> {
    let node = CString::new(name).ok()?;

    // SAFETY: addrinfo is a plain C struct for which all-zero bytes is a valid value.
    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_flags = libc::AI_CANONNAME;

    let mut res: *mut libc::addrinfo = ptr::null_mut();
    // SAFETY: node is NUL-terminated, hints outlives the call and res is a valid out pointer.
    let rc = unsafe { libc::getaddrinfo(node.as_ptr(), ptr::null(), &hints, &mut res) };
    if rc != 0 || res.is_null() {
        return None;
    }

    // SAFETY: res is a valid list returned by getaddrinfo and freed exactly once below.
    let canonical = unsafe {
        let canonname = (*res).ai_canonname;
        let canonical = if canonname.is_null() {
            None
        } else {
            CStr::from_ptr(canonname).to_str().ok().map(str::to_string)
        };
        libc::freeaddrinfo(res);
        canonical
    };

    canonical.filter(|name| !name.is_empty())
}
