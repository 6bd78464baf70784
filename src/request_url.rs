/// Builds `<server>/<endpoint>?[<key>&]hostname=<hostname>`.
///
/// Nothing is URL-encoded: callers pass components that are already safe.
pub fn request_url(server: &str, endpoint: &str, key: &str, hostname: &str) -> String {
    if key.is_empty() {
        format!("{server}/{endpoint}?hostname={hostname}")
    } else {
        format!("{server}/{endpoint}?{key}&hostname={hostname}")
    }
}
