use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot open configuration file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot read configuration file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Failures of a single HTTP request.
///
/// A non-200 status is not an error: it comes back as data in
/// [`HttpResponse::status`](crate::http_client::HttpResponse).
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("cannot build TLS connector: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("transport failure: {0}")]
    Transport(#[from] Box<ureq::Transport>),

    #[error("cannot read response body: {0}")]
    Body(#[from] io::Error),

    #[error("not enough memory for response body")]
    OutOfMemory,
}
