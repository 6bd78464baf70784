use crate::config::Config;
use crate::error::RequestError;
use crate::response_buffer::{AppendError, ResponseBuffer, MAX_BUFFER_SIZE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use ureq::Agent;

pub const USER_AGENT: &str = "NSS-HTTP";

const READ_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: ResponseBuffer,
}

/// One-shot blocking GET client configured from [`Config`].
pub struct HttpClient<'a> {
    config: &'a Config,
    agent: Agent,
    max_body_size: usize,
}

impl<'a> HttpClient<'a> {
    pub fn new(config: &'a Config) -> Result<HttpClient<'a>, RequestError> {
        let tls_connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        // A 3xx comes back to the caller instead of being followed to another host.
        let mut builder = ureq::AgentBuilder::new()
            .tls_connector(Arc::new(tls_connector))
            .redirects(0);
        if let Some(timeout) = config.timeout {
            builder = builder
                .timeout_connect ( timeout )
                .timeout         ( timeout );
        }

        Ok(HttpClient {
            config,
            agent: builder.build(),
            max_body_size: MAX_BUFFER_SIZE,
        })
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> HttpClient<'a> {
        self.max_body_size = max_body_size;
        self
    }

    /// Non-200 answers are returned with their body; only transport trouble is an `Err`.
    ///
    /// Credentials go out as preemptive HTTP Basic. There is no scheme negotiation,
    /// so a server that only accepts Digest or Negotiate answers 401.
    pub fn get(&self, url: &str) -> Result<HttpResponse, RequestError> {
        log::debug!("GET {url}");

        let mut request = self.agent.get(url).set("User-Agent", USER_AGENT);

        if let Some(user) = &self.config.user {
            log::debug!("Sending authenticated request as user {user}");
            let password = self.config.password.as_deref().unwrap_or("");
            let credentials = STANDARD.encode(format!("{user}:{password}"));
            request = request.set("Authorization", &format!("Basic {credentials}"));
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                log::error!("Request to {url} failed: {transport}");
                return Err(RequestError::from(Box::new(transport)));
            }
        };

        let status = response.status();
        log::debug!("Received http status code {status}");
        if status != 200 {
            log::warn!("Unexpected http status code {status} from {url}");
        }
        if status == 401 && self.config.user.is_some() {
            log::debug!("Server rejected Basic credentials; other authentication schemes are not supported");
        }

        let body = read_body(response.into_reader(), self.max_body_size)?;

        Ok(HttpResponse { status, body })
    }
}

fn read_body(mut reader: impl Read, max_body_size: usize) -> Result<ResponseBuffer, RequestError> {
    let mut body = ResponseBuffer::new(max_body_size);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                log::error!("Cannot read response body: {err}");
                return Err(RequestError::Body(err));
            }
        };

        match body.append(&chunk[..read]) {
            Ok(()) => {}
            Err(AppendError::TooLarge) => {
                log::debug!("Response data is too large, keeping the first {} bytes", body.len());
                break;
            }
            Err(AppendError::OutOfMemory) => {
                log::error!("Not enough memory for response body");
                return Err(RequestError::OutOfMemory);
            }
        }
    }

    Ok(body)
}
