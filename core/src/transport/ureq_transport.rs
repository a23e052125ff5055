use std::io;
use std::time::Duration;

use tracing::{debug, trace};

use super::Transport;
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Blocking transport backed by a `ureq` agent.
///
/// The agent keeps its own connection pool. Non-2xx statuses come back as
/// data rather than `Err`, leaving status interpretation to the decoder.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url();
        debug!(method = %request.method, %url, "sending request");

        let body = request.body_bytes();
        let result = match (request.method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url.as_str()), request).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url.as_str()), request).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url.as_str()), request).send(&body[..]),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url.as_str()), request).send_empty(),
            (HttpMethod::Patch, Some(body)) => with_headers(self.agent.patch(url.as_str()), request).send(&body[..]),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url.as_str()), request).send_empty(),
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        // No size cap, same as the reqwest side.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(transport_error)?;
        trace!(status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, headers, body })
    }
}

fn transport_error(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => TransportErrorKind::Connect,
        ureq::Error::Io(io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportErrorKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => TransportErrorKind::Connect,
            _ => TransportErrorKind::Io,
        },
        _ => TransportErrorKind::Io,
    };
    TransportError::new(kind, err.to_string())
}
