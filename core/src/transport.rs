//! The network boundary: something that turns an `HttpRequest` into an
//! `HttpResponse`.
//!
//! # Design
//! The client never performs I/O itself. It hands a fully built request to a
//! `Transport` and classifies whatever comes back, so status codes of 400 and
//! above must come back as responses, not errors. Only failures that produce
//! no response at all (refused connections, DNS, TLS, timeouts) are reported
//! as `TransportError`.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::http::{HeaderMap, HttpMethod, HttpRequest, HttpResponse};

/// Synchronous request/response capability.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent pools connections, so one `UreqTransport` should be reused for
/// the life of a client.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn agent(&self) -> &ureq::Agent {
        &self.agent
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &HeaderMap) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.encode();

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, None) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Delete, Some(bytes)) => {
                with_headers(self.agent.delete(url), headers)
                    .force_send_body()
                    .send(bytes)
            }
            (HttpMethod::Post, Some(bytes)) => with_headers(self.agent.post(url), headers).send(bytes),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(bytes)) => with_headers(self.agent.put(url), headers).send(bytes),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            (HttpMethod::Patch, Some(bytes)) => with_headers(self.agent.patch(url), headers).send(bytes),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| {
            debug!(error = %e, url, "transport failure");
            TransportError::new(e)
        })?;

        let status = response.status().as_u16();
        // Repeated fields such as Set-Cookie keep every value.
        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        // ureq caps `read_to_vec` at 10 MiB by default; the whole body is wanted.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(TransportError::new)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
