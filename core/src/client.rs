//! Verb-oriented HTTP client over an injected transport.
//!
//! # Design
//! Every verb method runs the same fixed pipeline:
//!
//! 1. build an `HttpRequest` (resolved URL, per-call headers, encoded body),
//! 2. apply the configured `HeaderSet` with `headers::inject`,
//! 3. send it through the `Transport`,
//! 4. keep the response head as the client's last response,
//! 5. classify the status and either decode the body or return a
//!    `StatusError` carrying it.
//!
//! The pipeline is wired here once; there is no runtime handler list.
//! `Client` holds mutable state (configured headers and the last response),
//! which is why the verb methods take `&mut self`. Share a client between
//! threads behind a `Mutex`.

use serde::Serialize;
use tracing::{debug, warn};

use crate::body::{Body, Multipart, Part};
use crate::config::{resolve_url, ClientConfig};
use crate::decode::{decode, Content};
use crate::error::{ApiError, Result, StatusError};
use crate::headers::{inject, HeaderSet};
use crate::http::{HeaderMap, HttpMethod, HttpRequest, HttpResponse, ResponseHead};
use crate::status::{classify, Classification};
use crate::transport::{Transport, UreqTransport};

/// HTTP client with verb methods, fixed headers, and typed status errors.
#[derive(Debug)]
pub struct Client<T = UreqTransport> {
    transport: T,
    base_url: Option<String>,
    headers: HeaderSet,
    last_response: Option<ResponseHead>,
}

impl Client<UreqTransport> {
    /// Client backed by a `ureq` agent configured from `config`.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl Default for Client<UreqTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            base_url: config.base_url,
            headers: config.headers.into_iter().collect(),
            last_response: None,
        }
    }

    /// Add headers sent with every subsequent request.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers);
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Status and headers of the most recent response, including failed ones.
    pub fn last_response(&self) -> Option<&ResponseHead> {
        self.last_response.as_ref()
    }

    /// GET with `query` pairs appended to the URL.
    pub fn get(&mut self, url: &str, query: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Content> {
        self.execute(HttpMethod::Get, url, query, Body::None, headers)
    }

    /// POST `form` as `application/x-www-form-urlencoded`.
    pub fn post(&mut self, url: &str, form: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Content> {
        self.execute(HttpMethod::Post, url, &[], Body::form(form), headers)
    }

    pub fn post_json<B>(&mut self, url: &str, body: &B, headers: &[(&str, &str)]) -> Result<Content>
    where
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(HttpMethod::Post, url, &[], body, headers)
    }

    pub fn post_multipart(&mut self, url: &str, parts: Vec<Part>, headers: &[(&str, &str)]) -> Result<Content> {
        let body = Body::Multipart(Multipart::new(parts));
        self.execute(HttpMethod::Post, url, &[], body, headers)
    }

    /// PUT `form` as `application/x-www-form-urlencoded`.
    pub fn put(&mut self, url: &str, form: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Content> {
        self.execute(HttpMethod::Put, url, &[], Body::form(form), headers)
    }

    pub fn put_json<B>(&mut self, url: &str, body: &B, headers: &[(&str, &str)]) -> Result<Content>
    where
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(HttpMethod::Put, url, &[], body, headers)
    }

    pub fn put_multipart(&mut self, url: &str, parts: Vec<Part>, headers: &[(&str, &str)]) -> Result<Content> {
        let body = Body::Multipart(Multipart::new(parts));
        self.execute(HttpMethod::Put, url, &[], body, headers)
    }

    pub fn delete(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<Content> {
        self.execute(HttpMethod::Delete, url, &[], Body::None, headers)
    }

    pub fn delete_json<B>(&mut self, url: &str, body: &B, headers: &[(&str, &str)]) -> Result<Content>
    where
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(HttpMethod::Delete, url, &[], body, headers)
    }

    pub fn patch(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<Content> {
        self.execute(HttpMethod::Patch, url, &[], Body::None, headers)
    }

    pub fn patch_json<B>(&mut self, url: &str, body: &B, headers: &[(&str, &str)]) -> Result<Content>
    where
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(HttpMethod::Patch, url, &[], body, headers)
    }

    /// Build the request a verb method would send, configured headers included.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        query: &[(&str, &str)],
        body: Body,
        headers: &[(&str, &str)],
    ) -> Result<HttpRequest> {
        let mut url = resolve_url(self.base_url.as_deref(), url)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut request_headers: HeaderMap = headers.iter().copied().collect();
        if let Some(content_type) = body.content_type() {
            if !request_headers.contains("content-type") {
                request_headers.insert("Content-Type", content_type);
            }
        }

        let request = HttpRequest {
            method,
            url: url.into(),
            headers: request_headers,
            body,
        };
        let request = inject(request, &self.headers);
        validate_headers(&request.headers)?;
        Ok(request)
    }

    fn execute(
        &mut self,
        method: HttpMethod,
        url: &str,
        query: &[(&str, &str)],
        body: Body,
        headers: &[(&str, &str)],
    ) -> Result<Content> {
        let request = self.build_request(method, url, query, body, headers)?;
        debug!(method = method.as_str(), url = %request.url, "sending request");

        let response = self.transport.send(&request)?;
        let (head, body) = response.into_parts();
        debug!(status = head.status, content_type = head.content_type(), "received response");

        let outcome = process(&head, body);
        self.last_response = Some(head);
        outcome
    }
}

/// Reject header names and values the wire format cannot carry, such as
/// values containing CR or LF.
fn validate_headers(headers: &HeaderMap) -> Result<()> {
    for (name, value) in headers.iter() {
        let invalid = |reason: String| ApiError::InvalidHeader {
            name: name.to_string(),
            reason,
        };
        ureq::http::HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        ureq::http::HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}

/// Classify a response and decode its body on success.
pub fn handle_response(response: HttpResponse) -> Result<Content> {
    let (head, body) = response.into_parts();
    process(&head, body)
}

fn process(head: &ResponseHead, body: Vec<u8>) -> Result<Content> {
    match classify(head.status) {
        Classification::Success => Ok(decode(body, head.content_type())?),
        Classification::Failure(kind) => {
            warn!(status = head.status, ?kind, "request failed");
            Err(StatusError::new(kind, head.status, &body).into())
        }
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<Body> {
    serde_json::to_value(body)
        .map(Body::Json)
        .map_err(|e| ApiError::Serialization(e.to_string()))
}
