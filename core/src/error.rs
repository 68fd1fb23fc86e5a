//! Error types for the HTTP client facade.
//!
//! # Design
//! The four status-derived errors share one payload, `StatusError`, and are
//! told apart by its `kind`. Callers can match `ApiError::Status(_)` to catch
//! every HTTP failure, or look at `kind` (or the `is_*` helpers) to handle
//! a single one. Decoding and transport failures get their own variants and
//! never carry a status code.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::status::StatusKind;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors returned by `Client` verb methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status of 400 or above.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A successful response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The target URL was empty, malformed, or relative without a base URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A header name or value cannot be sent on the wire.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn status_kind(&self) -> Option<StatusKind> {
        match self {
            ApiError::Status(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Response body snapshot, for status errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status(e) => Some(&e.body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_kind() == Some(StatusKind::Unauthorized)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status_kind() == Some(StatusKind::Forbidden)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_kind() == Some(StatusKind::NotFound)
    }
}

/// A non-success HTTP status together with the body the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} (HTTP {status}): {body}", kind_label(.kind))]
pub struct StatusError {
    pub kind: StatusKind,
    pub status: u16,
    pub body: String,
}

impl StatusError {
    pub fn new(kind: StatusKind, status: u16, body: &[u8]) -> Self {
        Self {
            kind,
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

fn kind_label(kind: &StatusKind) -> &'static str {
    match kind {
        StatusKind::Unauthorized => "unauthorized",
        StatusKind::Forbidden => "forbidden",
        StatusKind::NotFound => "not found",
        StatusKind::Api => "api error",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("failed to decode response content as json: {0}")]
    Json(String),

    #[error("failed to decode response content as xml: {0}")]
    Xml(String),
}

/// Failure below the HTTP layer: connection refused, DNS, TLS, timeout.
#[derive(Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportError")
            .field("message", &self.message)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_share_payload() {
        let err: ApiError = StatusError::new(StatusKind::NotFound, 404, b"missing").into();
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body(), Some("missing"));
        assert!(matches!(err, ApiError::Status(StatusError { status: 404, .. })));
    }

    #[test]
    fn status_error_display() {
        let err = StatusError::new(StatusKind::Forbidden, 403, b"Access denied");
        assert_eq!(err.to_string(), "forbidden (HTTP 403): Access denied");

        let err = StatusError::new(StatusKind::Api, 500, b"boom");
        assert_eq!(err.to_string(), "api error (HTTP 500): boom");
    }

    #[test]
    fn status_body_is_lossy_utf8() {
        let err = StatusError::new(StatusKind::Api, 502, &[0x66, 0xff, 0x6f]);
        assert_eq!(err.body, "f\u{fffd}o");
    }

    #[test]
    fn non_status_errors_have_no_status() {
        let err: ApiError = DecodeError::Json("eof".into()).into();
        assert_eq!(err.status(), None);
        assert_eq!(err.status_kind(), None);
        assert!(err.body().is_none());
        assert!(err.to_string().contains("json"));
    }

    #[test]
    fn invalid_header_names_the_header() {
        let err = ApiError::InvalidHeader {
            name: "X-Bad".into(),
            reason: "invalid HTTP header value".into(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "invalid header \"X-Bad\": invalid HTTP header value");
    }

    #[test]
    fn transport_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::new(io);
        assert_eq!(err.message(), "refused");
        assert!(StdError::source(&err).is_some());

        let err = TransportError::msg("timed out");
        assert!(StdError::source(&err).is_none());
        assert_eq!(err.to_string(), "transport error: timed out");
    }
}
