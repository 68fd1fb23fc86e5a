//! Verb-oriented convenience layer over a blocking HTTP transport.
//!
//! # Overview
//! `Client` exposes `get`/`post`/`put`/`delete`/`patch` plus JSON and
//! multipart variants. Each call injects the client's configured headers,
//! sends the request through a `Transport`, turns a status of 400 or above
//! into a typed `ApiError`, and otherwise decodes the body by content type
//! (JSON, XML folded into JSON-shaped values, or raw bytes).
//!
//! # Design
//! - The network is behind the `Transport` trait. `UreqTransport` is the
//!   default; tests substitute stubs that replay canned responses.
//! - `HttpRequest`/`HttpResponse` are plain data, so every pipeline stage
//!   (`headers::inject`, `status::classify`, `decode::decode`) is a pure
//!   function that can be tested alone.
//! - No retries or connection management live here; all
//!   of that belongs to the transport.

pub mod body;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod headers;
pub mod http;
pub mod status;
pub mod transport;

pub use body::{Body, Multipart, Part, PartContents};
pub use client::{handle_response, Client};
pub use config::{ClientConfig, ConfigError};
pub use decode::{decode, Content, Format};
pub use error::{ApiError, DecodeError, Result, StatusError, TransportError};
pub use headers::{inject, HeaderSet};
pub use http::{HeaderMap, HttpMethod, HttpRequest, HttpResponse, ResponseHead};
pub use status::{classify, is_successful, Classification, StatusKind};
pub use transport::{Transport, UreqTransport};
