//! Request payloads and their wire encodings.
//!
//! # Design
//! A request carries exactly one `Body` variant, so a single encoding mode
//! is active per request by construction. JSON payloads are held as
//! `serde_json::Value`: serialization of caller types happens when the
//! request is built, which leaves `encode` infallible for the transport.

use serde_json::Value;
use uuid::Uuid;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Request payload tagged with its encoding mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    None,
    /// Key/value pairs sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Structured value sent as `application/json`.
    Json(Value),
    /// Named parts sent as `multipart/form-data`.
    Multipart(Multipart),
}

impl Body {
    /// Build a form body from borrowed pairs.
    pub fn form(pairs: &[(&str, &str)]) -> Self {
        Body::Form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Body::None)
    }

    /// The `Content-Type` this body implies, if any.
    pub fn content_type(&self) -> Option<String> {
        match self {
            Body::None => None,
            Body::Form(_) => Some(FORM_CONTENT_TYPE.to_string()),
            Body::Json(_) => Some(JSON_CONTENT_TYPE.to_string()),
            Body::Multipart(multipart) => Some(multipart.content_type()),
        }
    }

    /// Encode the payload to bytes. `None` means the request has no body.
    pub fn encode(&self) -> Option<Vec<u8>> {
        match self {
            Body::None => None,
            Body::Form(pairs) => Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish()
                    .into_bytes(),
            ),
            Body::Json(value) => Some(value.to_string().into_bytes()),
            Body::Multipart(multipart) => Some(multipart.encode()),
        }
    }
}

/// Ordered `multipart/form-data` parts with a fixed boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Multipart {
    /// Wrap `parts` under a freshly generated boundary.
    pub fn new(parts: Vec<Part>) -> Self {
        let boundary = format!("booze-{}", Uuid::new_v4().simple());
        Self::with_boundary(boundary, parts)
    }

    pub fn with_boundary(boundary: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            boundary: boundary.into(),
            parts,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Render the parts per RFC 7578 with CRLF line endings.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let name = escape_param(&part.name);
            match &part.contents {
                PartContents::Text(value) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                PartContents::File {
                    filename,
                    content_type,
                    data,
                } => {
                    let filename = escape_param(filename);
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(data);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

/// A single named multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub contents: PartContents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContents {
    Text(String),
    File {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: PartContents::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            contents: PartContents::File {
                filename: filename.into(),
                content_type: content_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Percent-escape the characters that would break a quoted header parameter.
fn escape_param(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
