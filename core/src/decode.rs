//! Response body decoding keyed on the declared content type.
//!
//! # Design
//! Matching is a case-insensitive substring test, not a MIME comparison:
//! anything mentioning `json` or `javascript` is parsed as JSON, anything
//! mentioning `xml` is parsed as XML, everything else is returned raw.
//! `decode` takes the body by value, so a body is decoded at most once.
//!
//! XML is folded into the same `serde_json::Value` tree JSON produces. The
//! root element's name is dropped and its children become keys; leaf text
//! becomes a string; repeated sibling names collapse into an array;
//! attributes live under `"@attributes"`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::DecodeError;

const ATTRIBUTES_KEY: &str = "@attributes";
const TEXT_KEY: &str = "#text";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Parsed JSON, or XML folded into the same shape.
    Structured(Value),
    /// The body as received, for any other content type.
    Raw(Vec<u8>),
}

impl Content {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Content::Structured(value) => Some(value),
            Content::Raw(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Content::Structured(value) => Some(value),
            Content::Raw(_) => None,
        }
    }

    /// UTF-8 view of a raw body. `None` for structured content or invalid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Raw(bytes) => std::str::from_utf8(bytes).ok(),
            Content::Structured(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Raw(bytes) => Some(bytes),
            Content::Structured(_) => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Content::Structured(_))
    }
}

/// Which decoder a content type selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    Raw,
}

impl Format {
    pub fn from_content_type(content_type: &str) -> Self {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("json") || lowered.contains("javascript") {
            Format::Json
        } else if lowered.contains("xml") {
            Format::Xml
        } else {
            Format::Raw
        }
    }
}

/// Decode `body` according to `content_type`.
pub fn decode(body: Vec<u8>, content_type: &str) -> Result<Content, DecodeError> {
    let format = Format::from_content_type(content_type);
    trace!(?format, content_type, len = body.len(), "decoding response body");
    match format {
        Format::Json => serde_json::from_slice(&body)
            .map(Content::Structured)
            .map_err(|e| DecodeError::Json(e.to_string())),
        Format::Xml => xml_to_value(&body).map(Content::Structured),
        Format::Raw => Ok(Content::Raw(body)),
    }
}

/// An element whose end tag has not been seen yet.
struct Frame {
    attributes: Map<String, Value>,
    children: Vec<(String, Value)>,
    text: String,
    name: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?;
            attributes.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            attributes,
            children: Vec::new(),
            text: String::new(),
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        })
    }

    fn close(self) -> (String, Value) {
        let text = if self.text.trim().is_empty() {
            None
        } else {
            Some(self.text)
        };

        if self.children.is_empty() && self.attributes.is_empty() {
            let value = match text {
                Some(text) => Value::String(text),
                None => Value::Object(Map::new()),
            };
            return (self.name, value);
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            map.insert(ATTRIBUTES_KEY.to_string(), Value::Object(self.attributes));
        }
        if self.children.is_empty() {
            if let Some(text) = text {
                map.insert(TEXT_KEY.to_string(), Value::String(text));
            }
        }
        for (name, value) in self.children {
            match map.get_mut(&name) {
                // Element values are never arrays themselves, so an array
                // here is one we built for an earlier sibling.
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        }
        (self.name, Value::Object(map))
    }
}

fn xml_err(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Xml(e.to_string())
}

fn xml_to_value(body: &[u8]) -> Result<Value, DecodeError> {
    let mut reader = Reader::from_reader(body);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(xml_err("content after root element"));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(xml_err("content after root element"));
                }
                let frame = Frame::open(&start)?;
                attach(&mut stack, &mut root, frame.close());
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| xml_err("closing tag without matching open tag"))?;
                attach(&mut stack, &mut root, frame.close());
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_err)?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(xml_err("text outside root element")),
                }
            }
            Event::CData(data) => {
                let data = data.into_inner();
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&String::from_utf8_lossy(&data)),
                    None => return Err(xml_err("cdata outside root element")),
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_err(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| xml_err("document has no root element"))
}

fn attach(stack: &mut [Frame], root: &mut Option<Value>, (name, value): (String, Value)) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None => *root = Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn structured(body: &str, content_type: &str) -> Value {
        decode(body.as_bytes().to_vec(), content_type)
            .unwrap()
            .into_value()
            .unwrap()
    }

    #[test]
    fn json_content_type() {
        assert_eq!(
            structured(r#"{"status":"success"}"#, "application/json"),
            json!({"status": "success"})
        );
    }

    #[test]
    fn javascript_content_type() {
        assert_eq!(
            structured(r#"{"status":"success"}"#, "application/javascript"),
            json!({"status": "success"})
        );
    }

    #[test]
    fn content_type_match_is_substring_and_case_insensitive() {
        assert_eq!(
            Format::from_content_type("application/vnd.api+json; charset=utf-8"),
            Format::Json
        );
        assert_eq!(Format::from_content_type("Application/JSON"), Format::Json);
        assert_eq!(Format::from_content_type("text/JavaScript"), Format::Json);
        assert_eq!(Format::from_content_type("application/atom+xml"), Format::Xml);
        assert_eq!(Format::from_content_type("TEXT/XML"), Format::Xml);
        assert_eq!(Format::from_content_type("text/plain"), Format::Raw);
        assert_eq!(Format::from_content_type(""), Format::Raw);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = decode(b"{invalid json}".to_vec(), "application/json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn empty_json_body_is_an_error() {
        let err = decode(Vec::new(), "application/json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn plain_text_is_returned_unchanged() {
        let content = decode(b"Success".to_vec(), "text/plain").unwrap();
        assert_eq!(content.as_text(), Some("Success"));
        assert!(!content.is_structured());
    }

    #[test]
    fn raw_bytes_survive() {
        let bytes = vec![0x89, 0x50, 0x4e, 0x47];
        let content = decode(bytes.clone(), "image/png").unwrap();
        assert_eq!(content.as_bytes(), Some(bytes.as_slice()));
        assert_eq!(content.as_text(), None);
    }

    #[test]
    fn xml_leaves_become_strings() {
        let value = structured(
            "<root><message>success</message><code>200</code></root>",
            "application/xml",
        );
        assert_eq!(value, json!({"message": "success", "code": "200"}));
    }

    #[test]
    fn xml_nested_and_repeated() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
            <response>
              <!-- items -->
              <item><id>1</id></item>
              <item><id>2</id></item>
              <item><id>3</id></item>
              <meta><total>3</total></meta>
            </response>"#;
        assert_eq!(
            structured(body, "text/xml; charset=utf-8"),
            json!({
                "item": [{"id": "1"}, {"id": "2"}, {"id": "3"}],
                "meta": {"total": "3"}
            })
        );
    }

    #[test]
    fn xml_attributes_and_empty_elements() {
        let body = r#"<root version="2"><empty/><blank></blank><tag kind="a">x</tag></root>"#;
        assert_eq!(
            structured(body, "application/xml"),
            json!({
                "@attributes": {"version": "2"},
                "empty": {},
                "blank": {},
                "tag": {"@attributes": {"kind": "a"}, "#text": "x"}
            })
        );
    }

    #[test]
    fn xml_entities_and_cdata() {
        let body = "<root><a>fish &amp; chips</a><b><![CDATA[<raw>]]></b></root>";
        assert_eq!(
            structured(body, "application/xml"),
            json!({"a": "fish & chips", "b": "<raw>"})
        );
    }

    #[test]
    fn xml_text_only_root_is_a_string() {
        assert_eq!(structured("<greeting>hi</greeting>", "application/xml"), json!("hi"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        for body in [
            "<root><a>1</b></root>",
            "<root><a>1</a>",
            "not xml at all",
            "",
            "<a/><b/>",
        ] {
            let err = decode(body.as_bytes().to_vec(), "application/xml").unwrap_err();
            assert!(matches!(err, DecodeError::Xml(_)), "{body:?} should fail");
        }
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn json_round_trip(value in arb_json()) {
            let body = serde_json::to_vec(&value).unwrap();
            let decoded = decode(body, "application/json").unwrap();
            prop_assert_eq!(decoded, Content::Structured(value));
        }
    }
}
