use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;

pub const JSON_BODY: &str = r#"{"status":"success","items":[1,2,3]}"#;
pub const XML_BODY: &str = "<root><message>success</message><code>200</code></root>";
pub const TEXT_BODY: &str = "Success";
pub const MALFORMED_JSON_BODY: &str = "{invalid json}";

/// What `/anything` saw of the request it was sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/anything", any(echo))
        .route("/anything/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .route("/json", get(|| fixed("application/json", JSON_BODY)))
        .route("/javascript", get(|| fixed("application/javascript", JSON_BODY)))
        .route("/xml", get(|| fixed("application/xml; charset=utf-8", XML_BODY)))
        .route("/text", get(|| fixed("text/plain", TEXT_BODY)))
        .route("/malformed", get(|| fixed("application/json", MALFORMED_JSON_BODY)))
        .route("/bytes/{n}", get(bytes))
        .route("/cookies", get(cookies))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    debug!(%method, %uri, "echo");
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers.get("content-type").cloned(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = match StatusCode::from_u16(code) {
        Ok(status) if (200..600).contains(&code) => status,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        format!("status {}", status.as_u16()),
    )
}

#[derive(Debug, Deserialize)]
struct BytesParams {
    status: Option<u16>,
}

/// `n` bytes of `a`, as text, with an optional `?status=` override.
async fn bytes(Path(n): Path<usize>, Query(params): Query<BytesParams>) -> impl IntoResponse {
    let status = params
        .status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);
    (status, [(header::CONTENT_TYPE, "text/plain")], vec![b'a'; n])
}

/// Two `Set-Cookie` fields on one response.
async fn cookies() -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, "a=1"), (header::SET_COOKIE, "b=2")]),
        TEXT_BODY,
    )
}

async fn fixed(content_type: &'static str, body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, content_type)], body)
}
