use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, JSON_BODY, XML_BODY};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn content_type(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- anything ---

#[tokio::test]
async fn anything_echoes_get() {
    let resp = app()
        .oneshot(empty("GET", "/anything?key=value"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/anything");
    assert_eq!(echo.query.as_deref(), Some("key=value"));
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn anything_echoes_body_and_headers() {
    let req = Request::builder()
        .method("POST")
        .uri("/anything/nested/path")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("X-Custom", "Value")
        .body(r#"{"name":"test"}"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/anything/nested/path");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.headers.get("x-custom").map(String::as_str), Some("Value"));
    assert_eq!(echo.body, r#"{"name":"test"}"#);
}

#[tokio::test]
async fn anything_accepts_every_verb() {
    for method in ["PUT", "PATCH", "DELETE"] {
        let resp = app().oneshot(empty(method, "/anything")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
        let echo: Echo = body_json(resp).await;
        assert_eq!(echo.method, method);
    }
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    for code in [200u16, 201, 204, 401, 403, 404, 418, 500, 503] {
        let resp = app()
            .oneshot(empty("GET", &format!("/status/{code}")))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), code);
    }
}

#[tokio::test]
async fn status_body_names_the_code() {
    let resp = app().oneshot(empty("DELETE", "/status/404")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&resp), "text/plain");
    assert_eq!(body_bytes(resp).await.as_ref(), b"status 404");
}

#[tokio::test]
async fn status_out_of_range_returns_400() {
    let resp = app().oneshot(empty("GET", "/status/999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_not_a_number_returns_400() {
    let resp = app().oneshot(empty("GET", "/status/teapot")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- fixtures ---

#[tokio::test]
async fn json_fixture() {
    let resp = app().oneshot(empty("GET", "/json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");
    assert_eq!(body_bytes(resp).await.as_ref(), JSON_BODY.as_bytes());
}

#[tokio::test]
async fn xml_fixture() {
    let resp = app().oneshot(empty("GET", "/xml")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("application/xml"));
    assert_eq!(body_bytes(resp).await.as_ref(), XML_BODY.as_bytes());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(empty("GET", "/nowhere")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- bytes / cookies ---

#[tokio::test]
async fn bytes_serves_requested_length_and_status() {
    let resp = app().oneshot(empty("GET", "/bytes/5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "text/plain");
    assert_eq!(body_bytes(resp).await.as_ref(), b"aaaaa");

    let resp = app()
        .oneshot(empty("GET", "/bytes/3?status=404"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await.len(), 3);
}

#[tokio::test]
async fn cookies_sends_repeated_set_cookie() {
    let resp = app().oneshot(empty("GET", "/cookies")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookies: Vec<&str> = resp
        .headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
}
