//! Server test utilities.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use ledgerweb_core::config::AppConfig;
use ledgerweb_server::{AppState, create_router};
use serde_json::Value;
use tower::ServiceExt;

/// A response with its body fully read.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    /// Body parsed as JSON, or `Null` when empty or not JSON.
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.body).unwrap_or(Value::Null)
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A test server wrapping the router and its state.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
}

#[allow(dead_code)]
impl TestServer {
    /// A server with a single in-memory `cordform` node.
    pub fn new() -> Self {
        Self::with_config(AppConfig::for_testing())
    }

    /// A server built from an arbitrary configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::from_config(config).expect("Failed to build node services");
        let router = create_router(state.clone());
        Self { router, state }
    }

    /// A single-node server with a modified configuration.
    pub fn with_modified_config(modifier: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::for_testing();
        modifier(&mut config);
        Self::with_config(config)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Send a JSON request and parse the JSON response.
    pub async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let response = self.send(builder.body(body).unwrap()).await;
        (response.status, response.json())
    }

    /// POST a multipart upload built by [`super::multipart_body`].
    pub async fn upload(
        &self,
        uri: &str,
        files: &[(&str, &[u8])],
        uploader: Option<&str>,
    ) -> TestResponse {
        let (content_type, body) = super::multipart_body(files, uploader);
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}
