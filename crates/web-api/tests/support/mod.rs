#![allow(dead_code)]

use std::sync::Arc;

use application::{
    health::MockHealthCheck, testing::TestApp, HealthCheck, ServiceSettings, TokenService,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use web_api::{router, AppState, HttpSettings};

pub struct TestServer {
    pub app: TestApp,
    pub router: Router,
}

impl TestServer {
    /// 令牌为 `token-for:<name>` 的测试服务
    pub fn new() -> Self {
        Self::from_app(TestApp::new())
    }

    pub fn with(settings: ServiceSettings, token_service: Arc<dyn TokenService>) -> Self {
        Self::from_app(TestApp::with(settings, token_service))
    }

    /// 自定义就绪检查，其余同 [`TestServer::new`]
    pub fn with_health(health: Arc<dyn HealthCheck>) -> Self {
        Self::build(TestApp::new(), health)
    }

    fn from_app(app: TestApp) -> Self {
        let mut health = MockHealthCheck::new();
        health.expect_readiness().returning(|| Ok(()));
        Self::build(app, Arc::new(health))
    }

    fn build(app: TestApp, health: Arc<dyn HealthCheck>) -> Self {
        let state = AppState::new(app.services.clone(), HttpSettings::default(), health);
        Self {
            router: router(state),
            app,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.send(request(method, uri, token, body)).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

pub fn fake_token(name: &str) -> String {
    format!("token-for:{name}")
}
