#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use expert_gate::{
    AppState,
    app::build_router,
    config::AdminPrefix,
    repos::user_repo::InMemoryUserStore,
    services::{
        audit::{AdminAudit, MemoryAuditSink},
        auth::TokenCodec,
    },
};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &[u8] = b"integration-test-secret-integration-test";

pub struct TestApp {
    pub router: Router,
    pub codec: Arc<TokenCodec>,
    pub audit: Arc<MemoryAuditSink>,
}

pub fn test_app() -> TestApp {
    test_app_with_prefix(AdminPrefix::default())
}

pub fn test_app_with_prefix(admin_prefix: AdminPrefix) -> TestApp {
    let codec = Arc::new(TokenCodec::new(SECRET, 3600));
    let audit = Arc::new(MemoryAuditSink::new());
    let router = build_router(state_with(codec.clone(), audit.clone(), admin_prefix))
        .expect("router builds");

    TestApp {
        router,
        codec,
        audit,
    }
}

pub fn state_with(
    codec: Arc<TokenCodec>,
    audit: Arc<MemoryAuditSink>,
    admin_prefix: AdminPrefix,
) -> AppState {
    AppState::new(
        codec,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(AdminAudit::new(audit)),
        admin_prefix,
    )
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &TestApp, req: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
