/// Common test utilities for integration tests
///
/// Builds the full router over an in-memory store and a capturing mailer, and
/// provides helpers for requests, token minting, and walking the
/// register/verify/login flow.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use solestore_api::app::{build_router, AppState};
use solestore_api::config::{ApiConfig, Config, MailConfig, TokenSettings};
use solestore_shared::auth::token::TokenCodec;
use solestore_shared::mailer::MemoryMailer;
use solestore_shared::models::account::Role;
use solestore_shared::store::memory::MemoryStore;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing the app and its injected collaborators
pub struct TestContext {
    pub app: axum::Router,
    pub store: MemoryStore,
    pub mailer: MemoryMailer,
    pub codec: TokenCodec,
}

impl TestContext {
    /// Creates a fresh app over an empty store
    pub fn new() -> Self {
        let config = test_config();
        let store = MemoryStore::new();
        let mailer = MemoryMailer::new();
        let codec = TokenCodec::new(config.token_config());

        let state =
            AppState::with_collaborators(config, store.clone(), Arc::new(mailer.clone()));
        let app = build_router(state);

        TestContext {
            app,
            store,
            mailer,
            codec,
        }
    }

    /// Sends a request and returns the response
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Mints an admin session token without going through registration
    pub fn admin_token(&self) -> String {
        self.codec
            .issue_session_token(Uuid::new_v4(), "admin", Role::Admin, "admin@x.com")
            .unwrap()
    }

    /// Walks register -> verify-email -> login and returns the session token
    pub async fn register_verify_login(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .send(post_json(
                "/api/v1/register",
                None,
                serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": password,
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let token = self
            .last_email_token(email, "verify-email?token=")
            .await
            .expect("verification email not sent");
        let response = self
            .send(get(&format!("/api/v1/verify-email?token={token}"), None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = self
            .send(post_json(
                "/api/v1/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        body["token"].as_str().unwrap().to_string()
    }

    /// Extracts the token embedded after `marker` in the most recent email to
    /// `recipient`
    pub async fn last_email_token(&self, recipient: &str, marker: &str) -> Option<String> {
        let sent = self.mailer.sent().await;
        let email = sent.iter().rev().find(|e| e.to == recipient)?;
        let start = email.html.find(marker)? + marker.len();
        let rest = &email.html[start..];
        let end = rest.find('"').unwrap_or(rest.len());
        Some(rest[..end].to_string())
    }
}

/// Builds a GET request, optionally with a bearer token
pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Builds a JSON request with the given method
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Builds a JSON POST request
pub fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    json_request("POST", uri, token, body)
}

/// Builds a DELETE request
pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Builds an unsigned external-style token around a JSON payload
pub fn external_token(payload: serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{header}.{body}.sig")
}

fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        tokens: TokenSettings {
            session_secret: "session-secret-for-tests-32-bytes!!".to_string(),
            purpose_secret: "purpose-secret-for-tests-32-bytes!!".to_string(),
            session_ttl_hours: 24,
            verification_ttl_hours: 24,
            reset_ttl_minutes: 60,
        },
        mail: MailConfig {
            sender_name: "Solestore".to_string(),
            sender_email: "noreply@solestore.example".to_string(),
            base_url: "http://localhost:5000".to_string(),
        },
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}
