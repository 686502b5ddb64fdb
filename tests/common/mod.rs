#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use product_review_api::api::format::RegisterRequest;
use product_review_api::auth::TokenCodec;
use product_review_api::config::AppConfig;
use product_review_api::database::models::NewProduct;
use product_review_api::database::{CatalogRepository, MemoryStore};
use product_review_api::server::app;
use product_review_api::state::AppState;
use product_review_api::testing::FixedClock;
use product_review_api::types::Role;

/// The real router over an in-memory store and a clock that only moves on request.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::testing())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let state = AppState::new(config, store.clone(), store.clone(), clock.clone())
            .expect("test configuration is valid");

        Self {
            router: app(state.clone()),
            state,
            store,
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body is readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, body }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request is well-formed");

        self.send(request).await
    }

    /// Request with a raw Authorization header value.
    pub async fn request_with_authorization(&self, method: Method, uri: &str, authorization: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, authorization)
            .body(Body::empty())
            .expect("request is well-formed");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Register a USER through the API and return its token.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        token_of(&response)
    }

    /// Create an ADMIN directly in the store and log in through the API.
    pub async fn admin_token(&self) -> String {
        self.state
            .auth
            .create_user(
                RegisterRequest {
                    username: "root".into(),
                    email: "root@example.com".into(),
                    password: "rootpass".into(),
                },
                Role::Admin,
            )
            .await
            .expect("admin is created");

        let response = self
            .post("/api/auth/login", None, json!({"username": "root", "password": "rootpass"}))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        token_of(&response)
    }

    pub async fn create_product(&self, name: &str) -> i64 {
        self.store
            .insert_product(NewProduct {
                name: name.into(),
                description: Some(format!("{} description", name)),
                category: "General".into(),
                price: Decimal::new(1000, 2),
            })
            .await
            .expect("product is created")
            .id
    }

    /// A token signed with this app's own secret, for any claims.
    pub fn token_for(&self, user_id: i64, username: &str, role: Role) -> String {
        let security = &self.state.config.security;
        TokenCodec::new(
            security.jwt_secret.as_bytes(),
            security.jwt_issuer.clone(),
            Duration::minutes(security.jwt_expiry_minutes as i64),
        )
        .issue(user_id, username, role, self.clock.utc())
        .expect("token is issued")
    }
}

pub fn token_of(response: &TestResponse) -> String {
    response.body["token"].as_str().expect("response carries a token").to_string()
}

/// The structured error body every failure must carry.
pub fn assert_error_body(response: &TestResponse, status: StatusCode, path: &str) {
    assert_eq!(response.status, status, "{}", response.body);
    assert_eq!(response.body["status"], status.as_u16());
    assert_eq!(response.body["error"], status.canonical_reason().unwrap_or_default().to_uppercase().replace(' ', "_"));
    assert_eq!(response.body["path"], path);
    assert!(response.body["message"].is_string());
    assert!(response.body["details"].is_array());
    assert!(response.body["timestamp"].is_string());
}
