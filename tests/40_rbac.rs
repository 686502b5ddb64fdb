mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::Duration;
use mockable::Clock;
use serde_json::json;

use common::{assert_error_body, TestApp};
use product_review_api::auth::TokenCodec;
use product_review_api::config::AppConfig;
use product_review_api::database::UserRepository;
use product_review_api::types::Role;

fn new_admin_body() -> serde_json::Value {
    json!({"username": "second", "email": "second@example.com", "password": "secret1"})
}

#[tokio::test]
async fn role_matrix() -> Result<()> {
    let app = TestApp::new();
    let user = app.register("alice").await;
    let admin = app.admin_token().await;

    // Anonymous
    assert_eq!(app.get("/api/products", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/api/auth/me", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/admin/users", None).await.status, StatusCode::UNAUTHORIZED);

    // USER
    assert_eq!(app.get("/api/products", Some(&user)).await.status, StatusCode::OK);
    assert_eq!(app.get("/api/auth/me", Some(&user)).await.status, StatusCode::OK);
    let res = app.get("/api/admin/users", Some(&user)).await;
    assert_error_body(&res, StatusCode::FORBIDDEN, "/api/admin/users");
    assert_eq!(res.body["message"], "Access denied");
    let res = app.post("/api/admin/users", Some(&user), new_admin_body()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // ADMIN
    assert_eq!(app.get("/api/auth/me", Some(&admin)).await.status, StatusCode::OK);
    let res = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn admin_registers_another_admin() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let res = app.post("/api/admin/users", Some(&admin), new_admin_body()).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["role"], "ADMIN");
    assert!(res.body.get("passwordHash").is_none());

    let login = app
        .post("/api/auth/login", None, json!({"username": "second", "password": "secret1"}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["role"], "ADMIN");
    Ok(())
}

#[tokio::test]
async fn forbidden_requests_never_reach_validation() -> Result<()> {
    let app = TestApp::new();
    let user = app.register("alice").await;

    // Body is invalid, but the role check answers first
    let res = app.post("/api/admin/products", Some(&user), json!({"name": ""})).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_treated_as_anonymous() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .request_with_authorization(Method::GET, "/api/auth/me", "NotBearer sometoken")
        .await;
    assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/auth/me");
    assert_eq!(res.body["message"], "Authentication required");

    let res = app
        .request_with_authorization(Method::GET, "/api/products", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn empty_bearer_credential_is_rejected() -> Result<()> {
    let app = TestApp::new();

    for header in ["Bearer ", "Bearer"] {
        let res = app.request_with_authorization(Method::GET, "/api/products", header).await;
        assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/products");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_and_tampered_tokens_are_rejected() -> Result<()> {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let first = if parts[2].starts_with('A') { "B" } else { "A" };
    parts[2].replace_range(0..1, first);
    let tampered = parts.join(".");

    for bad in ["not-a-jwt", "a.b.c", tampered.as_str()] {
        let res = app.get("/api/auth/me", Some(bad)).await;
        assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/auth/me");
        assert_eq!(res.body["message"], "Invalid or expired token");

        // A credential that was sent must be valid, even on public routes
        let res = app.get("/api/products", Some(bad)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn token_from_another_secret_cannot_claim_admin() -> Result<()> {
    let app = TestApp::new();
    let forged = TokenCodec::new(b"someone-elses-secret-of-enough-length", "product-review-api", Duration::hours(1))
        .issue(1, "mallory", Role::Admin, app.clock.utc())?;

    let res = app.get("/api/admin/users", Some(&forged)).await;

    assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/admin/users");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let token = app.register("alice").await;
    assert_eq!(app.get("/api/auth/me", Some(&token)).await.status, StatusCode::OK);

    app.clock.advance(Duration::days(1) + Duration::seconds(1));

    let res = app.get("/api/auth/me", Some(&token)).await;
    assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/auth/me");
    assert_eq!(res.body["message"], "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn claims_are_trusted_until_expiry_without_recheck() -> Result<()> {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let user = app.store.find_user_by_username("alice").await?.expect("registered");

    app.store.set_user_enabled(user.id, false).await?;

    assert_eq!(app.get("/api/auth/me", Some(&token)).await.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn recheck_rejects_disabled_and_changed_principals() -> Result<()> {
    let mut config = AppConfig::testing();
    config.security.recheck_principals = true;
    let app = TestApp::with_config(config);

    let token = app.register("alice").await;
    assert_eq!(app.get("/api/auth/me", Some(&token)).await.status, StatusCode::OK);
    let user = app.store.find_user_by_username("alice").await?.expect("registered");

    // A correctly signed token whose role no longer matches storage
    let escalated = app.token_for(user.id, "alice", Role::Admin);
    let res = app.get("/api/admin/users", Some(&escalated)).await;
    assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/admin/users");

    app.store.set_user_enabled(user.id, false).await?;
    let res = app.get("/api/auth/me", Some(&token)).await;
    assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/auth/me");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_answer_with_a_structured_body() -> Result<()> {
    let app = TestApp::new();
    let token = app.register("alice").await;

    // Unmatched paths fall under the authenticated default
    let res = app.get("/api/unknown", None).await;
    assert_error_body(&res, StatusCode::UNAUTHORIZED, "/api/unknown");

    let res = app.get("/api/unknown", Some(&token)).await;
    assert_error_body(&res, StatusCode::NOT_FOUND, "/api/unknown");
    Ok(())
}
