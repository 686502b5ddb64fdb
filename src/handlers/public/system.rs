// handlers/public/system.rs - GET /, GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Product Review API",
        "version": version,
        "description": "Product catalog and reviews with stateless bearer-token authentication",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public), /api/auth/me (authenticated)",
            "products": "/api/products[/:id] (public)",
            "reviews": "/api/products/:id/reviews (GET public, POST authenticated)",
            "admin": "/api/admin/users, /api/admin/products (ADMIN)",
            "health": "/health (public)",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.clock.utc();

    match state.catalog.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
