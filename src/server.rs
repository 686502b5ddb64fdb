use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{authenticate, authorize, error_body, timing};
use crate::state::AppState;

/// Build the full application: routes plus the middleware chain.
///
/// Request order through the chain: trace → CORS → body limit → error body
/// → timing → authentication gate → authorization policy → handler.
pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state);

    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_routes())
        .merge(product_routes())
        .merge(admin_routes())
        .fallback(not_found)
        // Added innermost first
        .layer(from_fn_with_state(state.clone(), authorize))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), timing))
        .layer(from_fn_with_state(state.clone(), error_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(public::auth::register))
        .route("/api/auth/login", post(public::auth::login))
        .route("/api/auth/me", get(protected::session::me))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(public::products::list))
        .route("/api/products/:id", get(public::products::get))
        .route(
            "/api/products/:id/reviews",
            get(public::products::reviews).post(protected::reviews::create),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/users",
            get(elevated::admin::list_users).post(elevated::admin::create_user),
        )
        .route("/api/admin/products", post(elevated::admin::create_product))
}

async fn not_found() -> ApiError {
    ApiError::not_found("No route for this path")
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let security = &state.config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Product Review API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
