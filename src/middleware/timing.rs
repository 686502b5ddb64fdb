use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::state::AppState;

/// Logs request latency; requests over the configured threshold are warned about.
pub async fn timing(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if elapsed_ms >= state.config.api.slow_request_threshold_ms {
        warn!(%method, %path, status, elapsed_ms, "Slow request");
    } else if state.config.api.enable_request_logging {
        info!(%method, %path, status, elapsed_ms, "Request completed");
    }

    response
}
