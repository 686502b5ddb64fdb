use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::Decision;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Identity;

/// Authorization policy stage. Expects the authentication gate to have run.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or(Identity::Anonymous);

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match state.policy.decide(&method, &path, &identity) {
        Decision::Allow => next.run(request).await,
        Decision::Unauthenticated => {
            debug!(%method, %path, "Anonymous request to protected route");
            ApiError::unauthorized("Authentication required").into_response()
        }
        Decision::Forbidden => {
            warn!(
                %method,
                %path,
                user_id = identity.principal().map(|p| p.user_id),
                "Insufficient role for route"
            );
            ApiError::forbidden("Access denied").into_response()
        }
    }
}
