use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Outermost stage: re-renders any [`ApiError`] response with the request
/// path and a timestamp from the application clock.
pub async fn error_body(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if let Some(error) = response.extensions().get::<ApiError>().cloned() {
        return error.render(&path, state.clock.utc());
    }
    response
}
