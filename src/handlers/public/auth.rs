// handlers/public/auth.rs - POST /api/auth/register, POST /api/auth/login

use axum::extract::State;

use crate::api::format::{AuthResponse, LoginRequest, RegisterRequest};
use crate::api::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth/register - Create a USER account and receive a token
///
/// Expected Input:
/// ```json
/// { "username": "alice", "email": "a@x.com", "password": "secret123" }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "token": "eyJ...", "tokenType": "Bearer", "expiresIn": 86400, "username": "alice", "role": "USER" }
/// ```
///
/// 400 on invalid fields, 409 when the username or email is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let issued = state.auth.register(request).await?;
    Ok(ApiResponse::created(issued))
}

/// POST /api/auth/login - Exchange username and password for a token
///
/// Every failure is the same 401, whether the user is unknown, disabled or
/// the password is wrong.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let issued = state.auth.login(request).await?;
    Ok(ApiResponse::success(issued))
}
