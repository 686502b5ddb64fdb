// handlers/protected/session.rs - GET /api/auth/me

use crate::api::CurrentPrincipal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Principal;

/// GET /api/auth/me - The principal resolved from the caller's token
///
/// ```json
/// { "userId": 2, "username": "user", "role": "USER" }
/// ```
pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}
