// handlers/elevated/admin.rs - /api/admin/users, /api/admin/products

use axum::extract::State;
use tracing::info;

use crate::api::format::{CreateProductRequest, ProductDetail, RegisterRequest, UserResponse};
use crate::api::{ApiJson, CurrentPrincipal};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Role;

/// POST /api/admin/users - Register an ADMIN account
///
/// Same validation and conflict rules as public registration. No token is
/// issued; the new administrator logs in separately.
pub async fn create_user(
    State(state): State<AppState>,
    CurrentPrincipal(admin): CurrentPrincipal,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<UserResponse> {
    let user = state.auth.create_user(request, Role::Admin).await?;
    info!(created_by = admin.user_id, user_id = user.id, "Administrator account created");
    Ok(ApiResponse::created(user.into()))
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserResponse>> {
    let users = state.users.list_users().await?;
    Ok(ApiResponse::success(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/admin/products
///
/// ```json
/// { "name": "Kettle", "description": "1.7l", "category": "Kitchen", "price": 25.00 }
/// ```
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> ApiResult<ProductDetail> {
    let product = state.products.create(request).await?;
    Ok(ApiResponse::created(product.into()))
}
