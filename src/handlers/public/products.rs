// handlers/public/products.rs - Catalog reads

use axum::extract::State;

use crate::api::format::{PageResponse, ProductDetail, ProductQuery, ProductSummary, ReviewResponse};
use crate::api::{ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/products?page=0&size=10&sort=price,desc
///
/// `size` is clamped to 1..=100. Sortable fields: id, name, category, price,
/// averageRating, reviewCount.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<PageResponse<ProductSummary>> {
    let page = state.products.list(query).await?;
    Ok(ApiResponse::success(page.map(ProductSummary::from).into()))
}

/// GET /api/products/:id
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<ProductDetail> {
    let product = state.products.get(id).await?;
    Ok(ApiResponse::success(product.into()))
}

/// GET /api/products/:id/reviews - newest first
pub async fn reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Vec<ReviewResponse>> {
    let reviews = state.reviews.list(id).await?;
    Ok(ApiResponse::success(reviews.into_iter().map(ReviewResponse::from).collect()))
}
