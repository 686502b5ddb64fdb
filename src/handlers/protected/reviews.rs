// handlers/protected/reviews.rs - POST /api/products/:id/reviews

use axum::extract::State;

use crate::api::format::{CreateReviewRequest, ReviewResponse};
use crate::api::{ApiJson, ApiPath, CurrentPrincipal};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/products/:id/reviews - Review a product as the calling user
///
/// Expected Input:
/// ```json
/// { "rating": 4, "comment": "Solid kettle" }
/// ```
///
/// 400 when the rating is outside 1..=5 or the comment is too long, 404 when
/// the product does not exist. The product's reviewCount and averageRating
/// are updated in the same atomic unit as the insert.
pub async fn create(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> ApiResult<ReviewResponse> {
    let (review, _aggregate) = state.reviews.add_review(product_id, &principal, request).await?;
    Ok(ApiResponse::created(review.into()))
}
