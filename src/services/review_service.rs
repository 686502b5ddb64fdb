//! Review submission and the product rating aggregate.
//!
//! The running mean is updated forward-only from the stored
//! `(review_count, average_rating)` pair:
//!
//! ```text
//! count' = count + 1
//! mean'  = (mean * count + rating) / count'
//! ```
//!
//! The store applies this under a per-product lock in the same atomic unit
//! that inserts the review, so for any interleaving of N successful
//! submissions the final mean is the mean of the N ratings.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::format::CreateReviewRequest;
use crate::database::models::{NewReview, RatingAggregate, Review};
use crate::database::{CatalogRepository, DatabaseError};
use crate::services::product_service::CatalogError;
use crate::types::Principal;
use crate::validation::{self, Validator};

pub const MAX_COMMENT_LENGTH: usize = 2000;

#[derive(Clone)]
pub struct ReviewService {
    catalog: Arc<dyn CatalogRepository>,
}

impl ReviewService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Newest first. Fails when the product does not exist.
    pub async fn list(&self, product_id: i64) -> Result<Vec<Review>, CatalogError> {
        self.catalog
            .list_reviews(product_id)
            .await
            .map_err(|e| not_found_as(product_id, e))
    }

    /// Validate, then insert the review and fold its rating into the
    /// product aggregate as one unit. Nothing is written on failure,
    /// including when the author no longer has a user row.
    pub async fn add_review(
        &self,
        product_id: i64,
        author: &Principal,
        request: CreateReviewRequest,
    ) -> Result<(Review, RatingAggregate), CatalogError> {
        Validator::new()
            .check("rating", &request.rating, &[validation::range(1, 5)])
            .check_optional(
                "comment",
                request.comment.as_deref(),
                &[validation::max_length(MAX_COMMENT_LENGTH)],
            )
            .finish()?;

        let comment = request.comment.filter(|c| !c.trim().is_empty());
        let review = NewReview {
            product_id,
            user_id: author.user_id,
            username: author.username.clone(),
            rating: request.rating,
            comment,
        };

        let (review, aggregate) = self
            .catalog
            .append_review(review, RatingAggregate::with_rating)
            .await
            .map_err(|e| not_found_as(product_id, e))?;

        info!(product_id, review_id = review.id, rating = review.rating, "Review added by {}", author.username);
        debug!(
            product_id,
            review_count = aggregate.review_count,
            average_rating = aggregate.average_rating,
            "Rating aggregate updated"
        );
        Ok((review, aggregate))
    }
}

fn not_found_as(product_id: i64, err: DatabaseError) -> CatalogError {
    match err {
        DatabaseError::NotFound(_) => CatalogError::ProductNotFound(product_id),
        DatabaseError::UserNotFound(user_id) => CatalogError::UserNotFound(user_id),
        other => CatalogError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewProduct, NewUser};
    use crate::database::{MemoryStore, UserRepository};
    use crate::types::Role;
    use rust_decimal::Decimal;

    fn author() -> Principal {
        Principal {
            user_id: 1,
            username: "alice".into(),
            role: Role::User,
        }
    }

    async fn setup() -> (ReviewService, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_user(NewUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "hash".into(),
                role: Role::User,
            })
            .await
            .unwrap();
        let product = store
            .insert_product(NewProduct {
                name: "Kettle".into(),
                description: None,
                category: "Kitchen".into(),
                price: Decimal::new(2500, 2),
            })
            .await
            .unwrap();
        (ReviewService::new(store.clone()), store, product.id)
    }

    fn rating(rating: i32) -> CreateReviewRequest {
        CreateReviewRequest { rating, comment: None }
    }

    #[tokio::test]
    async fn out_of_range_rating_mutates_nothing() {
        let (service, store, id) = setup().await;

        for bad in [0, 6, -1, i32::MAX] {
            let err = service.add_review(id, &author(), rating(bad)).await.unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)), "rating {}", bad);
        }

        let product = store.find_product(id).await.unwrap().unwrap();
        assert_eq!(product.rating, RatingAggregate::EMPTY);
        assert!(service.list(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_comment_is_rejected() {
        let (service, _store, id) = setup().await;
        let request = CreateReviewRequest {
            rating: 3,
            comment: Some("x".repeat(MAX_COMMENT_LENGTH + 1)),
        };
        assert!(matches!(
            service.add_review(id, &author(), request).await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let (service, _store, _id) = setup().await;
        assert!(matches!(
            service.add_review(999, &author(), rating(4)).await,
            Err(CatalogError::ProductNotFound(999))
        ));
        assert!(matches!(service.list(999).await, Err(CatalogError::ProductNotFound(999))));
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let (service, store, id) = setup().await;
        let ghost = Principal {
            user_id: 999,
            username: "ghost".into(),
            role: Role::User,
        };

        assert!(matches!(
            service.add_review(id, &ghost, rating(5)).await,
            Err(CatalogError::UserNotFound(999))
        ));

        let product = store.find_product(id).await.unwrap().unwrap();
        assert_eq!(product.rating, RatingAggregate::EMPTY);
        assert!(service.list(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sequential_reviews_update_the_mean() {
        let (service, store, id) = setup().await;

        let (_, after_first) = service.add_review(id, &author(), rating(4)).await.unwrap();
        assert_eq!(after_first.review_count, 1);
        assert_eq!(after_first.average_rating, 4.0);

        let (_, after_second) = service.add_review(id, &author(), rating(2)).await.unwrap();
        assert_eq!(after_second.review_count, 2);
        assert_eq!(after_second.average_rating, 3.0);

        let product = store.find_product(id).await.unwrap().unwrap();
        assert_eq!(product.rating, after_second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_reviews_keep_the_mean_exact() {
        let (service, store, id) = setup().await;
        let ratings: Vec<i32> = (0..200).map(|i| (i * 3 % 5) + 1).collect();

        let tasks = ratings.iter().map(|&r| {
            let service = service.clone();
            tokio::spawn(async move { service.add_review(id, &author(), rating(r)).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let product = store.find_product(id).await.unwrap().unwrap();
        let mean = ratings.iter().sum::<i32>() as f64 / ratings.len() as f64;
        assert_eq!(product.rating.review_count, ratings.len() as i64);
        assert!((product.rating.average_rating - mean).abs() < 1e-9);
        assert_eq!(service.list(id).await.unwrap().len(), ratings.len());
    }
}
