use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub rating: RatingAggregate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
}

/// Review count and mean rating derived from a product's reviews.
///
/// Only forward accumulation is supported: raw ratings are not kept on the
/// product, so removing or editing a review cannot be reflected exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub review_count: i64,
    /// 0 when there are no reviews
    pub average_rating: f64,
}

impl RatingAggregate {
    pub const EMPTY: RatingAggregate = RatingAggregate {
        review_count: 0,
        average_rating: 0.0,
    };

    /// Fold one more rating into the running mean.
    pub fn with_rating(self, rating: i32) -> Self {
        let review_count = self.review_count + 1;
        let average_rating =
            (self.average_rating * self.review_count as f64 + f64::from(rating)) / review_count as f64;

        Self {
            review_count,
            average_rating,
        }
    }
}

impl Default for RatingAggregate {
    fn default() -> Self {
        Self::EMPTY
    }
}
