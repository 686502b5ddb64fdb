use chrono::{DateTime, Utc};

/// A stored review, joined with its author's username.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i32,
    pub comment: Option<String>,
}
