//! Postgres-backed store.
//!
//! Review appends lock the product row with `SELECT ... FOR UPDATE` inside
//! the same transaction that inserts the review and writes the new
//! aggregate. The author row is share-locked in that transaction too. Uniqueness of usernames and emails is left to the UNIQUE
//! constraints in the schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{NewProduct, NewReview, NewUser, Product, RatingAggregate, Review, User};
use crate::database::repository::{CatalogRepository, Page, PageRequest, UserRepository};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, enabled, created_at";
const PRODUCT_COLUMNS: &str = "id, name, description, category, price, review_count, average_rating, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn product_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| DatabaseError::CorruptRow(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            enabled: row.enabled,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    category: String,
    price: Decimal,
    review_count: i64,
    average_rating: f64,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            rating: RatingAggregate {
                review_count: row.review_count,
                average_rating: row.average_rating,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: i64,
    product_id: i64,
    user_id: i64,
    username: String,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            username: row.username,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Map constraint violations onto the fields they protect.
fn translate(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_username_key") => "username",
                Some("users_email_key") => "email",
                _ => "value",
            };
            return DatabaseError::UniqueViolation { field };
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(translate)?;

        row.try_into()
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn set_user_enabled(&self, id: i64, enabled: bool) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET enabled = $1 WHERE id = $2")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (name, description, category, price) VALUES ($1, $2, $3, $4) RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .fetch_one(&self.pool)
        .await
        .map_err(translate)?;

        Ok(row.into())
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Product::from))
    }

    async fn list_products(&self, request: &PageRequest) -> Result<Page<Product>, DatabaseError> {
        // Sort column and direction come from closed enums, never from input text
        let sql = format!(
            "SELECT {} FROM products ORDER BY {} {}, id ASC LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS,
            request.sort.field.column(),
            request.sort.direction.as_sql()
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(i64::from(request.size))
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;
        let total_elements = self.count_products().await?;

        Ok(Page {
            content: rows.into_iter().map(Product::from).collect(),
            total_elements,
            page: request.page,
            size: request.size,
        })
    }

    async fn count_products(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_reviews(&self, product_id: i64) -> Result<Vec<Review>, DatabaseError> {
        if !self.product_exists(product_id).await? {
            return Err(DatabaseError::NotFound(format!("Product not found: {}", product_id)));
        }

        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.comment, r.created_at \
             FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.product_id = $1 \
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn append_review(
        &self,
        review: NewReview,
        fold: fn(RatingAggregate, i32) -> RatingAggregate,
    ) -> Result<(Review, RatingAggregate), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent appends for this product block here until we commit
        let current: Option<(i64, f64)> =
            sqlx::query_as("SELECT review_count, average_rating FROM products WHERE id = $1 FOR UPDATE")
                .bind(review.product_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((review_count, average_rating)) = current else {
            // Dropping the transaction rolls it back
            return Err(DatabaseError::NotFound(format!("Product not found: {}", review.product_id)));
        };

        // Keeps the author row from disappearing before commit
        let author: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR SHARE")
            .bind(review.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if author.is_none() {
            return Err(DatabaseError::UserNotFound(review.user_id));
        }

        let aggregate = fold(
            RatingAggregate {
                review_count,
                average_rating,
            },
            review.rating,
        );

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO reviews (product_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) \
             RETURNING id, created_at",
        )
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET review_count = $1, average_rating = $2 WHERE id = $3")
            .bind(aggregate.review_count)
            .bind(aggregate.average_rating)
            .bind(review.product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let stored = Review {
            id,
            product_id: review.product_id,
            user_id: review.user_id,
            username: review.username,
            rating: review.rating,
            comment: review.comment,
            created_at,
        };
        Ok((stored, aggregate))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
