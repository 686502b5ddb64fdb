//! In-process store, used by the test suite and `serve --memory`.
//!
//! Users live behind one lock so check-and-insert is a single critical
//! section. Each product has its own mutex; review appends for different
//! products never contend.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use tokio::sync::{Mutex, RwLock};

use crate::database::manager::DatabaseError;
use crate::database::models::{NewProduct, NewReview, NewUser, Product, RatingAggregate, Review, User};
use crate::database::repository::{
    CatalogRepository, Page, PageRequest, SortDirection, SortField, UserRepository,
};

struct ProductEntry {
    product: Product,
    reviews: Vec<Review>,
}

pub struct MemoryStore {
    clock: Arc<dyn Clock + Send + Sync>,
    users: RwLock<Vec<User>>,
    products: RwLock<HashMap<i64, Arc<Mutex<ProductEntry>>>>,
    next_user_id: AtomicI64,
    next_product_id: AtomicI64,
    next_review_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            clock,
            users: RwLock::new(Vec::new()),
            products: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_product_id: AtomicI64::new(1),
            next_review_id: AtomicI64::new(1),
        }
    }

    async fn entry(&self, product_id: i64) -> Option<Arc<Mutex<ProductEntry>>> {
        self.products.read().await.get(&product_id).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::UniqueViolation { field: "username" });
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueViolation { field: "email" });
        }

        let stored = User {
            id: self.next_user_id.fetch_add(1, AtomicOrdering::SeqCst),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            enabled: true,
            created_at: self.clock.utc(),
        };
        users.push(stored.clone());
        Ok(stored)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.iter().find(|u| u.username == username).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        Ok(self.users.read().await.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        Ok(self.users.read().await.iter().any(|u| u.email == email))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.users.read().await.clone())
    }

    async fn set_user_enabled(&self, id: i64, enabled: bool) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User not found: {}", id)))?;
        user.enabled = enabled;
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, DatabaseError> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let id = self.next_product_id.fetch_add(1, AtomicOrdering::SeqCst);
        let stored = Product {
            id,
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            rating: RatingAggregate::EMPTY,
            created_at: self.clock.utc(),
        };

        let entry = ProductEntry {
            product: stored.clone(),
            reviews: Vec::new(),
        };
        self.products.write().await.insert(id, Arc::new(Mutex::new(entry)));
        Ok(stored)
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        match self.entry(id).await {
            Some(entry) => Ok(Some(entry.lock().await.product.clone())),
            None => Ok(None),
        }
    }

    async fn list_products(&self, request: &PageRequest) -> Result<Page<Product>, DatabaseError> {
        let entries: Vec<_> = self.products.read().await.values().cloned().collect();
        let mut products = Vec::with_capacity(entries.len());
        for entry in entries {
            products.push(entry.lock().await.product.clone());
        }

        products.sort_by(|a, b| {
            let ordering = compare(a, b, request.sort.field);
            let ordering = match request.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });

        let total_elements = products.len() as i64;
        let content = products
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();

        Ok(Page {
            content,
            total_elements,
            page: request.page,
            size: request.size,
        })
    }

    async fn count_products(&self) -> Result<i64, DatabaseError> {
        Ok(self.products.read().await.len() as i64)
    }

    async fn list_reviews(&self, product_id: i64) -> Result<Vec<Review>, DatabaseError> {
        let entry = self
            .entry(product_id)
            .await
            .ok_or_else(|| DatabaseError::NotFound(format!("Product not found: {}", product_id)))?;

        let mut reviews = entry.lock().await.reviews.clone();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn append_review(
        &self,
        review: NewReview,
        fold: fn(RatingAggregate, i32) -> RatingAggregate,
    ) -> Result<(Review, RatingAggregate), DatabaseError> {
        let entry = self
            .entry(review.product_id)
            .await
            .ok_or_else(|| DatabaseError::NotFound(format!("Product not found: {}", review.product_id)))?;

        // Held until both the review and the aggregate are written
        let mut entry = entry.lock().await;

        if !self.users.read().await.iter().any(|u| u.id == review.user_id) {
            return Err(DatabaseError::UserNotFound(review.user_id));
        }

        let aggregate = fold(entry.product.rating, review.rating);
        let stored = Review {
            id: self.next_review_id.fetch_add(1, AtomicOrdering::SeqCst),
            product_id: review.product_id,
            user_id: review.user_id,
            username: review.username,
            rating: review.rating,
            comment: review.comment,
            created_at: self.clock.utc(),
        };

        entry.reviews.push(stored.clone());
        entry.product.rating = aggregate;

        Ok((stored, aggregate))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Category => a.category.cmp(&b.category),
        SortField::Price => a.price.cmp(&b.price),
        SortField::AverageRating => a.rating.average_rating.total_cmp(&b.rating.average_rating),
        SortField::ReviewCount => a.rating.review_count.cmp(&b.rating.review_count),
    }
}
