//! Persistence surface used by the services.
//!
//! Every store implements both traits. Uniqueness of usernames and emails
//! and the atomicity of [`CatalogRepository::append_review`] are the store's
//! responsibility, not the caller's.

use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewProduct, NewReview, NewUser, Product, RatingAggregate, Review, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`DatabaseError::UniqueViolation`] naming `username` or
    /// `email` when either is taken, even under concurrent inserts.
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn username_exists(&self, username: &str) -> Result<bool, DatabaseError>;

    async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn set_user_enabled(&self, id: i64, enabled: bool) -> Result<(), DatabaseError>;

    async fn count_users(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, DatabaseError>;

    async fn find_product(&self, id: i64) -> Result<Option<Product>, DatabaseError>;

    async fn list_products(&self, request: &PageRequest) -> Result<Page<Product>, DatabaseError>;

    async fn count_products(&self) -> Result<i64, DatabaseError>;

    /// Reviews of one product, newest first.
    async fn list_reviews(&self, product_id: i64) -> Result<Vec<Review>, DatabaseError>;

    /// Insert a review and fold its rating into the product's aggregate as
    /// one atomic unit, serialized per product.
    ///
    /// `fold` receives the aggregate as it stands under the product lock and
    /// returns the value to persist. Fails with [`DatabaseError::NotFound`]
    /// and changes nothing when the product does not exist.
    async fn append_review(
        &self,
        review: NewReview,
        fold: fn(RatingAggregate, i32) -> RatingAggregate,
    ) -> Result<(Review, RatingAggregate), DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Category,
    Price,
    AverageRating,
    ReviewCount,
}

impl SortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(SortField::Id),
            "name" => Some(SortField::Name),
            "category" => Some(SortField::Category),
            "price" => Some(SortField::Price),
            "averageRating" => Some(SortField::AverageRating),
            "reviewCount" => Some(SortField::ReviewCount),
            _ => None,
        }
    }

    /// Column name; only ever one of these fixed identifiers.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Category => "category",
            SortField::Price => "price",
            SortField::AverageRating => "average_rating",
            SortField::ReviewCount => "review_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl Sort {
    /// Parse `field` or `field,asc|desc`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut parts = raw.splitn(2, ',');
        let name = parts.next().unwrap_or_default().trim();
        let field = SortField::parse(name).ok_or_else(|| format!("Unknown sort field: {}", name))?;

        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => return Err(format!("Unknown sort direction: {}", d)),
        };

        Ok(Self { field, direction })
    }
}

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based
    pub page: u32,
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    /// `size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, size: u32, sort: Sort) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, Sort::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        let size = i64::from(self.size.max(1));
        (self.total_elements + size - 1) / size
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        i64::from(self.page) + 1 >= self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page: self.page,
            size: self.size,
        }
    }
}
