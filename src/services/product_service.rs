use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::api::format::{CreateProductRequest, ProductQuery};
use crate::database::models::{NewProduct, Product};
use crate::database::repository::DEFAULT_PAGE_SIZE;
use crate::database::{CatalogRepository, DatabaseError, Page, PageRequest, Sort};
use crate::validation::{self, Rule, ValidationError, Validator};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Clone)]
pub struct ProductService {
    catalog: Arc<dyn CatalogRepository>,
}

impl ProductService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn list(&self, query: ProductQuery) -> Result<Page<Product>, CatalogError> {
        let sort = match query.sort.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                Sort::parse(raw).map_err(|reason| ValidationError::single("sort", reason))?
            }
            _ => Sort::default(),
        };
        let request = PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        );

        Ok(self.catalog.list_products(&request).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Product, CatalogError> {
        self.catalog
            .find_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    pub async fn create(&self, request: CreateProductRequest) -> Result<Product, CatalogError> {
        Validator::new()
            .check("name", request.name.as_str(), &[validation::not_blank(), validation::max_length(200)])
            .check(
                "category",
                request.category.as_str(),
                &[validation::not_blank(), validation::max_length(100)],
            )
            .check("price", &request.price, &[non_negative()])
            .check_optional("description", request.description.as_deref(), &[validation::max_length(2000)])
            .finish()?;

        let product = self
            .catalog
            .insert_product(NewProduct {
                name: request.name,
                description: request.description,
                category: request.category,
                price: request.price.round_dp(2),
            })
            .await?;

        info!(product_id = product.id, "Created product {}", product.name);
        Ok(product)
    }
}

fn non_negative() -> Rule<Decimal> {
    Box::new(|price: &Decimal| {
        if price.is_sign_negative() && !price.is_zero() {
            Err("must not be negative".to_string())
        } else {
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn product(name: &str, price: Decimal) -> CreateProductRequest {
        CreateProductRequest {
            name: name.into(),
            description: None,
            category: "Tools".into(),
            price,
        }
    }

    #[tokio::test]
    async fn created_products_start_without_reviews() {
        let service = ProductService::new(Arc::new(MemoryStore::new()));
        let created = service.create(product("Hammer", Decimal::new(1999, 2))).await.unwrap();

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.rating.review_count, 0);
        assert_eq!(fetched.rating.average_rating, 0.0);
    }

    #[tokio::test]
    async fn rejects_negative_price_and_blank_name() {
        let service = ProductService::new(Arc::new(MemoryStore::new()));
        let err = service.create(product("  ", Decimal::new(-1, 0))).await.unwrap_err();

        match err {
            CatalogError::Validation(v) => {
                assert!(v.details.iter().any(|d| d.starts_with("name:")));
                assert!(v.details.iter().any(|d| d.starts_with("price:")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unknown_sort_field_is_a_validation_failure() {
        let service = ProductService::new(Arc::new(MemoryStore::new()));
        let err = service
            .list(ProductQuery { page: None, size: None, sort: Some("password".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let service = ProductService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(service.get(77).await, Err(CatalogError::ProductNotFound(77))));
    }
}
