use rust_decimal::Decimal;
use tracing::info;

use crate::api::format::{CreateProductRequest, RegisterRequest};
use crate::services::auth_service::AuthError;
use crate::services::product_service::CatalogError;
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seeding users failed: {0}")]
    Users(#[from] AuthError),

    #[error("seeding products failed: {0}")]
    Products(#[from] CatalogError),

    #[error("seeding check failed: {0}")]
    Database(#[from] crate::database::DatabaseError),
}

const DEMO_USERS: &[(&str, &str, &str, Role)] = &[
    ("admin", "admin@example.com", "admin123", Role::Admin),
    ("user", "user@example.com", "user123", Role::User),
];

const DEMO_PRODUCTS: &[(&str, &str, &str, i64)] = &[
    ("Wireless Headphones", "Over-ear noise cancelling headphones", "Electronics", 19999),
    ("Mechanical Keyboard", "Tenkeyless board with hot-swap switches", "Electronics", 8950),
    ("Espresso Machine", "15 bar pump with steam wand", "Kitchen", 34900),
    ("Cast Iron Skillet", "Pre-seasoned 12 inch skillet", "Kitchen", 3499),
    ("Trail Running Shoes", "Lightweight shoes with rock plate", "Sports", 12000),
    ("Yoga Mat", "6mm non-slip mat", "Sports", 2999),
    ("The Rust Programming Language", "The official book, second edition", "Books", 3995),
];

/// Populate an empty store with demo accounts and a small catalog.
///
/// Does nothing when any user or product already exists, so restarting a
/// seeded instance is harmless. Returns whether anything was written.
pub async fn seed_demo_data(state: &AppState) -> Result<bool, SeedError> {
    if state.users.count_users().await? > 0 || state.catalog.count_products().await? > 0 {
        info!("Store already populated, skipping demo data");
        return Ok(false);
    }

    for (username, email, password, role) in DEMO_USERS {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        state.auth.create_user(request, *role).await?;
    }

    for (name, description, category, cents) in DEMO_PRODUCTS {
        let request = CreateProductRequest {
            name: name.to_string(),
            description: Some(description.to_string()),
            category: category.to_string(),
            price: Decimal::new(*cents, 2),
        };
        state.products.create(request).await?;
    }

    info!(
        users = DEMO_USERS.len(),
        products = DEMO_PRODUCTS.len(),
        "Seeded demo data"
    );
    Ok(true)
}
