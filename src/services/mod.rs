pub mod auth_service;
pub mod product_service;
pub mod review_service;
pub mod seed;

pub use auth_service::{AuthError, AuthService};
pub use product_service::{CatalogError, ProductService};
pub use review_service::ReviewService;
pub use seed::{seed_demo_data, SeedError};
