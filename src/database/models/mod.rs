pub mod product;
pub mod review;
pub mod user;

pub use product::{NewProduct, Product, RatingAggregate};
pub use review::{NewReview, Review};
pub use user::{NewUser, User};
