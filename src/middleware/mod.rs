pub mod auth;
pub mod authorize;
pub mod error_body;
pub mod response;
pub mod timing;

pub use auth::authenticate;
pub use authorize::authorize;
pub use error_body::error_body;
pub use response::{ApiResponse, ApiResult};
pub use timing::timing;
