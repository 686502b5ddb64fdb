pub mod extract;
pub mod format;

pub use extract::{ApiJson, ApiPath, ApiQuery, CurrentPrincipal};
