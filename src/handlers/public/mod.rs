// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Credential issuance, catalog reads and operational endpoints.
pub mod auth;
pub mod products;
pub mod system;
