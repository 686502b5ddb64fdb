// handlers/protected/mod.rs - Handlers for any authenticated principal
pub mod reviews;
pub mod session;
