// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no principal) → Protected (any authenticated principal) → Elevated (ADMIN).
// The tiers only group handlers; access is enforced by the authorization
// policy in the middleware chain, never by the handlers themselves.
pub mod elevated;
pub mod protected;
pub mod public;
