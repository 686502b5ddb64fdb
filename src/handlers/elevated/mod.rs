// handlers/elevated/mod.rs - Administrative handlers (ADMIN role required)
//
// Everything under /api/admin/** is restricted by the policy table.
pub mod admin;
