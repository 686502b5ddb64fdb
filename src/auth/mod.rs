pub mod password;
pub mod policy;
pub mod resolver;
pub mod token;

pub use password::{PasswordEncoder, PasswordError};
pub use policy::{Access, AuthorizationPolicy, Decision, PathPattern, Rule};
pub use resolver::{IdentityResolver, PrincipalGuard, ResolveError, StoredUserGuard};
pub use token::{fingerprint, Claims, TokenCodec, TokenError};
