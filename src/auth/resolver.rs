//! Turns a bearer token into a [`Principal`].
//!
//! The baseline resolver is purely stateless: a principal is trusted for as
//! long as its token is valid, so a user deleted or demoted after issuance
//! keeps access for at most one token lifetime. Deployments that cannot
//! accept that window install a [`PrincipalGuard`], which is consulted after
//! the token checks pass.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use thiserror::Error;

use super::token::{TokenCodec, TokenError};
use crate::database::repository::UserRepository;
use crate::types::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("principal rejected: {0}")]
    Rejected(String),

    #[error("principal check unavailable: {0}")]
    Unavailable(String),
}

impl ResolveError {
    pub fn reason(&self) -> &'static str {
        match self {
            ResolveError::Token(e) => e.reason(),
            ResolveError::Rejected(_) => "rejected",
            ResolveError::Unavailable(_) => "unavailable",
        }
    }
}

/// Second opinion on a principal whose token already verified.
#[async_trait]
pub trait PrincipalGuard: Send + Sync {
    async fn admit(&self, principal: &Principal) -> Result<(), ResolveError>;
}

#[derive(Clone)]
pub struct IdentityResolver {
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock + Send + Sync>,
    guard: Option<Arc<dyn PrincipalGuard>>,
}

impl IdentityResolver {
    pub fn new(codec: Arc<TokenCodec>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { codec, clock, guard: None }
    }

    pub fn with_guard(mut self, guard: Arc<dyn PrincipalGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub async fn resolve(&self, token: &str) -> Result<Principal, ResolveError> {
        let claims = self.codec.verify(token, self.clock.utc())?;
        let principal = Principal::from(claims);

        if let Some(guard) = &self.guard {
            guard.admit(&principal).await?;
        }

        Ok(principal)
    }
}

/// Rejects principals whose account vanished, was disabled, or changed role
/// since the token was issued.
pub struct StoredUserGuard {
    users: Arc<dyn UserRepository>,
}

impl StoredUserGuard {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl PrincipalGuard for StoredUserGuard {
    async fn admit(&self, principal: &Principal) -> Result<(), ResolveError> {
        let user = self
            .users
            .find_user_by_id(principal.user_id)
            .await
            .map_err(|e| ResolveError::Unavailable(e.to_string()))?
            .ok_or_else(|| ResolveError::Rejected(format!("user {} no longer exists", principal.user_id)))?;

        if !user.enabled {
            return Err(ResolveError::Rejected(format!("user {} is disabled", principal.user_id)));
        }
        if user.username != principal.username || user.role != principal.role {
            return Err(ResolveError::Rejected(format!("user {} changed since issuance", principal.user_id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::NewUser;
    use crate::testing::FixedClock;
    use crate::types::Role;
    use chrono::{Duration, TimeZone, Utc};

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(b"resolver-test-secret-0123456789abcdef", "test", Duration::minutes(5)))
    }

    #[tokio::test]
    async fn resolves_valid_token_to_principal() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let codec = codec();
        let token = codec.issue(3, "carol", Role::User, clock.utc()).unwrap();

        let resolver = IdentityResolver::new(codec, clock);
        let principal = resolver.resolve(&token).await.unwrap();

        assert_eq!(principal, Principal { user_id: 3, username: "carol".into(), role: Role::User });
    }

    #[tokio::test]
    async fn expiry_follows_the_injected_clock() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let codec = codec();
        let token = codec.issue(3, "carol", Role::User, clock.utc()).unwrap();
        let resolver = IdentityResolver::new(codec, clock.clone());

        clock.advance(Duration::minutes(5) + Duration::seconds(1));

        assert_eq!(resolver.resolve(&token).await, Err(ResolveError::Token(TokenError::Expired)));
    }

    #[tokio::test]
    async fn stored_user_guard_rejects_stale_principals() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let store = Arc::new(MemoryStore::new());
        let alice = store
            .insert_user(NewUser {
                username: "alice".into(),
                email: "a@x.com".into(),
                password_hash: "irrelevant".into(),
                role: Role::User,
            })
            .await
            .unwrap();

        let codec = codec();
        let resolver = IdentityResolver::new(codec.clone(), clock.clone())
            .with_guard(Arc::new(StoredUserGuard::new(store.clone())));

        let good = codec.issue(alice.id, "alice", Role::User, clock.utc()).unwrap();
        assert!(resolver.resolve(&good).await.is_ok());

        // Claims an admin role the account does not hold
        let escalated = codec.issue(alice.id, "alice", Role::Admin, clock.utc()).unwrap();
        assert!(matches!(resolver.resolve(&escalated).await, Err(ResolveError::Rejected(_))));

        let ghost = codec.issue(999, "ghost", Role::User, clock.utc()).unwrap();
        assert!(matches!(resolver.resolve(&ghost).await, Err(ResolveError::Rejected(_))));

        store.set_user_enabled(alice.id, false).await.unwrap();
        assert!(matches!(resolver.resolve(&good).await, Err(ResolveError::Rejected(_))));
    }
}
