//! Explicit wiring of every collaborator the router needs.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use thiserror::Error;
use tracing::info;

use crate::auth::{AuthorizationPolicy, IdentityResolver, PasswordEncoder, PasswordError, StoredUserGuard, TokenCodec};
use crate::config::{AppConfig, ConfigError};
use crate::database::{CatalogRepository, UserRepository};
use crate::services::{AuthService, ProductService, ReviewService};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub resolver: IdentityResolver,
    pub policy: Arc<AuthorizationPolicy>,
    pub auth: AuthService,
    pub products: ProductService,
    pub reviews: ReviewService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        catalog: Arc<dyn CatalogRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, StateError> {
        config.validate()?;

        // Bounded by validate()
        let lifetime = Duration::minutes(config.security.jwt_expiry_minutes as i64);
        let codec = Arc::new(TokenCodec::new(
            config.security.jwt_secret.as_bytes(),
            config.security.jwt_issuer.clone(),
            lifetime,
        ));
        let passwords = Arc::new(PasswordEncoder::new(&config.password)?);

        let mut resolver = IdentityResolver::new(codec.clone(), clock.clone());
        if config.security.recheck_principals {
            info!("Principals are re-checked against storage on every request");
            resolver = resolver.with_guard(Arc::new(StoredUserGuard::new(users.clone())));
        }

        Ok(Self {
            auth: AuthService::new(users.clone(), passwords, codec, clock.clone()),
            products: ProductService::new(catalog.clone()),
            reviews: ReviewService::new(catalog.clone()),
            policy: Arc::new(AuthorizationPolicy::standard()),
            config: Arc::new(config),
            clock,
            users,
            catalog,
            resolver,
        })
    }
}
