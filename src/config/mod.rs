use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used when none is configured. Only acceptable outside production.
pub const DEVELOPMENT_JWT_SECRET: &str = "development-only-secret-change-me-0123456789abcdef";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub password: PasswordConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub slow_request_threshold_ms: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_minutes: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Re-check users against storage on every authenticated request
    pub recheck_principals: bool,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub demo_data: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT secret must be configured in production (set SECURITY_JWT_SECRET)")]
    DefaultSecretInProduction,

    #[error("JWT secret must be at least 32 bytes")]
    SecretTooShort,

    #[error("Token lifetime must be positive")]
    ZeroTokenLifetime,

    #[error("Token lifetime must not exceed {} minutes", MAX_TOKEN_LIFETIME_MINUTES)]
    TokenLifetimeTooLong,
}

/// One year
pub const MAX_TOKEN_LIFETIME_MINUTES: u64 = 365 * 24 * 60;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Reject configurations the service must never run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production
            && (self.security.jwt_secret.is_empty() || self.security.jwt_secret == DEVELOPMENT_JWT_SECRET)
        {
            return Err(ConfigError::DefaultSecretInProduction);
        }
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::SecretTooShort);
        }
        if self.security.jwt_expiry_minutes == 0 {
            return Err(ConfigError::ZeroTokenLifetime);
        }
        if self.security.jwt_expiry_minutes > MAX_TOKEN_LIFETIME_MINUTES {
            return Err(ConfigError::TokenLifetimeTooLong);
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_SLOW_REQUEST_THRESHOLD_MS") {
            self.api.slow_request_threshold_ms = v.parse().unwrap_or(self.api.slow_request_threshold_ms);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_MINUTES") {
            self.security.jwt_expiry_minutes = v.parse().unwrap_or(self.security.jwt_expiry_minutes);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("SECURITY_RECHECK_PRINCIPALS") {
            self.security.recheck_principals = v.parse().unwrap_or(self.security.recheck_principals);
        }

        // Password hashing overrides
        if let Ok(v) = env::var("PASSWORD_MEMORY_COST_KIB") {
            self.password.memory_cost_kib = v.parse().unwrap_or(self.password.memory_cost_kib);
        }
        if let Ok(v) = env::var("PASSWORD_TIME_COST") {
            self.password.time_cost = v.parse().unwrap_or(self.password.time_cost);
        }
        if let Ok(v) = env::var("PASSWORD_PARALLELISM") {
            self.password.parallelism = v.parse().unwrap_or(self.password.parallelism);
        }

        if let Ok(v) = env::var("SEED_DEMO_DATA") {
            self.seed.demo_data = v.parse().unwrap_or(self.seed.demo_data);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: true,
                slow_request_threshold_ms: 500,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_issuer: "product-review-api".to_string(),
                jwt_expiry_minutes: 24 * 60, // 1 day
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:8081".to_string(),
                    "http://localhost:19006".to_string(),
                ],
                recheck_principals: false,
            },
            password: PasswordConfig {
                memory_cost_kib: 19 * 1024,
                time_cost: 2,
                parallelism: 1,
            },
            seed: SeedConfig { demo_data: true },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: true,
                slow_request_threshold_ms: 500,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_issuer: "product-review-api".to_string(),
                jwt_expiry_minutes: 8 * 60,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                recheck_principals: false,
            },
            password: PasswordConfig {
                memory_cost_kib: 64 * 1024,
                time_cost: 3,
                parallelism: 4,
            },
            seed: SeedConfig { demo_data: false },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                slow_request_threshold_ms: 1000,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "product-review-api".to_string(),
                jwt_expiry_minutes: 60,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                recheck_principals: true,
            },
            password: PasswordConfig {
                memory_cost_kib: 64 * 1024,
                time_cost: 3,
                parallelism: 4,
            },
            seed: SeedConfig { demo_data: false },
        }
    }

    /// Cheap settings for tests: fast hashing, no seeding, no CORS.
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.api.enable_request_logging = false;
        config.security.enable_cors = false;
        config.password = PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        };
        config.seed.demo_data = false;
        config
    }
}
