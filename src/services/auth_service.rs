use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::api::format::{AuthResponse, LoginRequest, RegisterRequest};
use crate::auth::{PasswordEncoder, PasswordError, TokenCodec, TokenError};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, UserRepository};
use crate::types::Role;
use crate::validation::{self, ValidationError, Validator};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Email already exists: {0}")]
    EmailTaken(String),

    /// Unknown user, wrong password and disabled account look the same
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Hashing task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Account registration and credential issuance.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<PasswordEncoder>,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<PasswordEncoder>,
        codec: Arc<TokenCodec>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            users,
            passwords,
            codec,
            clock,
        }
    }

    /// Self-service registration. New accounts always get [`Role::User`].
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let user = self.create_user(request, Role::User).await?;
        self.issue(&user)
    }

    /// Create an account with an explicit role, without logging it in.
    pub async fn create_user(&self, request: RegisterRequest, role: Role) -> Result<User, AuthError> {
        validate_registration(&request)?;

        // Friendly early answers; the store's constraints remain the arbiter
        if self.users.username_exists(&request.username).await? {
            return Err(AuthError::UsernameTaken(request.username));
        }
        if self.users.email_exists(&request.email).await? {
            return Err(AuthError::EmailTaken(request.email));
        }

        let password_hash = self.hash_password(request.password).await?;
        let new_user = NewUser {
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash,
            role,
        };

        let user = self.users.insert_user(new_user).await.map_err(|e| match e {
            DatabaseError::UniqueViolation { field: "username" } => AuthError::UsernameTaken(request.username),
            DatabaseError::UniqueViolation { field: "email" } => AuthError::EmailTaken(request.email),
            other => AuthError::Database(other),
        })?;

        info!(user_id = user.id, role = %user.role, "Registered user {}", user.username);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self.users.find_user_by_username(&request.username).await?;

        let passwords = self.passwords.clone();
        let password = request.password;
        let (user, verified) = tokio::task::spawn_blocking(move || match user {
            Some(user) => {
                let verified = passwords.verify(&password, &user.password_hash);
                (Some(user), verified)
            }
            None => (None, passwords.verify_decoy(&password)),
        })
        .await?;

        match user {
            Some(user) if verified && user.enabled => {
                info!(user_id = user.id, "Login succeeded for {}", user.username);
                self.issue(&user)
            }
            _ => {
                warn!("Login failed for {}", request.username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    fn issue(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let token = self.codec.issue(user.id, &user.username, user.role, self.clock.utc())?;

        Ok(AuthResponse {
            token,
            token_type: "Bearer",
            expires_in: self.codec.lifetime().num_seconds(),
            username: user.username.clone(),
            role: user.role,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let passwords = self.passwords.clone();
        let hash = tokio::task::spawn_blocking(move || passwords.hash(&password)).await??;
        Ok(hash)
    }
}

fn validate_registration(request: &RegisterRequest) -> Result<(), ValidationError> {
    Validator::new()
        .check("username", request.username.as_str(), &[validation::length(3, 50)])
        .check(
            "email",
            request.email.as_str(),
            &[validation::email(), validation::max_length(100)],
        )
        .check("password", request.password.as_str(), &[validation::length(6, 100)])
        .finish()
}
