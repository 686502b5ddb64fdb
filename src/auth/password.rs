//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings carrying their own salt and parameters, so
//! verification keeps working after the configured costs change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;
use tracing::warn;

use crate::config::PasswordConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

#[derive(Clone)]
pub struct PasswordEncoder {
    argon2: Argon2<'static>,
    /// Verified against when the account does not exist, so unknown
    /// usernames cost the same as wrong passwords.
    decoy_hash: String,
}

impl std::fmt::Debug for PasswordEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordEncoder").finish_non_exhaustive()
    }
}

impl PasswordEncoder {
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_cost_kib, config.time_cost, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let decoy_hash = hash_with(&argon2, "decoy-password-for-unknown-users")?;

        Ok(Self { argon2, decoy_hash })
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plaintext)
    }

    /// Check a plaintext password against a stored PHC hash.
    ///
    /// A stored hash that cannot be parsed never verifies.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is not a valid PHC string: {}", e);
                return false;
            }
        };

        self.argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok()
    }

    /// Burn the same work as a real verification. Always false.
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.decoy_hash);
        false
    }
}

fn hash_with(argon2: &Argon2<'static>, plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> PasswordEncoder {
        PasswordEncoder::new(&PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let encoder = encoder();
        let hash = encoder.hash("password123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("password123"));
        assert!(encoder.verify("password123", &hash));
        assert!(!encoder.verify("wrongpassword", &hash));
    }

    #[test]
    fn test_hash_uniqueness() {
        let encoder = encoder();
        let hash1 = encoder.hash("password123").unwrap();
        let hash2 = encoder.hash("password123").unwrap();

        assert_ne!(hash1, hash2);
        assert!(encoder.verify("password123", &hash1));
        assert!(encoder.verify("password123", &hash2));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let encoder = encoder();
        assert!(!encoder.verify("password123", "not-a-phc-string"));
        assert!(!encoder.verify("", ""));
    }

    #[test]
    fn decoy_verification_always_fails() {
        let encoder = encoder();
        assert!(!encoder.verify_decoy("decoy-password-for-unknown-users"));
    }

    #[test]
    fn rejects_impossible_params() {
        let result = PasswordEncoder::new(&PasswordConfig {
            memory_cost_kib: 1,
            time_cost: 0,
            parallelism: 0,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
