use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::{Principal, Role};

/// Claims carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub uid: i64,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.role,
        }
    }
}

/// Why a token was refused. Only ever logged; clients see one generic message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token encoding")]
    Malformed,

    #[error("token integrity check failed")]
    Integrity,

    #[error("token expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Stable tag for structured logs
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::Integrity => "integrity",
            TokenError::Expired => "expired",
            TokenError::Signing(_) => "signing",
        }
    }
}

/// Issues and verifies HS256 tokens. Holds no per-token state; every check is
/// re-derived from the secret and the token bytes.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, user_id: i64, username: &str, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: username.to_string(),
            uid: user_id,
            role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify structure, signature and expiry against the supplied instant.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        if !is_compact_jws(token) {
            return Err(TokenError::Malformed);
        }

        // Expiry is checked below against the injected clock, not the system time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken => TokenError::Malformed,
                // Every other failure on a well-formed token means the tag does
                // not vouch for these bytes.
                _ => TokenError::Integrity,
            })?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Three non-empty base64url segments separated by dots.
fn is_compact_jws(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

/// Short, non-reversible identifier for a token, safe to put in logs.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..12].to_string()
}
