use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::{fingerprint, ResolveError};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Identity;

/// Client-facing text for every token failure; the real reason is only logged.
const INVALID_TOKEN: &str = "Invalid or expired token";

/// Authentication gate. Runs once per request, before authorization.
///
/// Attaches an [`Identity`] to the request extensions: anonymous when no
/// bearer credential is sent, the resolved principal otherwise. A bearer
/// credential that does not resolve ends the request here with 401.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = match extract_bearer(request.headers()) {
        Bearer::Absent => Identity::Anonymous,
        Bearer::OtherScheme => {
            // Not ours to interpret; protected routes will still demand credentials
            debug!("Ignoring non-bearer Authorization header");
            Identity::Anonymous
        }
        Bearer::Empty => {
            warn!(reason = "malformed", "Rejected empty bearer credential");
            return ApiError::unauthorized(INVALID_TOKEN).into_response();
        }
        Bearer::Token(token) => match state.resolver.resolve(&token).await {
            Ok(principal) => {
                debug!(user_id = principal.user_id, role = %principal.role, "Authenticated request");
                Identity::Authenticated(principal)
            }
            Err(ResolveError::Unavailable(e)) => {
                return ApiError::internal(format!("principal check unavailable: {}", e)).into_response();
            }
            Err(e) => {
                warn!(
                    reason = e.reason(),
                    token = %fingerprint(&token),
                    "Rejected bearer credential: {}",
                    e
                );
                return ApiError::unauthorized(INVALID_TOKEN).into_response();
            }
        },
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[derive(Debug, PartialEq, Eq)]
enum Bearer {
    Absent,
    OtherScheme,
    Empty,
    Token(String),
}

/// Exactly `Bearer <token>`; anything else is not a bearer credential.
fn extract_bearer(headers: &HeaderMap) -> Bearer {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Bearer::Absent;
    };

    let Ok(value) = value.to_str() else {
        return Bearer::OtherScheme;
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Bearer::Empty,
        Some(token) => Bearer::Token(token.trim().to_string()),
        None if value == "Bearer" => Bearer::Empty,
        None => Bearer::OtherScheme,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Bearer::Absent);
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")), Bearer::Token("abc.def.ghi".into()));
        assert_eq!(extract_bearer(&headers("Bearer ")), Bearer::Empty);
        assert_eq!(extract_bearer(&headers("Bearer")), Bearer::Empty);
        assert_eq!(extract_bearer(&headers("NotBearer sometoken")), Bearer::OtherScheme);
        assert_eq!(extract_bearer(&headers("bearer abc")), Bearer::OtherScheme);
        assert_eq!(extract_bearer(&headers("Basic dXNlcjpwYXNz")), Bearer::OtherScheme);
    }
}
