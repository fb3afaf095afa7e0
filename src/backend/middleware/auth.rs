/**
 * Authentication Extractor
 *
 * Reads `Authorization: Bearer <token>`, verifies it and hands the caller
 * identity to the handler. Any failure rejects the request with
 * `Unauthorized` before the handler runs.
 */

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::backend::auth::sessions::{verify_token, SessionKeys};
use crate::backend::error::BackendError;
use crate::shared::Identity;

/// Axum extractor for the authenticated caller
///
/// ```rust,ignore
/// async fn handler(AuthUser(identity): AuthUser, State(feeds): State<FeedService>) { ... }
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

/// Extract the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BackendError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            BackendError::unauthorized("Missing Authorization header")
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Invalid Authorization header format");
        BackendError::unauthorized("Invalid Authorization header format")
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        let identity = verify_token(&keys, token)?;
        Ok(AuthUser(identity))
    }
}
