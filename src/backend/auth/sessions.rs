/**
 * Session Management and JWT Tokens
 *
 * Bearer credentials are HS256 JWTs whose claims carry both halves of the
 * caller identity: the internal user id (`sub`) and the external identity
 * key (`uid`).
 */

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::shared::{parse_id, Identity};

/// Tokens are valid for 30 days
const TOKEN_LIFETIME_DAYS: i64 = 30;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// External identity key
    pub uid: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Signing and verification keys derived from the shared secret
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKeys(..)")
    }
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `keys` - Session keys
/// * `identity` - Identity the token stands for
///
/// # Returns
/// JWT token string
pub fn create_token(
    keys: &SessionKeys,
    identity: &Identity,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: identity.id.to_string(),
        uid: identity.uid.clone(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        iat: now.timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding)
}

/// Verify a JWT token and resolve the caller identity
///
/// # Arguments
/// * `keys` - Session keys
/// * `token` - JWT token string
///
/// # Returns
/// The identity or `Unauthorized`
pub fn verify_token(keys: &SessionKeys, token: &str) -> Result<Identity, BackendError> {
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map_err(|e| {
            tracing::warn!("Invalid token: {:?}", e);
            BackendError::unauthorized("Invalid or expired token")
        })?;

    let claims = token_data.claims;
    let id = parse_id("sub", &claims.sub)
        .map_err(|_| BackendError::unauthorized("Invalid user ID in token"))?;

    Ok(Identity::new(id, claims.uid))
}
