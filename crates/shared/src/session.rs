//! Signed session tokens.
//!
//! The session cookie carries a JWT whose subject is the signed-in user.
//! A token that fails to decode is treated by callers as "no session".

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::types::UserId;

/// Claims stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (signed-in user ID).
    pub sub: UserId,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl SessionClaims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.sub
    }
}

/// Errors that can occur during session token operations.
#[derive(Debug, Error)]
pub enum SessionTokenError {
    /// Token encoding failed.
    #[error("failed to encode session token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode session token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("session token has expired")]
    Expired,
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct SessionTokenService {
    ttl: Duration,
    secure_cookie: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("ttl", &self.ttl)
            .field("secure_cookie", &self.secure_cookie)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl SessionTokenService {
    /// Creates a new session token service from configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            ttl: Duration::hours(config.ttl_hours),
            secure_cookie: config.secure_cookie,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Issues a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns `SessionTokenError::EncodingError` if token generation fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, SessionTokenError> {
        let claims = SessionClaims::new(user_id, Utc::now() + self.ttl);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionTokenError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a session token.
    ///
    /// # Errors
    ///
    /// Returns `SessionTokenError::Expired` if the token has expired.
    /// Returns `SessionTokenError::DecodingError` if the token is malformed or tampered with.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::Expired,
                _ => SessionTokenError::DecodingError(e.to_string()),
            })
    }

    /// Returns the session lifetime in seconds.
    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Whether session cookies should be marked `Secure`.
    #[must_use]
    pub const fn secure_cookie(&self) -> bool {
        self.secure_cookie
    }
}
