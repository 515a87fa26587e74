//! Token validation and issuance
//!
//! [`TokenValidator`] is the only capability the request interceptor needs.
//! [`TokenManager`] is the stock implementation: stateless HMAC-SHA256 signed
//! tokens bound to a token id, which also implements [`TokenIssuer`] so the
//! cookie issuer can hand fresh tokens to clients.
//!
//! Stock tokens are not bound to a session or user. Any token signed with the
//! secret and carrying the right token id is accepted from any client until it
//! expires, so a leaked token can be replayed by another user for up to
//! `ttl_seconds`. Keep the TTL short, or plug in a [`TokenValidator`] that
//! checks tokens against server-side session state when that matters.

use crate::error::{CsrfError, Result};
use crate::token::{CsrfToken, MAX_TOKEN_TTL};
use tracing::trace;

/// Minimum secret length accepted for signing.
pub const MIN_SECRET_LEN: usize = 32;

/// Decides whether a client-supplied token is currently valid.
pub trait TokenValidator: Send + Sync {
    fn is_token_valid(&self, token: &str) -> bool;
}

impl<F> TokenValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_token_valid(&self, token: &str) -> bool {
        self(token)
    }
}

/// Produces tokens to hand out to clients.
pub trait TokenIssuer: Send + Sync {
    fn issue_token(&self) -> Result<String>;
}

/// Signed token manager
#[derive(Clone)]
pub struct TokenManager {
    secret: Vec<u8>,
    token_id: String,
    ttl_seconds: i64,
}

impl TokenManager {
    pub fn new(secret: Vec<u8>, token_id: impl Into<String>) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CsrfError::config(format!(
                "Secret key must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            secret,
            token_id: token_id.into(),
            ttl_seconds: 3600,
        })
    }

    /// Set token TTL, between 1 second and [`MAX_TOKEN_TTL`]
    pub fn with_ttl(mut self, ttl_seconds: i64) -> Result<Self> {
        if !(1..=MAX_TOKEN_TTL).contains(&ttl_seconds) {
            return Err(CsrfError::config(format!(
                "token TTL must be between 1 and {} seconds, got {}",
                MAX_TOKEN_TTL, ttl_seconds
            )));
        }
        self.ttl_seconds = ttl_seconds;
        Ok(self)
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Get a token to hand to the client
    pub fn get_token(&self) -> Result<String> {
        CsrfToken::generate(self.token_id.clone(), self.ttl_seconds)?.encode(&self.secret)
    }

    /// Replace the client's token with a new one
    pub fn refresh_token(&self) -> Result<String> {
        self.get_token()
    }

    /// Decode a token, reporting exactly why it was refused
    pub fn decode(&self, encoded: &str) -> Result<CsrfToken> {
        let token = CsrfToken::decode(encoded, &self.secret)?;
        if token.token_id != self.token_id {
            return Err(CsrfError::TokenIdMismatch {
                expected: self.token_id.clone(),
                found: token.token_id,
            });
        }
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("secret", &"<redacted>")
            .field("token_id", &self.token_id)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenValidator for TokenManager {
    fn is_token_valid(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(_) => true,
            Err(err) => {
                trace!(error = %err, "Token refused");
                false
            }
        }
    }
}

impl TokenIssuer for TokenManager {
    fn issue_token(&self) -> Result<String> {
        self.get_token()
    }
}
