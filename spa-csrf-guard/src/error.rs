use spa_csrf_config::ConfigError;
use thiserror::Error;

/// Message returned to clients for every rejected request.
///
/// Missing and invalid tokens are reported identically.
pub const BAD_TOKEN_MESSAGE: &str = "Bad CSRF token.";

#[derive(Error, Debug)]
pub enum CsrfError {
    #[error("Invalid CSRF token")]
    InvalidToken,

    #[error("Missing CSRF token")]
    MissingToken,

    #[error("CSRF token expired")]
    TokenExpired,

    #[error("CSRF token issued for '{found}', expected '{expected}'")]
    TokenIdMismatch { expected: String, found: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid CSRF configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CsrfError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error describes a bad token rather than a broken setup
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken
                | Self::MissingToken
                | Self::TokenExpired
                | Self::TokenIdMismatch { .. }
                | Self::SerializationError(_)
                | Self::Base64Error(_)
        )
    }
}

impl From<ConfigError> for CsrfError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CsrfError> for spa_csrf_core::Error {
    fn from(err: CsrfError) -> Self {
        if err.is_token_error() {
            spa_csrf_core::Error::Forbidden(BAD_TOKEN_MESSAGE.to_string())
        } else {
            spa_csrf_core::Error::Internal(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, CsrfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_collapse_to_bad_token() {
        for err in [
            CsrfError::InvalidToken,
            CsrfError::MissingToken,
            CsrfError::TokenExpired,
        ] {
            let core: spa_csrf_core::Error = err.into();
            assert_eq!(core.status_code(), 403);
            assert_eq!(core.message(), BAD_TOKEN_MESSAGE);
        }
    }

    #[test]
    fn test_config_error_is_internal() {
        let core: spa_csrf_core::Error = CsrfError::config("no secret").into();
        assert_eq!(core.status_code(), 500);
    }
}
