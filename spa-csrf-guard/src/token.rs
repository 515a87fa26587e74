use crate::error::{CsrfError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Longest accepted token lifetime, ten years in seconds.
pub const MAX_TOKEN_TTL: i64 = 10 * 365 * 24 * 60 * 60;

/// CSRF token with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    /// Random token value
    pub value: String,

    /// Identifier of the token family this token belongs to
    pub token_id: String,

    /// Token creation timestamp
    pub created_at: DateTime<Utc>,

    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl CsrfToken {
    /// Generate a new CSRF token
    ///
    /// Fails when `ttl_seconds` pushes the expiry past what a timestamp can hold.
    pub fn generate(token_id: impl Into<String>, ttl_seconds: i64) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.r#gen();
        let value = URL_SAFE_NO_PAD.encode(random_bytes);

        let created_at = Utc::now();
        let expires_at = Duration::try_seconds(ttl_seconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                CsrfError::config(format!("token TTL of {} seconds is out of range", ttl_seconds))
            })?;

        Ok(Self {
            value,
            token_id: token_id.into(),
            created_at,
            expires_at,
        })
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Validate token
    pub fn validate(&self) -> Result<()> {
        if self.is_expired() {
            return Err(CsrfError::TokenExpired);
        }
        Ok(())
    }

    /// Encode token to a signed, URL and cookie safe string
    pub fn encode(&self, secret: &[u8]) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let signature = URL_SAFE_NO_PAD.encode(Self::sign(&json, secret)?);
        let encoded = format!("{}.{}", json, signature);
        Ok(URL_SAFE_NO_PAD.encode(encoded))
    }

    /// Decode a signed token, verifying signature and expiry
    pub fn decode(encoded: &str, secret: &[u8]) -> Result<Self> {
        let decoded = URL_SAFE_NO_PAD.decode(encoded.trim())?;
        let decoded_str = String::from_utf8(decoded).map_err(|_| CsrfError::InvalidToken)?;

        // Timestamps carry fractional seconds, so only the last dot separates
        // the payload from the signature.
        let (json, signature) = decoded_str
            .rsplit_once('.')
            .ok_or(CsrfError::InvalidToken)?;

        let signature = URL_SAFE_NO_PAD.decode(signature)?;
        Self::verify(json, &signature, secret)?;

        let token: CsrfToken = serde_json::from_str(json)?;
        token.validate()?;

        Ok(token)
    }

    fn mac(secret: &[u8]) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(secret).map_err(|e| CsrfError::Internal(e.to_string()))
    }

    /// Sign data with HMAC-SHA256
    fn sign(data: &str, secret: &[u8]) -> Result<Vec<u8>> {
        let mut mac = Self::mac(secret)?;
        mac.update(data.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Constant-time signature check
    fn verify(data: &str, signature: &[u8], secret: &[u8]) -> Result<()> {
        let mut mac = Self::mac(secret)?;
        mac.update(data.as_bytes());
        mac.verify_slice(signature)
            .map_err(|_| CsrfError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_32_bytes_long!!!";

    #[test]
    fn test_token_generation() {
        let token = CsrfToken::generate("angular", 3600).unwrap();
        assert!(!token.value.is_empty());
        assert_eq!(token.token_id, "angular");
        assert!(!token.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = CsrfToken::generate("angular", 3600).unwrap();
        let b = CsrfToken::generate("angular", 3600).unwrap();
        assert_ne!(a.value, b.value);
    }

    #[test]
    fn test_token_expiration() {
        let mut token = CsrfToken::generate("angular", 0).unwrap();
        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
        assert!(matches!(token.validate(), Err(CsrfError::TokenExpired)));
    }

    #[test]
    fn test_token_encode_decode() {
        let token = CsrfToken::generate("angular", 3600).unwrap();

        let encoded = token.encode(SECRET).unwrap();
        assert!(!encoded.contains('.'));
        assert!(!encoded.contains('='));

        let decoded = CsrfToken::decode(&encoded, SECRET).unwrap();
        assert_eq!(token.value, decoded.value);
        assert_eq!(decoded.token_id, "angular");
    }

    #[test]
    fn test_overflowing_ttl_is_an_error() {
        for ttl in [i64::MAX, i64::MAX / 2, i64::MIN] {
            assert!(matches!(
                CsrfToken::generate("angular", ttl),
                Err(CsrfError::Config(_))
            ));
        }
        assert!(CsrfToken::generate("angular", MAX_TOKEN_TTL).is_ok());
    }

    #[test]
    fn test_invalid_signature() {
        let token = CsrfToken::generate("angular", 3600).unwrap();
        let encoded = token.encode(SECRET).unwrap();

        let wrong_secret = b"wrong_secret_key_32_bytes_long!!";
        assert!(matches!(
            CsrfToken::decode(&encoded, wrong_secret),
            Err(CsrfError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected_on_decode() {
        let mut token = CsrfToken::generate("angular", 3600).unwrap();
        token.expires_at = Utc::now() - Duration::seconds(5);
        let encoded = token.encode(SECRET).unwrap();

        assert!(matches!(
            CsrfToken::decode(&encoded, SECRET),
            Err(CsrfError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(CsrfToken::decode("abc123", SECRET).is_err());
        assert!(CsrfToken::decode("", SECRET).is_err());
        assert!(CsrfToken::decode("!!!", SECRET).is_err());
    }
}
