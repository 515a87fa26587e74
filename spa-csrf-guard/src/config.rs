use crate::error::{CsrfError, Result};
use crate::interceptor::ProtectionConfig;
use crate::manager::MIN_SECRET_LEN;
use crate::token::MAX_TOKEN_TTL;
use crate::routing::{RouteRule, RouteSet};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use spa_csrf_config::{ConfigManager, ConfigValidator, Validate};

/// CSRF protection configuration
///
/// Defaults follow the AngularJS `$http` convention: the token travels in the
/// `XSRF-TOKEN` cookie and is echoed back in the `X-XSRF-TOKEN` header.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Identifier tokens are bound to
    pub token_id: String,

    /// Token time-to-live in seconds, at most ten years
    pub token_ttl: i64,

    /// Base64 signing secret (at least 32 bytes decoded). A random secret is
    /// generated per process when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    pub header: HeaderConfig,

    pub cookie: CookieConfig,

    /// Routes whose requests must carry a valid token
    pub secure: Vec<RouteRule>,

    /// Routes carved out of `secure`
    pub exclude: Vec<RouteRule>,
}

/// Where clients send the token back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Header name for CSRF token
    pub name: String,

    /// Read the token from the header (true) or from the cookie (false)
    pub enabled: bool,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            name: "X-XSRF-TOKEN".to_string(),
            enabled: true,
        }
    }
}

/// The cookie the token is handed out in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name for CSRF token
    pub name: String,

    /// Lifetime in seconds, 0 for a session cookie
    pub expire: i64,

    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// HTTPS only
    pub secure: bool,

    pub same_site: SameSite,

    /// Routes whose responses carry a fresh token cookie
    pub set_on: Vec<RouteRule>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "XSRF-TOKEN".to_string(),
            expire: 0,
            path: "/".to_string(),
            domain: None,
            secure: false,
            same_site: SameSite::Lax,
            set_on: Vec::new(),
        }
    }
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

impl CsrfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `section` of a layered configuration and validate it
    pub fn load(manager: &ConfigManager, section: &str) -> Result<Self> {
        let config: CsrfConfig = manager.extract(section)?;
        config.validate()?;
        Ok(config)
    }

    /// Generate a secret key
    pub fn generate_secret() -> Vec<u8> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..MIN_SECRET_LEN).map(|_| rng.r#gen()).collect()
    }

    /// Decoded signing secret, if one is configured
    pub fn secret_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.secret
            .as_deref()
            .map(|s| {
                STANDARD
                    .decode(s.trim())
                    .map_err(|e| CsrfError::config(format!("secret is not valid base64: {}", e)))
            })
            .transpose()
    }

    /// Compile the request-time view of this configuration
    pub fn protection(&self) -> Result<ProtectionConfig> {
        Ok(ProtectionConfig::new(
            RouteSet::compile(&self.secure)?,
            self.header.name.clone(),
            self.header.enabled,
            self.cookie.name.clone(),
        )
        .with_exclude(RouteSet::compile(&self.exclude)?))
    }

    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = token_id.into();
        self
    }

    /// Set token TTL
    pub fn with_token_ttl(mut self, ttl_seconds: i64) -> Self {
        self.token_ttl = ttl_seconds;
        self
    }

    /// Set the raw signing secret
    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(STANDARD.encode(secret));
        self
    }

    /// Set header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header.name = name.into();
        self
    }

    /// Read tokens from the header (true) or the cookie (false)
    pub fn with_header_enabled(mut self, enabled: bool) -> Self {
        self.header.enabled = enabled;
        self
    }

    /// Set cookie name
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie.name = name.into();
        self
    }

    /// Set cookie lifetime in seconds, 0 for a session cookie
    pub fn with_cookie_expire(mut self, seconds: i64) -> Self {
        self.cookie.expire = seconds;
        self
    }

    /// Set cookie domain
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set cookie path
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie.path = path.into();
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Set cookie SameSite policy
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = same_site;
        self
    }

    /// Routes whose responses set the token cookie
    pub fn with_set_cookie_on(mut self, routes: Vec<RouteRule>) -> Self {
        self.cookie.set_on = routes;
        self
    }

    /// Routes that require a valid token
    pub fn with_secure_routes(mut self, routes: Vec<RouteRule>) -> Self {
        self.secure = routes;
        self
    }

    /// Routes exempt from validation even when listed in `secure`
    pub fn with_exclude_routes(mut self, routes: Vec<RouteRule>) -> Self {
        self.exclude = routes;
        self
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_id: "angular".to_string(),
            token_ttl: 3600,
            secret: None,
            header: HeaderConfig::default(),
            cookie: CookieConfig::default(),
            secure: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl std::fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("token_id", &self.token_id)
            .field("token_ttl", &self.token_ttl)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("header", &self.header)
            .field("cookie", &self.cookie)
            .field("secure", &self.secure)
            .field("exclude", &self.exclude)
            .finish()
    }
}

impl Validate for CsrfConfig {
    fn validate(&self) -> spa_csrf_config::Result<()> {
        ConfigValidator::not_empty(&self.token_id, "token_id")?;
        ConfigValidator::in_range(self.token_ttl, 1, MAX_TOKEN_TTL, "token_ttl")?;
        ConfigValidator::is_token(&self.header.name, "header.name")?;
        ConfigValidator::is_token(&self.cookie.name, "cookie.name")?;
        ConfigValidator::in_range(self.cookie.expire, 0, i64::MAX, "cookie.expire")?;
        ConfigValidator::not_empty(&self.cookie.path, "cookie.path")?;

        if let Some(secret) = self
            .secret_bytes()
            .map_err(|e| spa_csrf_config::ConfigError::validation(e.to_string()))?
        {
            ConfigValidator::min_len(&secret, MIN_SECRET_LEN, "secret")?;
        }

        for (field, rules) in [
            ("secure", &self.secure),
            ("exclude", &self.exclude),
            ("cookie.set_on", &self.cookie.set_on),
        ] {
            RouteSet::compile(rules).map_err(|e| {
                spa_csrf_config::ConfigError::validation(format!("{}: {}", field, e))
            })?;
        }

        Ok(())
    }
}
