use async_trait::async_trait;
use crate::config::CsrfConfig;
use crate::error::{CsrfError, Result};
use crate::interceptor::{CsrfValidator, ValidationOutcome};
use crate::issuer::CookieIssuer;
use crate::manager::{TokenIssuer, TokenManager, TokenValidator};
use crate::routing::{PatternRouteMatcher, RouteMatcher};
use spa_csrf_config::Validate;
use spa_csrf_core::{Error, HttpRequest, HttpResponse, Middleware, Next};
use std::sync::Arc;
use tracing::{info, warn};

/// CSRF protection middleware
///
/// Rejects protected main requests that do not carry a valid token and sets
/// the token cookie on the configured routes.
#[derive(Clone)]
pub struct CsrfMiddleware {
    validator: CsrfValidator,
    cookies: Option<CookieIssuer>,
    tokens: Option<Arc<dyn TokenIssuer>>,
}

impl CsrfMiddleware {
    /// Create middleware backed by a [`TokenManager`] and pattern route matching
    pub fn new(config: CsrfConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start a builder for swapping in custom collaborators
    pub fn builder(config: CsrfConfig) -> CsrfMiddlewareBuilder {
        CsrfMiddlewareBuilder::new(config)
    }

    /// Issue a token for the client, if an issuer is available
    pub fn token(&self) -> Result<String> {
        self.tokens
            .as_ref()
            .ok_or_else(|| CsrfError::config("no token issuer configured"))?
            .issue_token()
    }

    pub fn check(&self, request: &HttpRequest) -> ValidationOutcome {
        self.validator.check(request)
    }

    pub fn validate(&self, request: &HttpRequest) -> std::result::Result<(), Error> {
        self.validator.validate(request)
    }

    pub fn cookie_issuer(&self) -> Option<&CookieIssuer> {
        self.cookies.as_ref()
    }
}

#[async_trait]
impl Middleware for CsrfMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> std::result::Result<HttpResponse, Error> {
        self.validate(&req)?;

        let issuer = self.cookies.as_ref().filter(|issuer| issuer.applies_to(&req));

        let mut response = next(req).await?;

        if let Some(issuer) = issuer {
            if let Err(err) = issuer.attach(&mut response) {
                warn!(
                    cookie = %issuer.settings().name,
                    error = %err,
                    "Failed to set CSRF token cookie"
                );
            }
        }

        Ok(response)
    }
}

impl std::fmt::Debug for CsrfMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfMiddleware")
            .field("validator", &self.validator)
            .field("cookies", &self.cookies)
            .field("issues_tokens", &self.tokens.is_some())
            .finish()
    }
}

/// Builder for [`CsrfMiddleware`]
pub struct CsrfMiddlewareBuilder {
    config: CsrfConfig,
    matcher: Option<Arc<dyn RouteMatcher>>,
    validator: Option<Arc<dyn TokenValidator>>,
    issuer: Option<Arc<dyn TokenIssuer>>,
}

impl CsrfMiddlewareBuilder {
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config,
            matcher: None,
            validator: None,
            issuer: None,
        }
    }

    pub fn route_matcher<M: RouteMatcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    pub fn token_validator<V: TokenValidator + 'static>(mut self, validator: V) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn token_issuer<I: TokenIssuer + 'static>(mut self, issuer: I) -> Self {
        self.issuer = Some(Arc::new(issuer));
        self
    }

    /// Use one manager for both validation and issuance
    pub fn token_manager<T>(mut self, manager: Arc<T>) -> Self
    where
        T: TokenValidator + TokenIssuer + 'static,
    {
        self.validator = Some(manager.clone());
        self.issuer = Some(manager);
        self
    }

    pub fn build(self) -> Result<CsrfMiddleware> {
        self.config.validate()?;

        let matcher = self
            .matcher
            .unwrap_or_else(|| Arc::new(PatternRouteMatcher) as Arc<dyn RouteMatcher>);

        let (validator, issuer): (Arc<dyn TokenValidator>, Option<Arc<dyn TokenIssuer>>) =
            match (self.validator, self.issuer) {
                (Some(validator), issuer) => (validator, issuer),
                (None, issuer) => {
                    let manager = Arc::new(default_manager(&self.config)?);
                    let issuer = issuer.unwrap_or_else(|| manager.clone() as Arc<dyn TokenIssuer>);
                    (manager as Arc<dyn TokenValidator>, Some(issuer))
                }
            };

        let cookies = if self.config.cookie.set_on.is_empty() {
            None
        } else {
            let tokens = issuer.clone().ok_or_else(|| {
                CsrfError::config("cookie.set_on requires a token issuer alongside a custom validator")
            })?;
            Some(CookieIssuer::new(
                self.config.cookie.clone(),
                tokens,
                matcher.clone(),
            )?)
        };

        let protection = self.config.protection()?;

        info!(
            protected_routes = protection.routes.len(),
            excluded_routes = protection.exclude.len(),
            source = if protection.header_enabled { "header" } else { "cookie" },
            header = %protection.header_name,
            cookie = %protection.cookie_name,
            sets_cookie = cookies.is_some(),
            "CSRF protection enabled"
        );

        Ok(CsrfMiddleware {
            validator: CsrfValidator::new(protection, matcher, validator),
            cookies,
            tokens: issuer,
        })
    }
}

fn default_manager(config: &CsrfConfig) -> Result<TokenManager> {
    let secret = match config.secret_bytes()? {
        Some(secret) => secret,
        None => {
            warn!("No CSRF secret configured, tokens will not survive a restart");
            CsrfConfig::generate_secret()
        }
    };

    TokenManager::new(secret, config.token_id.clone())?.with_ttl(config.token_ttl)
}
