//! Request interception
//!
//! [`intercept`] is the whole decision: internal sub-requests and requests
//! outside the protected routes pass untouched; everything else must present
//! a token the [`TokenValidator`] accepts, read either from the configured
//! header or from the configured cookie. The two sources are alternatives,
//! never combined: in header mode the cookie is not consulted.

use crate::error::BAD_TOKEN_MESSAGE;
use crate::manager::TokenValidator;
use crate::routing::{RouteMatcher, RouteSet};
use spa_csrf_core::{Error, HttpRequest};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Immutable, compiled protection settings
#[derive(Debug, Clone)]
pub struct ProtectionConfig {
    /// Routes that require a token
    pub routes: RouteSet,
    /// Routes exempt even when they match `routes`
    pub exclude: RouteSet,
    pub header_name: String,
    /// Read from the header when true, from the cookie otherwise
    pub header_enabled: bool,
    pub cookie_name: String,
}

impl ProtectionConfig {
    pub fn new(
        routes: RouteSet,
        header_name: impl Into<String>,
        header_enabled: bool,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            routes,
            exclude: RouteSet::empty(),
            header_name: header_name.into(),
            header_enabled,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn with_exclude(mut self, exclude: RouteSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// The client-supplied token, from whichever source is configured
    ///
    /// Header values lose surrounding whitespace, which is not part of a
    /// field value.
    pub fn candidate_token(&self, request: &HttpRequest) -> Option<String> {
        if self.header_enabled {
            request
                .header(&self.header_name)
                .map(|value| value.trim().to_string())
        } else {
            request.cookie(&self.cookie_name)
        }
    }
}

/// Result of checking one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Not a protected main request
    NotApplicable,
    /// Token present and accepted
    Valid,
    /// Token missing or refused
    Rejected,
}

impl ValidationOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Whether the request continues to the application
    pub fn is_allowed(&self) -> bool {
        !self.is_rejected()
    }

    /// Map a rejection to the 403 error the host renders
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Rejected => Err(Error::Forbidden(BAD_TOKEN_MESSAGE.to_string())),
            Self::NotApplicable | Self::Valid => Ok(()),
        }
    }
}

/// Candidates that never reach the validator: nothing at all, or `"0"`.
fn is_blank(token: &str) -> bool {
    token.is_empty() || token == "0"
}

/// Decide whether `request` may proceed.
pub fn intercept<M, V>(
    request: &HttpRequest,
    config: &ProtectionConfig,
    matcher: &M,
    validator: &V,
) -> ValidationOutcome
where
    M: RouteMatcher + ?Sized,
    V: TokenValidator + ?Sized,
{
    if !request.is_main_request() {
        trace!(path = %request.path, "Sub-request, skipping CSRF check");
        return ValidationOutcome::NotApplicable;
    }

    if !matcher.matches(request, &config.routes) {
        trace!(path = %request.path, "Route not protected");
        return ValidationOutcome::NotApplicable;
    }

    if !config.exclude.is_empty() && matcher.matches(request, &config.exclude) {
        debug!(path = %request.path, "Route excluded from CSRF protection");
        return ValidationOutcome::NotApplicable;
    }

    let source = if config.header_enabled { "header" } else { "cookie" };

    let token = match config.candidate_token(request) {
        Some(token) if !is_blank(&token) => token,
        _ => {
            warn!(
                method = %request.method,
                path = %request.path,
                source,
                reason = "missing",
                "CSRF token rejected"
            );
            return ValidationOutcome::Rejected;
        }
    };

    if !validator.is_token_valid(&token) {
        warn!(
            method = %request.method,
            path = %request.path,
            source,
            reason = "invalid",
            "CSRF token rejected"
        );
        return ValidationOutcome::Rejected;
    }

    trace!(path = %request.path, "CSRF token accepted");
    ValidationOutcome::Valid
}

/// [`intercept`] with its collaborators bound at construction time
#[derive(Clone)]
pub struct CsrfValidator {
    config: Arc<ProtectionConfig>,
    matcher: Arc<dyn RouteMatcher>,
    validator: Arc<dyn TokenValidator>,
}

impl CsrfValidator {
    pub fn new(
        config: ProtectionConfig,
        matcher: Arc<dyn RouteMatcher>,
        validator: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            matcher,
            validator,
        }
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    pub fn check(&self, request: &HttpRequest) -> ValidationOutcome {
        intercept(
            request,
            &self.config,
            self.matcher.as_ref(),
            self.validator.as_ref(),
        )
    }

    /// Check and map rejection to `Error::Forbidden("Bad CSRF token.")`
    pub fn validate(&self, request: &HttpRequest) -> Result<(), Error> {
        self.check(request).into_result()
    }
}

impl std::fmt::Debug for CsrfValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
