//! Token cookie issuance
//!
//! The SPA can only echo a token it can read, so the cookie is never
//! `HttpOnly`. It is attached to main-request responses on the `set_on`
//! routes.

use crate::config::CookieConfig;
use crate::error::Result;
use crate::manager::TokenIssuer;
use crate::routing::{RouteMatcher, RouteSet};
use cookie::Cookie;
use spa_csrf_core::{HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::debug;

/// Sets the token cookie on configured routes
#[derive(Clone)]
pub struct CookieIssuer {
    settings: CookieConfig,
    set_on: RouteSet,
    tokens: Arc<dyn TokenIssuer>,
    matcher: Arc<dyn RouteMatcher>,
}

impl CookieIssuer {
    pub fn new(
        settings: CookieConfig,
        tokens: Arc<dyn TokenIssuer>,
        matcher: Arc<dyn RouteMatcher>,
    ) -> Result<Self> {
        let set_on = RouteSet::compile(&settings.set_on)?;
        Ok(Self {
            settings,
            set_on,
            tokens,
            matcher,
        })
    }

    pub fn settings(&self) -> &CookieConfig {
        &self.settings
    }

    /// Whether the response to `request` should carry a token cookie
    pub fn applies_to(&self, request: &HttpRequest) -> bool {
        request.is_main_request()
            && !self.set_on.is_empty()
            && self.matcher.matches(request, &self.set_on)
    }

    pub fn issue_token(&self) -> Result<String> {
        self.tokens.issue_token()
    }

    pub fn build_cookie(&self, token: impl Into<String>) -> Cookie<'static> {
        let mut builder = Cookie::build((self.settings.name.clone(), token.into()))
            .path(self.settings.path.clone())
            .secure(self.settings.secure)
            .http_only(false)
            .same_site(self.settings.same_site.into());

        if let Some(domain) = &self.settings.domain {
            builder = builder.domain(domain.clone());
        }

        // 0 leaves a session cookie
        if self.settings.expire > 0 {
            builder = builder.max_age(cookie::time::Duration::seconds(self.settings.expire));
        }

        builder.build()
    }

    /// Issue a fresh token and add its cookie to `response`
    pub fn attach(&self, response: &mut HttpResponse) -> Result<()> {
        let token = self.issue_token()?;
        response.add_cookie(&self.build_cookie(token));
        debug!(cookie = %self.settings.name, "CSRF token cookie set");
        Ok(())
    }
}

impl std::fmt::Debug for CookieIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieIssuer")
            .field("settings", &self.settings)
            .field("set_on", &self.set_on.len())
            .finish()
    }
}
