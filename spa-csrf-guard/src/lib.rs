//! # spa-csrf guard
//!
//! Double-submit CSRF protection for single-page applications.
//!
//! ## Features
//!
//! - ✅ **Double-submit cookie** - The SPA reads `XSRF-TOKEN` and echoes it in `X-XSRF-TOKEN`
//! - ✅ **Signed Tokens** - HMAC-SHA256 signed, expiring tokens bound to a token id
//! - ✅ **Route rules** - Protect, exclude and set cookies by path, route name, host and method
//! - ✅ **Sub-request aware** - Internal forwards such as error pages are never checked
//! - ✅ **Pluggable** - Bring your own token validator or route matcher
//!
//! ## Quick Start
//!
//! ```rust
//! use spa_csrf_guard::{CsrfConfig, CsrfMiddleware, RouteRule};
//!
//! let config = CsrfConfig::new()
//!     .with_secret(&CsrfConfig::generate_secret())
//!     .with_secure_routes(vec![RouteRule::path("^/api").with_methods(["POST", "PUT", "DELETE"])])
//!     .with_set_cookie_on(vec![RouteRule::path("^/$").with_methods(["GET"])]);
//!
//! let csrf = CsrfMiddleware::new(config).unwrap();
//! ```
//!
//! ## Checking a request
//!
//! ```rust
//! use spa_csrf_core::HttpRequest;
//! use spa_csrf_guard::{CsrfConfig, CsrfMiddleware, RouteRule, ValidationOutcome};
//!
//! let csrf = CsrfMiddleware::new(
//!     CsrfConfig::new().with_secure_routes(vec![RouteRule::path("^/api")]),
//! )
//! .unwrap();
//!
//! let token = csrf.token().unwrap();
//!
//! let good = HttpRequest::new("POST", "/api/orders").with_header("X-XSRF-TOKEN", token);
//! let bad = HttpRequest::new("POST", "/api/orders");
//! let public = HttpRequest::new("POST", "/public/info");
//!
//! assert_eq!(csrf.check(&good), ValidationOutcome::Valid);
//! assert_eq!(csrf.check(&bad), ValidationOutcome::Rejected);
//! assert_eq!(csrf.check(&public), ValidationOutcome::NotApplicable);
//! ```
//!
//! ## Custom validation
//!
//! ```rust
//! use spa_csrf_core::HttpRequest;
//! use spa_csrf_guard::{CsrfConfig, CsrfMiddleware, RouteRule};
//!
//! let csrf = CsrfMiddleware::builder(
//!     CsrfConfig::new().with_secure_routes(vec![RouteRule::path("^/api")]),
//! )
//! .token_validator(|token: &str| token == "abc123")
//! .build()
//! .unwrap();
//!
//! let req = HttpRequest::new("POST", "/api/orders").with_header("X-XSRF-TOKEN", "abc123");
//! assert!(csrf.validate(&req).is_ok());
//! ```

pub mod config;
pub mod error;
pub mod interceptor;
pub mod issuer;
pub mod manager;
pub mod middleware;
pub mod routing;
pub mod token;

pub use config::{CookieConfig, CsrfConfig, HeaderConfig, SameSite};
pub use error::{BAD_TOKEN_MESSAGE, CsrfError, Result};
pub use interceptor::{CsrfValidator, ProtectionConfig, ValidationOutcome, intercept};
pub use issuer::CookieIssuer;
pub use manager::{MIN_SECRET_LEN, TokenIssuer, TokenManager, TokenValidator};
pub use middleware::{CsrfMiddleware, CsrfMiddlewareBuilder};
pub use routing::{CompiledRoute, PatternRouteMatcher, RouteMatcher, RouteRule, RouteSet};
pub use token::{CsrfToken, MAX_TOKEN_TTL};
