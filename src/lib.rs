// spa-csrf - Double-submit CSRF protection for single-page applications
//
// The SPA reads the token from a cookie and echoes it in a request header;
// protected routes reject main requests whose echoed token does not validate.

// Re-export core functionality
pub use spa_csrf_core::*;

// Re-export the guard
pub use spa_csrf_guard;

// Re-export optional crates
#[cfg(feature = "config")]
pub use spa_csrf_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Error,
        HandlerFn,
        HttpRequest,
        HttpResponse,
        Kernel,
        Middleware,
        MiddlewareChain,
        Next,
        RequestKind,
        handler,
    };

    pub use spa_csrf_guard::{
        BAD_TOKEN_MESSAGE,
        CsrfConfig,
        CsrfError,
        CsrfMiddleware,
        PatternRouteMatcher,
        RouteMatcher,
        RouteRule,
        SameSite,
        TokenIssuer,
        TokenManager,
        TokenValidator,
        ValidationOutcome,
    };

    #[cfg(feature = "config")]
    pub use spa_csrf_config::{ConfigManager, FileFormat};

    pub use async_trait::async_trait;
}
