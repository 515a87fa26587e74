//! # spa-csrf core
//!
//! The host-side pieces the CSRF guard plugs into: a request/response model
//! that knows whether a request is a client's main request or an internal
//! sub-request, an async middleware chain, a kernel that renders errors, and
//! `tracing` subscriber setup.
//!
//! ```
//! use spa_csrf_core::{HttpRequest, RequestKind};
//!
//! let req = HttpRequest::new("POST", "/api/orders")
//!     .with_header("X-XSRF-TOKEN", "abc")
//!     .with_cookie("XSRF-TOKEN", "abc");
//!
//! assert_eq!(req.kind, RequestKind::Main);
//! assert_eq!(req.header("x-xsrf-token"), Some("abc"));
//! assert_eq!(req.cookie("XSRF-TOKEN").as_deref(), Some("abc"));
//! assert!(!req.sub_request("/_error").is_main_request());
//! ```

pub mod error;
pub mod http;
pub mod kernel;
pub mod logging;
pub mod middleware;

pub use error::{Error, Result};
pub use http::{HttpRequest, HttpResponse, RequestKind};
pub use kernel::Kernel;
pub use middleware::{HandlerFn, Middleware, MiddlewareChain, Next, handler};

pub use async_trait::async_trait;
pub use cookie;
