//! Request kernel
//!
//! The kernel runs a [`MiddlewareChain`] in front of an application handler and
//! turns errors into responses. When an error page is registered, failures are
//! forwarded to it as a [`RequestKind::Sub`](crate::RequestKind) request that
//! travels through the same chain, so middleware can tell it apart from the
//! client's original request.

use crate::middleware::{HandlerFn, MiddlewareChain};
use crate::{Error, HttpRequest, HttpResponse};
use tracing::{debug, error, warn};

/// Attribute holding the status code of the error being rendered.
pub const ERROR_STATUS_ATTRIBUTE: &str = "_error_status";
/// Attribute holding the message of the error being rendered.
pub const ERROR_MESSAGE_ATTRIBUTE: &str = "_error_message";

struct ErrorPage {
    path: String,
    handler: HandlerFn,
}

/// Drives requests through middleware and a handler.
pub struct Kernel {
    chain: MiddlewareChain,
    handler: HandlerFn,
    error_page: Option<ErrorPage>,
}

impl Kernel {
    pub fn new(chain: MiddlewareChain, handler: HandlerFn) -> Self {
        Self {
            chain,
            handler,
            error_page: None,
        }
    }

    /// Render errors by forwarding an internal request to `path`.
    pub fn with_error_page(mut self, path: impl Into<String>, handler: HandlerFn) -> Self {
        self.error_page = Some(ErrorPage {
            path: path.into(),
            handler,
        });
        self
    }

    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Handle a request, always producing a response.
    pub async fn handle(&self, req: HttpRequest) -> HttpResponse {
        let original = self.error_page.as_ref().map(|_| req.clone());

        match self.chain.apply(req, self.handler.clone()).await {
            Ok(response) => response,
            Err(err) => self.render_error(err, original).await,
        }
    }

    async fn render_error(&self, err: Error, original: Option<HttpRequest>) -> HttpResponse {
        if err.is_server_error() {
            error!(error = %err, "Request failed");
        } else {
            warn!(status = err.status_code(), error = %err, "Request rejected");
        }

        let (Some(page), Some(original)) = (&self.error_page, original) else {
            return HttpResponse::from_error(&err);
        };

        let sub = original
            .sub_request(page.path.clone())
            .with_attribute(ERROR_STATUS_ATTRIBUTE, err.status_code().to_string())
            .with_attribute(ERROR_MESSAGE_ATTRIBUTE, err.message());

        debug!(path = %page.path, status = err.status_code(), "Forwarding to error page");

        match self.chain.apply(sub, page.handler.clone()).await {
            Ok(mut response) => {
                response.status = err.status_code();
                response
            }
            Err(page_err) => {
                error!(error = %page_err, "Error page failed");
                HttpResponse::from_error(&err)
            }
        }
    }
}
