//! Integration tests for spa-csrf-guard

use spa_csrf_config::{ConfigManager, FileFormat};
use spa_csrf_core::kernel::ERROR_STATUS_ATTRIBUTE;
use spa_csrf_core::{HttpRequest, HttpResponse, Kernel, MiddlewareChain, handler};
use spa_csrf_guard::*;

fn app_config() -> CsrfConfig {
    CsrfConfig::new()
        .with_secret(&CsrfConfig::generate_secret())
        .with_secure_routes(vec![RouteRule::path("^/api").with_methods(["POST", "PUT", "DELETE"])])
        .with_exclude_routes(vec![RouteRule::path("^/api/login$")])
        .with_set_cookie_on(vec![RouteRule::path("^/$").with_methods(["GET"])])
}

fn kernel(csrf: CsrfMiddleware) -> Kernel {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(csrf);

    Kernel::new(
        chain,
        handler(|req| async move { Ok(HttpResponse::ok().with_body(req.path.into_bytes())) }),
    )
}

fn body(response: &HttpResponse) -> String {
    String::from_utf8_lossy(&response.body).to_string()
}

#[tokio::test]
async fn test_double_submit_round_trip() {
    let kernel = kernel(CsrfMiddleware::new(app_config()).unwrap());

    // Landing page hands out the token
    let landing = kernel.handle(HttpRequest::new("GET", "/")).await;
    assert_eq!(landing.status, 200);
    let cookie = landing.cookie("XSRF-TOKEN").expect("token cookie");
    assert_eq!(cookie.http_only(), Some(false));
    let token = cookie.value().to_string();

    // The SPA echoes it back
    let post = HttpRequest::new("POST", "/api/orders")
        .with_cookie("XSRF-TOKEN", token.clone())
        .with_header("X-XSRF-TOKEN", token);
    let response = kernel.handle(post).await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response), "/api/orders");
}

#[tokio::test]
async fn test_missing_header_is_forbidden() {
    let kernel = kernel(CsrfMiddleware::new(app_config()).unwrap());

    let response = kernel.handle(HttpRequest::new("POST", "/api/orders")).await;
    assert_eq!(response.status, 403);
    assert!(body(&response).contains("Bad CSRF token."));
}

#[tokio::test]
async fn test_forged_token_is_forbidden() {
    let kernel = kernel(CsrfMiddleware::new(app_config()).unwrap());

    // Issued under a different secret
    let foreign = CsrfMiddleware::new(app_config()).unwrap().token().unwrap();
    let req = HttpRequest::new("DELETE", "/api/orders/7").with_header("X-XSRF-TOKEN", foreign);

    let response = kernel.handle(req).await;
    assert_eq!(response.status, 403);
    assert!(body(&response).contains("Bad CSRF token."));
}

#[tokio::test]
async fn test_unprotected_requests_pass() {
    let kernel = kernel(CsrfMiddleware::new(app_config()).unwrap());

    for req in [
        HttpRequest::new("GET", "/api/orders"),
        HttpRequest::new("POST", "/public/info"),
        HttpRequest::new("POST", "/api/login"),
    ] {
        let response = kernel.handle(req).await;
        assert_eq!(response.status, 200);
        assert!(response.cookie("XSRF-TOKEN").is_none());
    }
}

#[tokio::test]
async fn test_cookie_mode() {
    let csrf = CsrfMiddleware::new(app_config().with_header_enabled(false)).unwrap();
    let token = csrf.token().unwrap();
    let kernel = kernel(csrf);

    let with_cookie = HttpRequest::new("POST", "/api/orders").with_cookie("XSRF-TOKEN", token.clone());
    assert_eq!(kernel.handle(with_cookie).await.status, 200);

    // Header alone is not consulted
    let header_only = HttpRequest::new("POST", "/api/orders").with_header("X-XSRF-TOKEN", token);
    assert_eq!(kernel.handle(header_only).await.status, 403);
}

#[tokio::test]
async fn test_error_page_sub_request_is_not_checked() {
    let mut chain = MiddlewareChain::new();
    chain.use_middleware(CsrfMiddleware::new(app_config()).unwrap());

    let kernel = Kernel::new(
        chain,
        handler(|_req| async { Ok(HttpResponse::ok()) }),
    )
    // The error page lives under a protected prefix and is reached by POST
    .with_error_page(
        "/api/error",
        handler(|req| async move {
            let status = req.attribute(ERROR_STATUS_ATTRIBUTE).unwrap_or("?").to_string();
            Ok(HttpResponse::ok().with_body(format!("error page {}", status).into_bytes()))
        }),
    );

    let response = kernel.handle(HttpRequest::new("POST", "/api/orders")).await;
    assert_eq!(response.status, 403);
    assert_eq!(body(&response), "error page 403");
}

#[tokio::test]
async fn test_custom_validator() {
    let csrf = CsrfMiddleware::builder(
        CsrfConfig::new()
            .with_header_name("X-CSRF-Token")
            .with_secure_routes(vec![RouteRule::path("^/api/")]),
    )
    .token_validator(|token: &str| token == "abc123")
    .build()
    .unwrap();
    let kernel = kernel(csrf);

    let good = HttpRequest::new("POST", "/api/orders").with_header("X-CSRF-Token", "abc123");
    let bad = HttpRequest::new("POST", "/api/orders").with_header("X-CSRF-Token", "wrong");

    assert_eq!(kernel.handle(good).await.status, 200);
    assert_eq!(kernel.handle(bad).await.status, 403);
}

#[test]
fn test_out_of_range_ttl_rejected_at_startup() {
    for ttl in [0, MAX_TOKEN_TTL + 1, i64::MAX / 2] {
        let config = app_config().with_token_ttl(ttl);
        assert!(matches!(CsrfMiddleware::new(config), Err(CsrfError::Config(_))));
    }

    let longest = CsrfMiddleware::new(app_config().with_token_ttl(MAX_TOKEN_TTL)).unwrap();
    assert!(longest.token().is_ok());
}

#[tokio::test]
async fn test_zero_and_padded_header_tokens() {
    let csrf = CsrfMiddleware::new(app_config()).unwrap();
    let token = csrf.token().unwrap();
    let kernel = kernel(csrf);

    let zero = HttpRequest::new("POST", "/api/orders").with_header("X-XSRF-TOKEN", "0");
    let response = kernel.handle(zero).await;
    assert_eq!(response.status, 403);
    assert!(body(&response).contains("Bad CSRF token."));

    let padded = HttpRequest::new("POST", "/api/orders").with_header("X-XSRF-TOKEN", format!(" {} ", token));
    assert_eq!(kernel.handle(padded).await.status, 200);
}

#[tokio::test]
async fn test_differently_cased_duplicate_header() {
    let csrf = CsrfMiddleware::new(app_config()).unwrap();
    let token = csrf.token().unwrap();
    let kernel = kernel(csrf);

    let req = HttpRequest::new("POST", "/api/orders")
        .with_header("x-xsrf-token", "forged")
        .with_header("X-XSRF-TOKEN", token);
    assert_eq!(kernel.handle(req).await.status, 200);
}

#[test]
fn test_config_from_layered_sources() {
    let manager = ConfigManager::new();
    manager
        .load_str(
            r#"
            [csrf]
            token_ttl = 600

            [[csrf.secure]]
            path = "^/api"

            [[csrf.cookie.set_on]]
            path = "^/$"
            "#,
            FileFormat::Toml,
        )
        .unwrap();
    manager.set("csrf.token_id", serde_json::json!("admin"));

    let config = CsrfConfig::load(&manager, "csrf").unwrap();
    assert_eq!(config.token_id, "admin");
    assert_eq!(config.token_ttl, 600);

    let csrf = CsrfMiddleware::new(config).unwrap();
    let token = csrf.token().unwrap();
    let req = HttpRequest::new("PATCH", "/api/orders").with_header("X-XSRF-TOKEN", token);
    assert_eq!(csrf.check(&req), ValidationOutcome::Valid);
}

#[test]
fn test_tokens_bound_to_token_id() {
    let secret = CsrfConfig::generate_secret();
    let angular = TokenManager::new(secret.clone(), "angular").unwrap();
    let admin = TokenManager::new(secret, "admin").unwrap();

    let token = angular.get_token().unwrap();
    assert!(angular.is_token_valid(&token));
    assert!(!admin.is_token_valid(&token));
}
