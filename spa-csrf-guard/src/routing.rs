//! Route rules and matching
//!
//! A [`RouteRule`] names up to four criteria: a path regex, a route name, a
//! host regex and a list of methods. A rule matches a request when every
//! criterion it sets matches; a [`RouteSet`] matches when any of its rules
//! does. Path regexes are unanchored and run against the percent-decoded
//! path, so `^/api` protects `/api/users` and `/%61pi/users` alike.

use crate::error::{CsrfError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use spa_csrf_core::HttpRequest;
use std::borrow::Cow;

/// Route rule as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRule {
    /// Regex over the request path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Exact route name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Regex over the request host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Allowed methods, any when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

impl RouteRule {
    /// Rule matching paths against the regex `pattern`
    ///
    /// The pattern is a regex, not a glob, and it is not anchored: `/api`
    /// also matches `/v2/api_keys`, and in `/api/*` the `*` repeats the slash.
    /// Anchor it (`^/api/`) to protect a prefix.
    pub fn path(pattern: impl Into<String>) -> Self {
        Self {
            path: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Rule matching a named route
    pub fn route(name: impl Into<String>) -> Self {
        Self {
            route: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, pattern: impl Into<String>) -> Self {
        self.host = Some(pattern.into());
        self
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }
}

/// A rule with its regexes compiled
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    rule: RouteRule,
    path: Option<Regex>,
    host: Option<Regex>,
    methods: Vec<String>,
}

impl CompiledRoute {
    pub fn compile(rule: RouteRule) -> Result<Self> {
        let path = rule.path.as_deref().map(compile_pattern).transpose()?;
        let host = rule.host.as_deref().map(compile_pattern).transpose()?;
        let methods = rule.methods.iter().map(|m| m.to_uppercase()).collect();

        Ok(Self {
            rule,
            path,
            host,
            methods,
        })
    }

    pub fn rule(&self) -> &RouteRule {
        &self.rule
    }

    pub fn matches(&self, request: &HttpRequest) -> bool {
        if let Some(path) = &self.path {
            if !path.is_match(&decode_path(&request.path)) {
                return false;
            }
        }

        if let Some(route) = &self.rule.route {
            if request.route.as_deref() != Some(route.as_str()) {
                return false;
            }
        }

        if let Some(host) = &self.host {
            match request.host.as_deref() {
                Some(request_host) if host.is_match(request_host) => {}
                _ => return false,
            }
        }

        if !self.methods.is_empty() {
            let method = request.method.to_uppercase();
            if !self.methods.iter().any(|m| *m == method) {
                return false;
            }
        }

        true
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| CsrfError::config(format!("Invalid route pattern '{}': {}", pattern, e)))
}

fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

/// Compiled collection of route rules
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    routes: Vec<CompiledRoute>,
}

impl RouteSet {
    pub fn compile(rules: &[RouteRule]) -> Result<Self> {
        let routes = rules
            .iter()
            .cloned()
            .map(CompiledRoute::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { routes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }
}

/// Decides whether a request falls under a set of routes.
pub trait RouteMatcher: Send + Sync {
    fn matches(&self, request: &HttpRequest, routes: &RouteSet) -> bool;
}

/// Matches when any compiled rule in the set matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRouteMatcher;

impl RouteMatcher for PatternRouteMatcher {
    fn matches(&self, request: &HttpRequest, routes: &RouteSet) -> bool {
        routes.iter().any(|route| route.matches(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(rules: Vec<RouteRule>) -> RouteSet {
        RouteSet::compile(&rules).unwrap()
    }

    #[test]
    fn test_path_rule() {
        let routes = set(vec![RouteRule::path("^/api")]);
        let matcher = PatternRouteMatcher;

        assert!(matcher.matches(&HttpRequest::new("POST", "/api/users"), &routes));
        assert!(!matcher.matches(&HttpRequest::new("POST", "/public/info"), &routes));
    }

    #[test]
    fn test_anchored_prefix() {
        let routes = set(vec![RouteRule::path("^/api/")]);
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/api/users"), &routes));
        assert!(!PatternRouteMatcher.matches(&HttpRequest::new("POST", "/public/info"), &routes));
        assert!(!PatternRouteMatcher.matches(&HttpRequest::new("POST", "/x/api/users"), &routes));
    }

    #[test]
    fn test_unanchored_pattern_matches_anywhere() {
        let routes = set(vec![RouteRule::path("/api/*")]);
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/api/users"), &routes));
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/v2/api_keys"), &routes));
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/x/api"), &routes));
    }

    #[test]
    fn test_path_is_decoded_before_matching() {
        let routes = set(vec![RouteRule::path("^/api")]);
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/%61pi/users"), &routes));
    }

    #[test]
    fn test_methods_are_case_insensitive() {
        let routes = set(vec![RouteRule::path("^/api").with_methods(["post", "PUT"])]);

        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/api/x"), &routes));
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("put", "/api/x"), &routes));
        assert!(!PatternRouteMatcher.matches(&HttpRequest::new("GET", "/api/x"), &routes));
    }

    #[test]
    fn test_route_name_rule() {
        let routes = set(vec![RouteRule::route("order_create")]);

        let named = HttpRequest::new("POST", "/orders").with_route("order_create");
        let other = HttpRequest::new("POST", "/orders").with_route("order_list");
        let unnamed = HttpRequest::new("POST", "/orders");

        assert!(PatternRouteMatcher.matches(&named, &routes));
        assert!(!PatternRouteMatcher.matches(&other, &routes));
        assert!(!PatternRouteMatcher.matches(&unnamed, &routes));
    }

    #[test]
    fn test_host_rule_requires_host() {
        let routes = set(vec![RouteRule::path("^/").with_host(r"^admin\.example\.com$")]);

        let admin = HttpRequest::new("POST", "/").with_host("admin.example.com");
        let www = HttpRequest::new("POST", "/").with_host("www.example.com");
        let none = HttpRequest::new("POST", "/");

        assert!(PatternRouteMatcher.matches(&admin, &routes));
        assert!(!PatternRouteMatcher.matches(&www, &routes));
        assert!(!PatternRouteMatcher.matches(&none, &routes));
    }

    #[test]
    fn test_any_rule_matches() {
        let routes = set(vec![RouteRule::path("^/api"), RouteRule::path("^/admin")]);
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("POST", "/admin/x"), &routes));
    }

    #[test]
    fn test_empty_set_never_matches() {
        assert!(!PatternRouteMatcher.matches(&HttpRequest::new("POST", "/"), &RouteSet::empty()));
    }

    #[test]
    fn test_empty_rule_matches_everything() {
        let routes = set(vec![RouteRule::default()]);
        assert!(PatternRouteMatcher.matches(&HttpRequest::new("DELETE", "/anything"), &routes));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let result = RouteSet::compile(&[RouteRule::path("^/api(")]);
        assert!(matches!(result, Err(CsrfError::Config(_))));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: RouteRule = serde_json::from_str(r#"{"path": "^/api"}"#).unwrap();
        assert_eq!(rule, RouteRule::path("^/api"));
    }
}
