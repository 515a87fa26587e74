// HTTP request and response types

use cookie::Cookie;
use serde::Serialize;
use std::collections::HashMap;

/// Where a request came from.
///
/// `Main` requests originate from a client. `Sub` requests are produced by the
/// host while it is already processing a main request, for example when a
/// failure is forwarded to an error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestKind {
    #[default]
    Main,
    Sub,
}

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub kind: RequestKind,
    pub method: String,
    pub path: String,
    pub host: Option<String>,
    /// Name of the route the router resolved for this request, if any.
    pub route: Option<String>,
    pub headers: HashMap<String, String>,
    /// Values attached by the host while processing, never sent by clients.
    pub attributes: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Main,
            method: method.into(),
            path: path.into(),
            host: None,
            route: None,
            headers: HashMap::new(),
            attributes: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a cookie to the `Cookie` header, percent-encoding the value.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value): (String, String) = (name.into(), value.into());
        let pair = Cookie::new(name, value).encoded().to_string();
        let existing = self
            .headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case("cookie"))
            .cloned();

        match existing {
            Some(key) => {
                if let Some(header) = self.headers.get_mut(&key) {
                    header.push_str("; ");
                    header.push_str(&pair);
                }
            }
            None => {
                self.headers.insert("Cookie".to_string(), pair);
            }
        }
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_main_request(&self) -> bool {
        self.kind == RequestKind::Main
    }

    /// Get a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// All cookies sent with the request, decoded.
    ///
    /// When a name is repeated the first occurrence wins.
    pub fn cookies(&self) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        let Some(raw) = self.header("cookie") else {
            return cookies;
        };

        for cookie in Cookie::split_parse_encoded(raw).filter_map(|c| c.ok()) {
            cookies
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value().to_string());
        }
        cookies
    }

    /// Get a single cookie value by name
    pub fn cookie(&self, name: &str) -> Option<String> {
        let raw = self.header("cookie")?;
        Cookie::split_parse_encoded(raw)
            .filter_map(|c| c.ok())
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    /// Build an internal request for `path` that carries this request's
    /// headers and host.
    pub fn sub_request(&self, path: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Sub,
            method: "GET".to_string(),
            path: path.into(),
            host: self.host.clone(),
            route: None,
            headers: self.headers.clone(),
            attributes: HashMap::new(),
            body: Vec::new(),
        }
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Serialized `Set-Cookie` values, one per cookie.
    pub set_cookies: Vec<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            set_cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn no_content() -> Self {
        Self::new(204)
    }

    pub fn forbidden() -> Self {
        Self::new(403)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    /// Render an error as a JSON `{"error": message}` response.
    pub fn from_error(err: &crate::Error) -> Self {
        let body = serde_json::json!({ "error": err.message() });
        Self::new(err.status_code())
            .with_json(&body)
            .unwrap_or_else(|_| Self::new(err.status_code()))
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, crate::Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a `Set-Cookie` header.
    pub fn add_cookie(&mut self, cookie: &Cookie<'_>) {
        self.set_cookies.push(cookie.encoded().to_string());
    }

    /// Find a cookie set on this response by name.
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.set_cookies
            .iter()
            .filter_map(|raw| Cookie::parse_encoded(raw.clone()).ok())
            .find(|c| c.name() == name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
