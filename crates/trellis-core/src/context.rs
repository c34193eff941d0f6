//! Request-scoped context threaded through every middleware

use crate::{Body, Error, Params, Result};
use bytes::Bytes;
use http::{header::HeaderName, request::Parts, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use std::collections::HashMap;
use uuid::Uuid;

/// Context attached to each request
#[derive(Debug)]
pub struct Context {
    /// Unique request ID for tracing
    pub request_id: String,

    /// Request method
    pub method: Method,

    /// Request URI
    pub uri: Uri,

    /// Request headers
    pub headers: HeaderMap,

    /// Buffered request body
    pub request_body: Bytes,

    /// Route parameters extracted from path
    pub params: Params,

    /// Matched route metadata
    pub route: Option<RouteInfo>,

    /// Custom state that middleware can attach
    pub state: HashMap<String, serde_json::Value>,

    /// Response under construction
    pub response: ResponseState,
}

impl Context {
    /// Create a new context for a method and URI
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method,
            uri,
            headers: HeaderMap::new(),
            request_body: Bytes::new(),
            params: Params::new(),
            route: None,
            state: HashMap::new(),
            response: ResponseState::default(),
        }
    }

    /// Create a context from decomposed request parts and a buffered body
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        let mut ctx = Self::new(parts.method, parts.uri);
        ctx.headers = parts.headers;
        ctx.request_body = body;
        ctx
    }

    /// Request path without the query string
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get a request header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a path parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// Set a path parameter
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key, value);
    }

    /// Get state value
    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Set state value
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    /// Response body, if one has been produced
    pub fn body(&self) -> Option<&Body> {
        self.response.body.as_ref()
    }

    /// Set the response body
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.response.body = Some(body.into());
    }

    /// Whether a response body has been produced
    pub fn has_body(&self) -> bool {
        self.response.body.is_some()
    }

    /// Response status, if set explicitly
    pub fn status(&self) -> Option<StatusCode> {
        self.response.status
    }

    /// Set the response status
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.status = Some(status);
    }

    /// Set a response header, ignoring invalid names or values
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.response.headers.insert(name, value);
            }
            _ => tracing::debug!(header = %name, "Ignoring invalid response header"),
        }
    }

    /// Fail with a 400 unless `condition` holds
    pub fn assert(&self, condition: bool, message: impl Into<String>) -> Result<()> {
        self.assert_status(condition, StatusCode::BAD_REQUEST, message)
    }

    /// Fail with `status` unless `condition` holds
    pub fn assert_status(
        &self,
        condition: bool,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(Error::status(status, message))
        }
    }

    /// Fail unconditionally with `status`
    pub fn throw<T>(&self, status: StatusCode, message: impl Into<String>) -> Result<T> {
        Err(Error::status(status, message))
    }
}

/// Response state accumulated while the chain runs
#[derive(Debug)]
pub struct ResponseState {
    /// Explicit status, if any
    pub status: Option<StatusCode>,

    /// Response headers
    pub headers: HeaderMap,

    /// Body produced by the action or a middleware
    pub body: Option<Body>,

    /// Set by the transport once headers have been written
    pub headers_sent: bool,

    /// Cleared by the transport when the peer has gone away
    pub writable: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: None,
            headers_sent: false,
            writable: true,
        }
    }
}

/// Route information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Route path pattern
    pub pattern: String,

    /// HTTP methods served by the route
    pub methods: Vec<Method>,

    /// Handler display name (`controller#action` or `<callable>`)
    pub handler: String,

    /// Portion of the path consumed by the pattern
    pub matched_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults() {
        let ctx = Context::new(Method::GET, Uri::from_static("/posts/1?draft=true"));
        assert!(!ctx.request_id.is_empty());
        assert_eq!(ctx.path(), "/posts/1");
        assert_eq!(ctx.query(), Some("draft=true"));
        assert!(ctx.response.writable);
        assert!(!ctx.response.headers_sent);
        assert!(!ctx.has_body());
    }

    #[test]
    fn test_from_parts() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/posts")
            .header("accept", "application/json")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let ctx = Context::from_parts(parts, Bytes::from_static(b"{}"));
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.header("accept"), Some("application/json"));
        assert_eq!(ctx.request_body, Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_params_and_body() {
        let mut ctx = Context::new(Method::GET, Uri::from_static("/"));
        ctx.set_param("post", "42");
        assert_eq!(ctx.param("post"), Some("42"));

        ctx.set_body("hello");
        assert!(matches!(ctx.body(), Some(Body::Text(text)) if text == "hello"));
    }

    #[test]
    fn test_assert() {
        let ctx = Context::new(Method::GET, Uri::from_static("/"));
        assert!(ctx.assert(true, "fine").is_ok());

        let err = ctx.assert(false, "title is required").unwrap_err();
        assert_eq!(err.to_status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "title is required");

        let err = ctx
            .assert_status(false, StatusCode::FORBIDDEN, "nope")
            .unwrap_err();
        assert_eq!(err.to_status_code(), StatusCode::FORBIDDEN);

        let err = ctx
            .throw::<()>(StatusCode::SERVICE_UNAVAILABLE, "maintenance")
            .unwrap_err();
        assert_eq!(err.to_status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.public_message(), "Service Unavailable");
    }

    #[test]
    fn test_set_header_ignores_invalid() {
        let mut ctx = Context::new(Method::GET, Uri::from_static("/"));
        ctx.set_header("x-trace", "abc");
        ctx.set_header("bad header", "abc");
        assert_eq!(ctx.response.headers.len(), 1);
    }
}
