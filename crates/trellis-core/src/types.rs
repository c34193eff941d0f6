//! Common types used throughout Trellis

use crate::{Error, Result};
use http::Method;

/// Methods registered by `all` routes
pub const STANDARD_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Parse a verb token into its canonical upper-case [`Method`]
pub fn normalize_method(token: &str) -> Result<Method> {
    let upper = token.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(Error::Config("HTTP method must not be empty".to_string()));
    }
    Method::from_bytes(upper.as_bytes())
        .map_err(|e| Error::Config(format!("Invalid HTTP method '{token}': {e}")))
}

/// Case-insensitive method equality
pub fn method_eq(a: &Method, b: &Method) -> bool {
    a.as_str().eq_ignore_ascii_case(b.as_str())
}
