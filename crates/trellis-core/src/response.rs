//! Response builder and utilities

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use http_body_util::Full;

/// Body type written to the transport
pub type HttpBody = Full<Bytes>;

/// Response builder for convenient response construction
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Set a header
    pub fn header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Merge headers accumulated elsewhere
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Build response with empty body
    pub fn empty(self) -> Response<HttpBody> {
        self.bytes(Bytes::new(), None)
    }

    /// Build response with text body
    pub fn text(self, body: impl Into<String>) -> Response<HttpBody> {
        self.bytes(
            Bytes::from(body.into()),
            Some(HeaderValue::from_static("text/plain; charset=utf-8")),
        )
    }

    /// Build response with a raw body.
    ///
    /// `content_type` is only applied when no content type header is set.
    /// Content length is always set from the body.
    pub fn bytes(mut self, body: Bytes, content_type: Option<HeaderValue>) -> Response<HttpBody> {
        if let Some(content_type) = content_type {
            if !self.headers.contains_key(header::CONTENT_TYPE) {
                self.headers.insert(header::CONTENT_TYPE, content_type);
            }
        }
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = ResponseBuilder::new(StatusCode::OK)
            .header(
                header::HeaderName::from_static("x-custom"),
                HeaderValue::from_static("value"),
            )
            .text("Hello, World!");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-custom").unwrap(), "value");
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "13");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_existing_content_type_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let response = ResponseBuilder::new(StatusCode::OK)
            .headers(headers)
            .bytes(Bytes::from_static(b"<p>"), Some(HeaderValue::from_static("text/plain")));

        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/html");
    }

    #[test]
    fn test_empty_response() {
        let response = ResponseBuilder::new(StatusCode::NO_CONTENT).empty();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "0");
    }
}
