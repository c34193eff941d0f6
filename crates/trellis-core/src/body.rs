//! Response body values produced by actions and middleware

use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;

/// Stream of body chunks
pub type BodyStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Value stored in the response slot of a [`Context`](crate::Context)
pub enum Body {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Binary(Bytes),
    /// Structured value, serialized as JSON when written
    Json(serde_json::Value),
    /// Streaming source, drained when written
    Stream(BodyStream),
}

impl Body {
    /// Create a body from a serializable value
    pub fn json<T: serde::Serialize>(value: &T) -> crate::Result<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    /// Default content type for this body
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Text(_) => "text/plain; charset=utf-8",
            Body::Binary(_) | Body::Stream(_) => "application/octet-stream",
            Body::Json(_) => "application/json",
        }
    }

    /// Whether this is a streaming body
    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream(_))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            Body::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Binary(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(value))
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_types() {
        assert_eq!(Body::from("hi").content_type(), "text/plain; charset=utf-8");
        assert_eq!(Body::from(vec![1u8, 2]).content_type(), "application/octet-stream");
        assert_eq!(Body::from(json!({"ok": true})).content_type(), "application/json");
    }

    #[test]
    fn test_json_from_serializable() {
        #[derive(serde::Serialize)]
        struct Post {
            id: u32,
        }

        let body = Body::json(&Post { id: 7 }).unwrap();
        match body {
            Body::Json(value) => assert_eq!(value, json!({"id": 7})),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_stream_debug() {
        let body = Body::Stream(Box::pin(futures::stream::empty::<std::io::Result<Bytes>>()));
        assert!(body.is_stream());
        assert_eq!(format!("{body:?}"), "Stream(..)");
    }
}
