//! Request id propagation
//!
//! Every request gets an id: the one the client sent, or a fresh one. The
//! id becomes `Context::request_id`, is written back to the request headers
//! for downstream layers, and is echoed on the response.

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use trellis_core::{Context, Middleware, Next, Result};
use uuid::Uuid;

/// How fresh ids are minted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenerator {
    /// Random UUID v4
    UuidV4,
    /// Hex millisecond timestamp then a random UUID, sortable by creation time
    Ulid,
}

impl IdGenerator {
    /// Mint an id
    pub fn generate(&self) -> String {
        match self {
            IdGenerator::UuidV4 => Uuid::new_v4().to_string(),
            IdGenerator::Ulid => {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |elapsed| elapsed.as_millis());
                format!("{millis:016x}{}", Uuid::new_v4().simple())
            }
        }
    }
}

/// [`RequestId`] settings
#[derive(Debug, Clone)]
pub struct RequestIdConfig {
    /// Header carrying the id in both directions
    pub header_name: String,
    /// Minting strategy when the client sent none
    pub generator: IdGenerator,
    /// Echo the id on the response
    pub add_to_response: bool,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Request-ID".to_string(),
            generator: IdGenerator::UuidV4,
            add_to_response: true,
        }
    }
}

/// Adopts or mints the request id.
///
/// An invalid configured header name falls back to `x-request-id`.
#[derive(Clone)]
pub struct RequestId {
    header: HeaderName,
    generator: IdGenerator,
    echo: bool,
}

impl RequestId {
    /// Default settings
    pub fn new() -> Self {
        Self::with_config(RequestIdConfig::default())
    }

    /// Custom settings
    pub fn with_config(config: RequestIdConfig) -> Self {
        let header = HeaderName::from_bytes(config.header_name.as_bytes()).unwrap_or_else(|_| {
            tracing::warn!(
                header = %config.header_name,
                "Invalid request id header, using x-request-id"
            );
            HeaderName::from_static("x-request-id")
        });

        Self {
            header,
            generator: config.generator,
            echo: config.add_to_response,
        }
    }

    fn incoming(&self, ctx: &Context) -> Option<String> {
        ctx.headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestId")
            .field("header", &self.header)
            .field("generator", &self.generator)
            .field("echo", &self.echo)
            .finish()
    }
}

#[async_trait]
impl Middleware for RequestId {
    async fn call(&self, ctx: &mut Context, next: Next) -> Result<()> {
        let id = self
            .incoming(ctx)
            .unwrap_or_else(|| self.generator.generate());

        if let Ok(value) = HeaderValue::from_str(&id) {
            ctx.headers.insert(self.header.clone(), value.clone());
            // Set before `next` so error responses carry it too
            if self.echo {
                ctx.response.headers.insert(self.header.clone(), value);
            }
        }
        ctx.request_id = id;

        next.run(ctx).await
    }

    fn name(&self) -> &str {
        "request_id"
    }
}
