//! # Trellis Middleware
//!
//! Built-in middleware and the pieces that decide which middleware runs:
//! - Per-action filters (`only` / `except`)
//! - Named middleware registry (`"auth:editor"`)
//! - Request ID injection
//! - Request logging

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builder;
pub mod filter;
pub mod logging;
pub mod registry;
pub mod request_id;

pub use builder::MiddlewareBuilder;
pub use filter::{filter_for_action, ActionCondition, ActionFilter};
pub use logging::{LoggingConfig, RequestLogger};
pub use registry::{MiddlewareFactory, MiddlewareRegistry};
pub use request_id::{IdGenerator, RequestId, RequestIdConfig};

// Re-export core middleware types from trellis-core
pub use trellis_core::middleware::{Middleware, MiddlewareRef, Next};
pub use trellis_core::Result;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::builder::MiddlewareBuilder;
    pub use crate::filter::{ActionCondition, ActionFilter};
    pub use crate::logging::{LoggingConfig, RequestLogger};
    pub use crate::registry::MiddlewareRegistry;
    pub use crate::request_id::{IdGenerator, RequestId, RequestIdConfig};
    pub use trellis_core::middleware::{Middleware, MiddlewareRef, Next};
}
