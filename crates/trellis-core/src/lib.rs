//! # Trellis Core
//!
//! Core types, traits, and error handling for Trellis.
//!
//! This crate provides the foundational abstractions used throughout the workspace:
//! - Request context and response state
//! - Middleware trait and onion-model chain
//! - Terminal actions
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod action;
pub mod body;
pub mod context;
pub mod error;
pub mod middleware;
pub mod params;
pub mod response;
pub mod types;

pub use action::{Action, ActionFn};
pub use body::{Body, BodyStream};
pub use context::{Context, ResponseState, RouteInfo};
pub use error::{Error, Result};
pub use middleware::{Chain, Middleware, MiddlewareRef, Next};
pub use params::Params;
pub use response::{HttpBody, ResponseBuilder};
pub use types::{method_eq, normalize_method, STANDARD_METHODS};

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

#[doc(hidden)]
pub use async_trait::async_trait;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, ActionFn};
    pub use crate::body::Body;
    pub use crate::context::{Context, RouteInfo};
    pub use crate::error::{Error, Result};
    pub use crate::middleware::{Chain, Middleware, MiddlewareRef, Next};
    pub use crate::params::Params;
}
