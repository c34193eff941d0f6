//! # Trellis Runtime
//!
//! Request dispatch on top of the router and middleware chain:
//! - Controllers and the controller registry
//! - Accept-header API versioning
//! - The dispatcher (route, resolve, assemble, run, respond)
//! - Default responders
//! - Application glue for `http` requests

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod application;
pub mod controller;
pub mod dispatcher;
pub mod registry;
pub mod responder;
pub mod telemetry;
pub mod version;

pub use application::Application;
pub use controller::{ActionTable, Controller};
pub use dispatcher::Dispatcher;
pub use registry::{ControllerRegistry, ControllerResolver};
pub use responder::{DefaultResponder, ErrorHandler, ErrorOutcome, Responder, TextErrorResponder};
pub use version::{AcceptHeaderVersion, VersionRegistry, VersionResolver};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::Application;
    pub use crate::controller::{ActionTable, Controller};
    pub use crate::dispatcher::Dispatcher;
    pub use crate::registry::{ControllerRegistry, ControllerResolver};
    pub use crate::responder::{ErrorHandler, ErrorOutcome, Responder};
    pub use crate::version::{AcceptHeaderVersion, VersionRegistry, VersionResolver};
    pub use trellis_core::prelude::*;
    pub use trellis_middleware::{ActionFilter, MiddlewareRegistry};
    pub use trellis_router::{ResourceOptions, RouteOptions, Router, RouterOptions};
}
