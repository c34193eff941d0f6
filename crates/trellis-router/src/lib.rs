//! # Trellis Router
//!
//! Hierarchical router built from nested route tables:
//! - Path templates with named parameters (`/posts/:post`), constraints
//!   (`/posts/:id(\d+)`), optional segments and wildcards (`/static/*path`)
//! - `resource`, `namespace` and `group` declarations composing prefixes,
//!   middleware and controller names
//! - First-match-wins lookup in registration order
//!
//! ## Matching
//!
//! Templates are compiled once at registration. Subtrees under a literal
//! prefix are skipped when the request path cannot start with it.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod inflect;
pub mod matcher;
pub mod route;
pub mod router;

pub use inflect::pluralize;
pub use matcher::{decode_param, Captures, MatchOptions, ParamKey, PatternMatcher};
pub use route::{Handler, IntoHandler, Route, RouteMatch, RouteOptions};
pub use router::{ResourceAction, ResourceOptions, RouteSummary, Router, RouterOptions};
