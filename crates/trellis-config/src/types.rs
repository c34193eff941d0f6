//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Root router settings
    #[serde(default)]
    pub router: RouterConfig,

    /// Accept-header API versioning
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Built-in global middleware
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Observability
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Routes on the root router
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Resources on the root router
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    /// Namespaces on the root router
    #[serde(default)]
    pub namespaces: Vec<NamespaceConfig>,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Application name
    pub name: String,

    /// Environment name (development, production, ...)
    pub env: String,

    /// Answer 405 instead of 404 when only the method fails to match
    pub method_not_allowed: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "trellis".to_string(),
            env: "development".to_string(),
            method_not_allowed: false,
        }
    }
}

/// Root router settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix for every route
    pub prefix: String,

    /// Case-sensitive literal matching
    pub case_sensitive: bool,

    /// Significant trailing slash
    pub strict: bool,

    /// Named middleware applied to every route
    pub middleware: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            case_sensitive: true,
            strict: false,
            middleware: Vec::new(),
        }
    }
}

/// Accept-header versioning settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VersioningConfig {
    /// Resolve a version per request
    pub enabled: bool,

    /// Vendor in `application/vnd.{vendor}.v1+json`
    pub vendor: String,

    /// Version used when the Accept header names none
    pub default_version: String,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            vendor: "trellis".to_string(),
            default_version: "v1".to_string(),
        }
    }
}

/// Built-in global middleware
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Request ID injection
    pub request_id: RequestIdSettings,

    /// Request logging
    pub logging: RequestLoggingSettings,
}

/// Request ID middleware settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestIdSettings {
    /// Install the middleware
    pub enabled: bool,

    /// Header carrying the ID
    pub header: String,
}

impl Default for RequestIdSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            header: "X-Request-ID".to_string(),
        }
    }
}

/// Request logging middleware settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestLoggingSettings {
    /// Install the middleware
    pub enabled: bool,

    /// Level of request events
    pub level: String,

    /// Include request headers
    pub log_headers: bool,

    /// Warn about requests slower than this
    #[serde(with = "humantime_serde")]
    pub slow_threshold: Option<Duration>,
}

impl Default for RequestLoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            log_headers: false,
            slow_threshold: None,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log format (json, text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Route configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    /// Path template, relative to the enclosing router
    pub path: String,

    /// HTTP methods
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Handler as `controller#action`
    pub to: String,

    /// Named middleware appended for this route
    #[serde(default)]
    pub middleware: Vec<String>,
}

/// Resource configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceConfig {
    /// Singular resource name
    pub name: String,

    /// Controller name, defaults to `name`
    pub controller: Option<String>,

    /// Member parameter, defaults to `name`
    pub param: Option<String>,

    /// Collection segment, defaults to the plural of `name`
    pub plural: Option<String>,

    /// Generate only these conventional actions
    pub only: Option<Vec<String>>,

    /// Skip these conventional actions
    pub except: Vec<String>,

    /// Named middleware for every route of the resource
    pub middleware: Vec<String>,

    /// Extra routes on the collection (`/posts/...`)
    pub collection: Vec<RouteConfig>,

    /// Extra routes on each member (`/posts/:post/...`)
    pub member: Vec<RouteConfig>,

    /// Resources nested under each member
    pub resources: Vec<ResourceConfig>,
}

/// Namespace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Path segment, may contain parameters (`provider/:provider`)
    pub name: String,

    /// Controller prefix, defaults to the first word of `name`
    pub controller_prefix: Option<String>,

    /// Named middleware for every route in the namespace
    pub middleware: Vec<String>,

    /// Routes in the namespace
    pub routes: Vec<RouteConfig>,

    /// Resources in the namespace
    pub resources: Vec<ResourceConfig>,

    /// Nested namespaces
    pub namespaces: Vec<NamespaceConfig>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}
