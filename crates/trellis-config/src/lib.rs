//! # Trellis Configuration
//!
//! Configuration management with support for:
//! - Multiple formats (YAML, TOML, JSON)
//! - Environment variable expansion (`${VAR}`, `${VAR:-default}`)
//! - Validation
//! - Declarative routes, resources and namespaces

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builder;
pub mod loader;
pub mod routes;
pub mod types;
pub mod validator;

pub use builder::ConfigBuilder;
pub use loader::{load_config, load_from_file, load_from_str};
pub use routes::build_router;
pub use types::{
    AppConfig, Config, LoggingConfig, MiddlewareConfig, NamespaceConfig, ObservabilityConfig,
    RequestIdSettings, RequestLoggingSettings, ResourceConfig, RouteConfig, RouterConfig,
    VersioningConfig,
};
pub use validator::validate_config;

use std::fmt;
use std::path::Path;
use trellis_core::{Error, Result};

/// Load and validate configuration from a file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_config(path)
}

/// Parse and validate configuration held in memory
pub fn load_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let config = load_from_str(content, format)?;
    validate_config(&config)?;
    Ok(config)
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Format for a file extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Format named by the extension of `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str()).ok_or_else(|| {
            Error::Config(format!(
                "Cannot tell the format of {} without an extension",
                path.display()
            ))
        })?;

        Self::from_extension(ext)
            .ok_or_else(|| Error::Config(format!("Unsupported config format: {ext}")))
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        })
    }
}
