//! Configuration builder

use crate::types::{
    AppConfig, Config, NamespaceConfig, ObservabilityConfig, ResourceConfig, RouteConfig,
    VersioningConfig,
};
use trellis_core::Result;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set application settings
    pub fn app(mut self, app: AppConfig) -> Self {
        self.config.app = app;
        self
    }

    /// Set the application name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.app.name = name.into();
        self
    }

    /// Answer 405 when only the method fails to match
    pub fn method_not_allowed(mut self, enabled: bool) -> Self {
        self.config.app.method_not_allowed = enabled;
        self
    }

    /// Set the root router prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.router.prefix = prefix.into();
        self
    }

    /// Apply a named middleware to every route
    pub fn router_middleware(mut self, name: impl Into<String>) -> Self {
        self.config.router.middleware.push(name.into());
        self
    }

    /// Set versioning settings
    pub fn versioning(mut self, versioning: VersioningConfig) -> Self {
        self.config.versioning = versioning;
        self
    }

    /// Set observability settings
    pub fn observability(mut self, observability: ObservabilityConfig) -> Self {
        self.config.observability = observability;
        self
    }

    /// Add a root route
    pub fn add_route(mut self, route: RouteConfig) -> Self {
        self.config.routes.push(route);
        self
    }

    /// Add a root resource
    pub fn add_resource(mut self, resource: ResourceConfig) -> Self {
        self.config.resources.push(resource);
        self
    }

    /// Add a root namespace
    pub fn add_namespace(mut self, namespace: NamespaceConfig) -> Self {
        self.config.namespaces.push(namespace);
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}
