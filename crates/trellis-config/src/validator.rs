//! Configuration validation

use crate::types::{Config, NamespaceConfig, ResourceConfig, RouteConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use trellis_core::{normalize_method, Error, Result};
use trellis_router::ResourceAction;

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^v\d+$").expect("valid version regex"));

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_app(config)?;
    validate_versioning(config)?;
    validate_observability(config)?;

    validate_middleware_names(&config.router.middleware, "router")?;
    for route in &config.routes {
        validate_route(route, "root")?;
    }
    for resource in &config.resources {
        validate_resource(resource)?;
    }
    for namespace in &config.namespaces {
        validate_namespace(namespace)?;
    }

    Ok(())
}

fn validate_app(config: &Config) -> Result<()> {
    if config.app.name.trim().is_empty() {
        return Err(Error::Config("app name cannot be empty".to_string()));
    }

    if !config.router.prefix.is_empty() && !config.router.prefix.starts_with('/') {
        return Err(Error::Config(format!(
            "router prefix '{}' must start with '/'",
            config.router.prefix
        )));
    }

    Ok(())
}

fn validate_versioning(config: &Config) -> Result<()> {
    let versioning = &config.versioning;

    if !VERSION.is_match(&versioning.default_version) {
        return Err(Error::Config(format!(
            "Invalid default version '{}' (expected v1, v2, ...)",
            versioning.default_version
        )));
    }

    if versioning.enabled && versioning.vendor.trim().is_empty() {
        return Err(Error::Config(
            "versioning vendor cannot be empty when versioning is enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_observability(config: &Config) -> Result<()> {
    let levels = ["trace", "debug", "info", "warn", "error"];

    let logging = &config.observability.logging;
    if !levels.contains(&logging.level.to_ascii_lowercase().as_str()) {
        return Err(Error::Config(format!("Invalid log level: {}", logging.level)));
    }
    match logging.format.as_str() {
        "text" | "json" => {}
        other => {
            return Err(Error::Config(format!(
                "Invalid log format: {other} (must be text or json)"
            )));
        }
    }

    let request_logging = &config.middleware.logging;
    if !levels.contains(&request_logging.level.to_ascii_lowercase().as_str()) {
        return Err(Error::Config(format!(
            "Invalid request log level: {}",
            request_logging.level
        )));
    }

    if config.middleware.request_id.enabled && config.middleware.request_id.header.is_empty() {
        return Err(Error::Config("request_id header cannot be empty".to_string()));
    }

    Ok(())
}

fn validate_middleware_names(names: &[String], owner: &str) -> Result<()> {
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(Error::Config(format!(
            "{owner} declares an empty middleware name"
        )));
    }
    Ok(())
}

fn validate_route(route: &RouteConfig, owner: &str) -> Result<()> {
    if !route.path.is_empty() && !route.path.starts_with('/') {
        return Err(Error::Config(format!(
            "route path '{}' in {owner} must start with '/'",
            route.path
        )));
    }

    if route.methods.is_empty() {
        return Err(Error::Config(format!(
            "route '{}' in {owner} declares no methods",
            route.path
        )));
    }
    for method in &route.methods {
        normalize_method(method)?;
    }

    match route.to.split_once('#') {
        Some((controller, action)) if !controller.is_empty() && !action.is_empty() => {}
        _ => {
            return Err(Error::Config(format!(
                "route '{}' in {owner}: handler '{}' must have the form 'controller#action'",
                route.path, route.to
            )));
        }
    }

    validate_middleware_names(&route.middleware, owner)
}

fn validate_resource(resource: &ResourceConfig) -> Result<()> {
    if resource.name.trim().is_empty() {
        return Err(Error::Config("resource name cannot be empty".to_string()));
    }
    let owner = format!("resource '{}'", resource.name);

    for action in resource.only.iter().flatten().chain(&resource.except) {
        action.parse::<ResourceAction>()?;
    }

    validate_middleware_names(&resource.middleware, &owner)?;
    for route in resource.collection.iter().chain(&resource.member) {
        validate_route(route, &owner)?;
    }
    for nested in &resource.resources {
        validate_resource(nested)?;
    }

    Ok(())
}

fn validate_namespace(namespace: &NamespaceConfig) -> Result<()> {
    if namespace.name.trim_matches('/').is_empty() {
        return Err(Error::Config("namespace name cannot be empty".to_string()));
    }
    let owner = format!("namespace '{}'", namespace.name);

    validate_middleware_names(&namespace.middleware, &owner)?;
    for route in &namespace.routes {
        validate_route(route, &owner)?;
    }
    for resource in &namespace.resources {
        validate_resource(resource)?;
    }
    for nested in &namespace.namespaces {
        validate_namespace(nested)?;
    }

    Ok(())
}
