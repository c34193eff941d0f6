//! Configuration loading

use crate::{Config, ConfigFormat};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::Path;
use trellis_core::{Error, Result};

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}").expect("valid env var regex")
});

/// Read a file and parse it in the format its extension names
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {e}", path.display()))
    })?;

    load_from_str(&content, format)
}

/// Substitute `${VAR}` and `${VAR:-default}`; an unset variable without a
/// default is an error
fn expand_env_vars(content: &str) -> Result<String> {
    let mut missing: Option<String> = None;
    let expanded = ENV_VAR.replace_all(content, |caps: &Captures<'_>| {
        let name = &caps[1];
        env::var(name).unwrap_or_else(|_| match caps.get(3) {
            Some(default) => default.as_str().to_string(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        })
    });

    match missing {
        Some(name) => Err(Error::Config(format!(
            "Environment variable '{name}' is not set and has no default"
        ))),
        None => Ok(expanded.into_owned()),
    }
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let content = expand_env_vars(content)?;
    let parse_error =
        |e: &dyn std::fmt::Display| Error::Config(format!("Failed to parse {format}: {e}"));

    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| parse_error(&e)),
        ConfigFormat::Toml => toml::from_str(&content).map_err(|e| parse_error(&e)),
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| parse_error(&e)),
    }
}

/// Load and validate configuration
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let config = load_from_file(path)?;

    crate::validator::validate_config(&config)?;

    tracing::debug!(
        path = %path.display(),
        routes = config.routes.len(),
        resources = config.resources.len(),
        namespaces = config.namespaces.len(),
        "Configuration loaded"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML_CONFIG: &str = r#"
app:
  name: "blog"
  method_not_allowed: true

router:
  middleware: ["session"]

routes:
  - path: "/health"
    to: "health#show"

resources:
  - name: "post"
    except: ["destroy"]
    collection:
      - path: "/new"
        to: "post#new"
    resources:
      - name: "comment"

namespaces:
  - name: "provider/:provider"
    resources:
      - name: "file"

observability:
  logging:
    level: "debug"
    format: "json"
"#;

    #[test]
    fn test_load_yaml() {
        let config = load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.app.name, "blog");
        assert!(config.app.method_not_allowed);
        assert_eq!(config.router.middleware, vec!["session"]);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.resources[0].except, vec!["destroy"]);
        assert_eq!(config.resources[0].resources[0].name, "comment");
        assert_eq!(config.namespaces[0].resources[0].name, "file");
        assert_eq!(config.observability.logging.format, "json");
    }

    #[test]
    fn test_load_toml() {
        let toml_config = r#"
[app]
name = "api"

[[routes]]
path = "/users"
methods = ["GET", "POST"]
to = "users#dispatch"

[[resources]]
name = "photo"
only = ["index", "show"]
"#;

        let config = load_from_str(toml_config, ConfigFormat::Toml).unwrap();
        assert_eq!(config.app.name, "api");
        assert_eq!(config.routes[0].methods, vec!["GET", "POST"]);
        assert_eq!(
            config.resources[0].only,
            Some(vec!["index".to_string(), "show".to_string()])
        );
    }

    #[test]
    fn test_load_json() {
        let config = load_from_str(
            r#"{"routes": [{"path": "/", "to": "home#index"}]}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(config.routes[0].to, "home#index");
        assert_eq!(config.app.name, "trellis");
    }

    #[test]
    fn test_invalid_yaml() {
        let invalid = "invalid: [yaml";
        let result = load_from_str(invalid, ConfigFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TRELLIS_TEST_APP_NAME", "from-env");

        let config = load_from_str(
            "app:\n  name: \"${TRELLIS_TEST_APP_NAME}\"\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.app.name, "from-env");

        env::remove_var("TRELLIS_TEST_APP_NAME");
    }

    #[test]
    fn test_env_var_with_default() {
        env::remove_var("TRELLIS_TEST_UNDEFINED");

        let config = load_from_str(
            "app:\n  env: \"${TRELLIS_TEST_UNDEFINED:-staging}\"\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.app.env, "staging");
    }

    #[test]
    fn test_missing_env_var_no_default() {
        env::remove_var("TRELLIS_TEST_MISSING");

        let result = load_from_str("app:\n  name: \"${TRELLIS_TEST_MISSING}\"\n", ConfigFormat::Yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TRELLIS_TEST_MISSING"));
    }

    #[test]
    fn test_multiple_env_vars() {
        env::set_var("TRELLIS_TEST_VENDOR", "acme");
        env::set_var("TRELLIS_TEST_VERSION", "v2");

        let expanded =
            expand_env_vars("application/vnd.${TRELLIS_TEST_VENDOR}.${TRELLIS_TEST_VERSION}+json")
                .unwrap();
        assert_eq!(expanded, "application/vnd.acme.v2+json");

        env::remove_var("TRELLIS_TEST_VENDOR");
        env::remove_var("TRELLIS_TEST_VERSION");
    }
}
