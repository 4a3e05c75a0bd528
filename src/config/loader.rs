//! Configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, TOML file,
//! environment variables. The result is validated once and then shared
//! read-only for the life of the process.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ApiKey, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Upstream origin.
pub const ENV_BACKEND_URL: &str = "BACKEND_URL";
/// Credential injected into upstream calls.
pub const ENV_API_KEY: &str = "API_KEY";
/// Listener bind address.
pub const ENV_BIND: &str = "RELAY_BIND";
/// Upstream call deadline in seconds.
pub const ENV_UPSTREAM_TIMEOUT: &str = "RELAY_UPSTREAM_TIMEOUT_SECS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without applying overrides or validation.
pub fn read_config_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply recognized environment variables on top of `config`.
///
/// `lookup` resolves a variable name to its value; empty values are
/// treated as unset.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = get(ENV_BACKEND_URL) {
        config.upstream.base_url = Some(url);
    }
    if let Some(key) = get(ENV_API_KEY) {
        config.upstream.api_key = Some(ApiKey::new(key));
    }
    if let Some(bind) = get(ENV_BIND) {
        config.listener.bind_address = bind;
    }
    if let Some(raw) = get(ENV_UPSTREAM_TIMEOUT) {
        config.upstream.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_UPSTREAM_TIMEOUT,
            value: raw.clone(),
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("BACKEND_URL", "http://backend:8000"),
            ("API_KEY", "k-123"),
            ("RELAY_BIND", "127.0.0.1:3000"),
            ("RELAY_UPSTREAM_TIMEOUT_SECS", "7"),
        ]);
        let mut config = RelayConfig::default();
        apply_env_overrides(&mut config, |name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.upstream.base_url.as_deref(), Some("http://backend:8000"));
        assert_eq!(config.upstream.api_key.as_ref().map(ApiKey::expose), Some("k-123"));
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.upstream.timeout_secs, 7);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let vars = env(&[("BACKEND_URL", ""), ("API_KEY", "  ")]);
        let mut config = RelayConfig::default();
        config.upstream.base_url = Some("http://from-file".into());
        apply_env_overrides(&mut config, |name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.upstream.base_url.as_deref(), Some("http://from-file"));
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_bad_timeout_env() {
        let vars = env(&[("RELAY_UPSTREAM_TIMEOUT_SECS", "soon")]);
        let mut config = RelayConfig::default();
        let err = apply_env_overrides(&mut config, |name| vars.get(name).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_UPSTREAM_TIMEOUT, .. }));
    }

    #[test]
    fn test_read_partial_file() {
        let path = std::env::temp_dir().join(format!("api-relay-{}.toml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[upstream]
base_url = "https://api.example.com"
api_key = "from-file"
timeout_secs = 12

[observability]
log_format = "json"
"#
        )
        .unwrap();

        let config = read_config_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.upstream.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.upstream.api_key, Some(ApiKey::new("from-file")));
        assert_eq!(config.upstream.timeout_secs, 12);
        assert_eq!(config.upstream.api_key_header, "X-API-Key");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(
            config.observability.log_format,
            crate::config::schema::LogFormat::Json
        );
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: RelayConfig = toml::from_str(include_str!("../../relay.example.toml")).unwrap();
        assert_eq!(config.upstream.normalized_base_url(), Some("http://127.0.0.1:8000"));
        assert!(config.upstream.api_key.is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::Zero("upstream.timeout_secs"),
            ValidationError::LogLevel("loud".into()),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: upstream.timeout_secs must be greater than zero, \
             observability.log_level 'loud' is not a known level"
        );
    }
}
