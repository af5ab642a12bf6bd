//! Configuration loading from disk and the process environment.

use std::path::Path;
use std::fs;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override {name}={value}")]
    EnvOverride { name: &'static str, value: String },

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// A missing file is not an error: the server runs entirely on defaults in
/// that case. Environment overrides (`PORT`, `APP_ENV`) are applied after the
/// file is read and before validation.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `PORT` and `APP_ENV` overrides from the process environment.
fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port.parse().map_err(|_| ConfigError::EnvOverride {
            name: "PORT",
            value: port,
        })?;
    }
    if let Ok(environment) = std::env::var("APP_ENV") {
        config.server.environment = environment;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that set or read process environment variables must not run
    // concurrently, so every env-coupled test holds this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_file_yields_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = load_config(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.rate_limit.max_requests, 100);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("confer-loader-test-invalid.toml");
        fs::write(&path, "server = 42").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn port_override_is_applied() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("PORT", "4100");
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.server.port, 4100);
        std::env::remove_var("PORT");
    }

    #[test]
    fn file_values_are_loaded() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = std::env::temp_dir();
        let path = dir.join("confer-loader-test-valid.toml");
        fs::write(
            &path,
            r#"
            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
        let _ = fs::remove_file(&path);
    }
}
