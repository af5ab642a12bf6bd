//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,

    #[error("rate_limit.path_prefix must not be empty")]
    EmptyPathPrefix,

    #[error("limits.body_limit_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("security source {0:?} is not a valid header token")]
    InvalidCspSource(String),
}

/// CSP sources end up inside a header value, so they must be visible ASCII
/// and must not carry the directive separator.
fn csp_source_valid(source: &str) -> bool {
    !source.is_empty()
        && !source.contains(';')
        && source.chars().all(|c| c.is_ascii_graphic())
}

/// Check the configuration for semantic errors, collecting all of them.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests);
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if config.rate_limit.path_prefix.is_empty() {
        errors.push(ValidationError::EmptyPathPrefix);
    }
    if config.limits.body_limit_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let security = &config.security;
    let source_lists = [
        &security.default_src,
        &security.base_uri,
        &security.font_src,
        &security.script_src,
        &security.frame_src,
        &security.object_src,
        &security.style_src,
        &security.worker_src,
        &security.child_src,
        &security.img_src,
        &security.form_action,
        &security.connect_src,
    ];
    for source in source_lists.into_iter().flatten() {
        if !csp_source_valid(source) {
            errors.push(ValidationError::InvalidCspSource(source.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = AppConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_secs = 0;
        config.rate_limit.path_prefix.clear();
        config.limits.body_limit_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroMaxRequests));
        assert!(errors.contains(&ValidationError::ZeroWindow));
        assert!(errors.contains(&ValidationError::EmptyPathPrefix));
        assert!(errors.contains(&ValidationError::ZeroBodyLimit));
    }

    #[test]
    fn bad_csp_source_is_rejected() {
        let mut config = AppConfig::default();
        config.security.script_src.push("bad;source".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidCspSource("bad;source".to_string())]
        );
    }
}
