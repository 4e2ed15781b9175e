//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn require_http_url(field: &str, value: &str) -> Result<url::Url, ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, &format!("not an absolute URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(field, &format!("unsupported scheme: {other}"))),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `prerender.base_url` or `offline.origin` is not an http(s) URL
    /// - `prerender.site_name` or `offline.cache_version` is empty
    /// - a precache path does not start with `/` or resolves outside `offline.origin`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        require_http_url("prerender.base_url", &self.prerender.base_url)?;
        if self.prerender.site_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "prerender.site_name".into(),
                hint: "Set NAI_SITE_PRERENDER__SITE_NAME environment variable".into(),
            });
        }
        if self.prerender.index_file.is_empty() {
            return Err(invalid("prerender.index_file", "must not be empty"));
        }

        let origin = require_http_url("offline.origin", &self.offline.origin)?;
        if self.offline.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "offline.cache_version".into(),
                hint: "Set NAI_SITE_OFFLINE__CACHE_VERSION environment variable".into(),
            });
        }
        for path in &self.offline.precache {
            if !path.starts_with('/') {
                return Err(invalid("offline.precache", &format!("path must start with '/': {path}")));
            }
            let resolved = origin
                .join(path)
                .map_err(|e| invalid("offline.precache", &format!("cannot resolve {path}: {e}")))?;
            if resolved.origin() != origin.origin() {
                return Err(invalid("offline.precache", &format!("path leaves the origin: {path}")));
            }
        }

        if self.prerender.base_url != self.offline.origin {
            tracing::debug!(
                base_url = %self.prerender.base_url,
                origin = %self.offline.origin,
                "prerender base_url and offline origin differ"
            );
        }

        Ok(())
    }
}
