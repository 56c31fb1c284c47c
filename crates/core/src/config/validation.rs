//! Checks applied to a merged `AppConfig`.

use crate::config::AppConfig;
use thiserror::Error;

/// Failure to load or validate settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Reject settings that would fail only once a remote call is made.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `cache_id` is empty
    /// - `sts_url` or `site_url` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.cache_id.trim().is_empty() {
            return Err(invalid("cache_id", "must not be empty"));
        }

        check_http_url("sts_url", &self.sts_url)?;
        if let Some(site_url) = &self.site_url {
            check_http_url("site_url", site_url)?;
        }

        if self.list_name.is_some() && self.mapping.is_empty() {
            tracing::warn!("list_name is set but mapping is empty; only metadata fields will be posted");
        }

        Ok(())
    }
}

// A missing scheme means https, as for target URLs.
fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    let parsed = if value.contains("://") { url::Url::parse(value) } else { url::Url::parse(&format!("https://{value}")) }
        .map_err(|e| invalid(field, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        "http" | "https" => Err(invalid(field, "missing host")),
        scheme => Err(invalid(field, format!("unsupported scheme: {scheme}"))),
    }
}
