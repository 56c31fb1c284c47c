//! Layered settings for the session client and the list-post command.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file named
//! by `SPFED_CONFIG_FILE`, then `SPFED_*` environment variables.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_ID;
use crate::credentials::KeyValues;

mod validation;

pub use validation::ConfigError;

/// Microsoft Online STS endpoint for the legacy federated flow.
pub const DEFAULT_STS_URL: &str = "https://login.microsoftonline.com/extSTS.srf";

/// Sub-site that serves the contextinfo endpoint.
pub const DEFAULT_SUB_SITE: &str = "sites/EDRFTransferPoint";

/// Session client settings.
///
/// Nested keys in environment variables are separated by `__`, e.g.
/// `SPFED_MAPPING__FIRST_NAME=FirstName`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target SharePoint URL. Only scheme and host are used for auth.
    ///
    /// Set via SPFED_SITE_URL environment variable.
    #[serde(default)]
    pub site_url: Option<String>,

    /// Sub-site path of the contextinfo endpoint.
    ///
    /// Set via SPFED_SUB_SITE environment variable.
    #[serde(default = "default_sub_site")]
    pub sub_site: String,

    /// Security token service endpoint.
    ///
    /// Set via SPFED_STS_URL environment variable.
    #[serde(default = "default_sts_url")]
    pub sts_url: String,

    /// Credential key id to resolve.
    ///
    /// Set via SPFED_CREDENTIAL_KEY environment variable.
    #[serde(default)]
    pub credential_key: Option<String>,

    /// Inline credential store: key id -> {username, password}.
    ///
    /// Set via SPFED_CREDENTIALS__<KEY>__USERNAME / __PASSWORD.
    #[serde(default)]
    pub credentials: HashMap<String, KeyValues>,

    /// SharePoint list that receives posted submissions.
    ///
    /// Set via SPFED_LIST_NAME environment variable.
    #[serde(default)]
    pub list_name: Option<String>,

    /// Submission field name -> SharePoint field name.
    #[serde(default)]
    pub mapping: HashMap<String, String>,

    /// Fixed cache slot for session cookies.
    ///
    /// Set via SPFED_CACHE_ID environment variable.
    #[serde(default = "default_cache_id")]
    pub cache_id: String,

    /// SQLite file for the persistent session cache. Unset keeps sessions in memory.
    ///
    /// Set via SPFED_CACHE_PATH environment variable.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// User-Agent sent to the STS and SharePoint.
    ///
    /// Set via SPFED_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout per remote call, in milliseconds.
    ///
    /// Set via SPFED_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_sub_site() -> String {
    DEFAULT_SUB_SITE.into()
}

fn default_sts_url() -> String {
    DEFAULT_STS_URL.into()
}

fn default_cache_id() -> String {
    DEFAULT_CACHE_ID.into()
}

fn default_user_agent() -> String {
    "spfed/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_url: None,
            sub_site: default_sub_site(),
            sts_url: default_sts_url(),
            credential_key: None,
            credentials: HashMap::new(),
            list_name: None,
            mapping: HashMap::new(),
            cache_id: default_cache_id(),
            cache_path: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

// Credential values stay out of debug output.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("site_url", &self.site_url)
            .field("sub_site", &self.sub_site)
            .field("sts_url", &self.sts_url)
            .field("credential_key", &self.credential_key)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("list_name", &self.list_name)
            .field("mapping", &self.mapping)
            .field("cache_id", &self.cache_id)
            .field("cache_path", &self.cache_path)
            .field("user_agent", &self.user_agent)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl AppConfig {
    /// Per-request timeout for every remote call.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load defaults, the `SPFED_CONFIG_FILE` TOML file and `SPFED_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadFailed` when a source cannot be read or
    /// deserialized, and the validation error otherwise.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::var("SPFED_CONFIG_FILE").ok().map(PathBuf::from))
    }

    /// Same as [`AppConfig::load`] with an explicit TOML file instead of `SPFED_CONFIG_FILE`.
    pub fn load_from(config_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_path) = config_file {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(
            Env::prefixed("SPFED_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Site URL, required before any auth call.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the site URL is not set.
    pub fn require_site_url(&self) -> Result<&str, ConfigError> {
        self.site_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "site_url".into(),
            hint: "Set SPFED_SITE_URL environment variable".into(),
        })
    }

    /// Credential key id, required before any auth call.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the credential key is not set.
    pub fn require_credential_key(&self) -> Result<&str, ConfigError> {
        self.credential_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "credential_key".into(),
            hint: "Set SPFED_CREDENTIAL_KEY environment variable".into(),
        })
    }

    /// List name, required when posting submissions.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the list name is not set.
    pub fn require_list_name(&self) -> Result<&str, ConfigError> {
        self.list_name.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "list_name".into(),
            hint: "Set SPFED_LIST_NAME environment variable".into(),
        })
    }
}
