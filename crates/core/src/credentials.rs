//! Credential store abstraction and the SharePoint credential resolver.
//!
//! A store maps a key id to a bag of key values (at least `username` and
//! `password`). The resolver turns that bag into validated [`Credentials`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::Error;

/// Message surfaced whenever credentials cannot be resolved.
pub const NO_CREDENTIALS: &str = "No Sharepoint credentials found";

/// Key values stored under one key id.
pub type KeyValues = HashMap<String, String>;

/// Username/password pair used for the STS request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Lookup service for stored credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Return the key values stored under `key_id`, or `None` if there is no such key.
    async fn lookup(&self, key_id: &str) -> Result<Option<KeyValues>, Error>;
}

/// Resolve `key_id` into credentials.
///
/// # Errors
///
/// Returns `Error::Credential` if the store has no entry for `key_id` or the
/// entry lacks a non-empty `username` or `password`. Store failures propagate.
pub async fn resolve_credentials(store: &dyn CredentialStore, key_id: &str) -> Result<Credentials, Error> {
    let values = store.lookup(key_id).await?.unwrap_or_default();

    let username = values.get("username").map(|v| v.trim()).filter(|v| !v.is_empty());
    let password = values.get("password").filter(|v| !v.trim().is_empty());

    match (username, password) {
        (Some(username), Some(password)) => {
            tracing::debug!(key_id, username, "resolved SharePoint credentials");
            Ok(Credentials::new(username, password.as_str()))
        }
        _ => {
            tracing::debug!(key_id, "credential key missing or incomplete");
            Err(Error::Credential(NO_CREDENTIALS.to_string()))
        }
    }
}

/// Credentials held in memory, usually loaded from configuration.
#[derive(Default)]
pub struct StaticCredentialStore {
    entries: HashMap<String, KeyValues>,
}

impl StaticCredentialStore {
    pub fn new(entries: HashMap<String, KeyValues>) -> Self {
        Self { entries }
    }

    /// Add a username/password entry.
    pub fn with_entry(mut self, key_id: impl Into<String>, username: &str, password: &str) -> Self {
        let values = KeyValues::from([
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        self.entries.insert(key_id.into(), values);
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn lookup(&self, key_id: &str) -> Result<Option<KeyValues>, Error> {
        Ok(self.entries.get(key_id).cloned())
    }
}

/// Credentials read from environment variables.
///
/// Key id `sharepoint` maps to `SPFED_KEY_SHAREPOINT_USERNAME` and
/// `SPFED_KEY_SHAREPOINT_PASSWORD`. Non-alphanumeric characters in the key id
/// become underscores.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self { prefix: "SPFED_KEY_".to_string() }
    }
}

impl EnvCredentialStore {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn var_name(&self, key_id: &str, field: &str) -> String {
        let key: String = key_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}_{}", self.prefix, key, field.to_uppercase())
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn lookup(&self, key_id: &str) -> Result<Option<KeyValues>, Error> {
        let values: KeyValues = ["username", "password"]
            .into_iter()
            .filter_map(|field| {
                std::env::var(self.var_name(key_id, field))
                    .ok()
                    .map(|value| (field.to_string(), value))
            })
            .collect();

        Ok((!values.is_empty()).then_some(values))
    }
}

/// Tries each store in order and returns the first entry found.
#[derive(Default)]
pub struct ChainedCredentialStore {
    stores: Vec<Arc<dyn CredentialStore>>,
}

impl ChainedCredentialStore {
    pub fn new(stores: Vec<Arc<dyn CredentialStore>>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl CredentialStore for ChainedCredentialStore {
    async fn lookup(&self, key_id: &str) -> Result<Option<KeyValues>, Error> {
        for store in &self.stores {
            if let Some(values) = store.lookup(key_id).await? {
                return Ok(Some(values));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(values: &[(&str, &str)]) -> StaticCredentialStore {
        let entry: KeyValues = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StaticCredentialStore::new(HashMap::from([("sharepoint".to_string(), entry)]))
    }

    #[tokio::test]
    async fn test_resolve_complete_entry() {
        let store = StaticCredentialStore::default().with_entry("sharepoint", "alice@contoso.com", "s3cret");
        let creds = resolve_credentials(&store, "sharepoint").await.unwrap();
        assert_eq!(creds.username, "alice@contoso.com");
        assert_eq!(creds.password, "s3cret");
    }

    #[tokio::test]
    async fn test_resolve_unknown_key() {
        let store = StaticCredentialStore::default();
        let result = resolve_credentials(&store, "missing").await;
        assert!(matches!(result, Err(Error::Credential(msg)) if msg == NO_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_resolve_missing_password() {
        let store = store_with(&[("username", "alice@contoso.com")]);
        let result = resolve_credentials(&store, "sharepoint").await;
        assert!(matches!(result, Err(Error::Credential(_))));
    }

    #[tokio::test]
    async fn test_resolve_missing_username() {
        let store = store_with(&[("password", "s3cret")]);
        let result = resolve_credentials(&store, "sharepoint").await;
        assert!(matches!(result, Err(Error::Credential(_))));
    }

    #[tokio::test]
    async fn test_resolve_blank_values() {
        let store = store_with(&[("username", "  "), ("password", "s3cret")]);
        let result = resolve_credentials(&store, "sharepoint").await;
        assert!(matches!(result, Err(Error::Credential(_))));
    }

    #[tokio::test]
    async fn test_password_kept_verbatim() {
        let store = store_with(&[("username", " alice "), ("password", " pa ss ")]);
        let creds = resolve_credentials(&store, "sharepoint").await.unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, " pa ss ");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "s3cret");
        let printed = format!("{creds:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn test_env_var_name() {
        let store = EnvCredentialStore::default();
        assert_eq!(store.var_name("sharepoint-prod", "username"), "SPFED_KEY_SHAREPOINT_PROD_USERNAME");
    }

    #[tokio::test]
    async fn test_env_store_lookup() {
        let store = EnvCredentialStore::with_prefix("SPFED_TEST_ENV_STORE_");
        unsafe {
            std::env::set_var("SPFED_TEST_ENV_STORE_DEMO_USERNAME", "bob");
            std::env::set_var("SPFED_TEST_ENV_STORE_DEMO_PASSWORD", "hunter2");
        }

        let creds = resolve_credentials(&store, "demo").await.unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password, "hunter2");

        assert!(store.lookup("absent").await.unwrap().is_none());

        unsafe {
            std::env::remove_var("SPFED_TEST_ENV_STORE_DEMO_USERNAME");
            std::env::remove_var("SPFED_TEST_ENV_STORE_DEMO_PASSWORD");
        }
    }

    #[tokio::test]
    async fn test_chained_store_first_hit_wins() {
        let first: Arc<dyn CredentialStore> = Arc::new(StaticCredentialStore::default());
        let second: Arc<dyn CredentialStore> =
            Arc::new(StaticCredentialStore::default().with_entry("sharepoint", "carol", "pw"));
        let third: Arc<dyn CredentialStore> =
            Arc::new(StaticCredentialStore::default().with_entry("sharepoint", "dave", "pw"));

        let chain = ChainedCredentialStore::new(vec![first, second, third]);
        let creds = resolve_credentials(&chain, "sharepoint").await.unwrap();
        assert_eq!(creds.username, "carol");
    }
}
