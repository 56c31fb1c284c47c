//! Per-operation SharePoint session.

use std::sync::Arc;

use spfed_core::config::DEFAULT_SUB_SITE;
use spfed_core::credentials::NO_CREDENTIALS;
use spfed_core::{CredentialStore, Credentials, Error, resolve_credentials};

use crate::auth::{AuthClient, AuthData};
use crate::site::TargetSite;

/// Target site and credentials for one remote post.
///
/// Both setters must succeed before [`SharepointSession::auth_data`] can run.
/// The session cache lives in the shared [`AuthClient`], not here.
pub struct SharepointSession {
    auth: AuthClient,
    store: Arc<dyn CredentialStore>,
    sub_site: String,
    site: Option<TargetSite>,
    credentials: Option<Credentials>,
}

impl SharepointSession {
    pub fn new(auth: AuthClient, store: Arc<dyn CredentialStore>) -> Self {
        Self { auth, store, sub_site: DEFAULT_SUB_SITE.to_string(), site: None, credentials: None }
    }

    /// Sub-site used for the digest call of every target set afterwards.
    pub fn with_sub_site(mut self, sub_site: impl Into<String>) -> Self {
        self.sub_site = sub_site.into();
        self
    }

    /// Set the target from any URL on the site.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for unparsable input or a non-http(s) scheme.
    pub fn set_target_url(&mut self, url: &str) -> Result<(), Error> {
        let site = TargetSite::parse(url)?.with_sub_site(&self.sub_site);
        tracing::debug!(site = %site, "target site set");
        self.site = Some(site);
        Ok(())
    }

    /// Resolve and hold the credentials stored under `key_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Credential` if the key is unknown or incomplete.
    pub async fn set_credential_key(&mut self, key_id: &str) -> Result<(), Error> {
        let credentials = resolve_credentials(self.store.as_ref(), key_id).await?;
        self.credentials = Some(credentials);
        Ok(())
    }

    pub fn site(&self) -> Option<&TargetSite> {
        self.site.as_ref()
    }

    /// Cookies and digest, served from the cache when possible.
    pub async fn auth_data(&self) -> Result<AuthData, Error> {
        self.fetch(false).await
    }

    /// Cookies and digest from a fresh token chain.
    pub async fn auth_data_refreshed(&self) -> Result<AuthData, Error> {
        self.fetch(true).await
    }

    async fn fetch(&self, force_refresh: bool) -> Result<AuthData, Error> {
        let site = self
            .site
            .as_ref()
            .ok_or_else(|| Error::InvalidUrl("no target URL set".to_string()))?;
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| Error::Credential(NO_CREDENTIALS.to_string()))?;

        self.auth.get_auth_data(site, credentials, force_refresh).await
    }
}
