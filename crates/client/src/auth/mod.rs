//! SharePoint Online federated authentication.
//!
//! ### Token chain
//! 1. **Security token**: WS-Trust issue request to the Microsoft Online STS
//!    (`https://login.microsoftonline.com/extSTS.srf`).
//! 2. **Session cookies**: the token is posted to
//!    `{site}/_forms/default.aspx?wa=wsignin1.0`; `rtFa` and `FedAuth` come
//!    back as `Set-Cookie` headers.
//! 3. **Form digest**: `{site}/{sub_site}/_api/contextinfo` with the cookies
//!    attached returns the `X-RequestDigest` value.
//!
//! ### Caching
//! - Only the cookies are cached, in one fixed slot, without expiry.
//! - A non-200 digest response is taken as an expired session: the chain is
//!   re-run once and the digest requested again.
//! - Refreshes are serialized; callers queued behind a refresh reuse its
//!   cookies instead of calling the STS again.
//! - The cache is written only after a complete sign-in exchange.

pub mod cache;
pub mod digest;
pub mod signin;
pub mod sts;

pub use cache::SessionCache;
pub use digest::{DigestResponse, fetch_digest};
pub use signin::{FEDAUTH, RTFA, SESSION_COOKIE_NAMES, exchange_token, extract_cookies};
pub use sts::request_security_token;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use spfed_core::config::{AppConfig, DEFAULT_STS_URL};
use spfed_core::{Credentials, Error, SessionCookies};
use tracing::instrument;

use crate::site::TargetSite;
use crate::xml::extract_node;

/// Location of the digest value in the `contextinfo` response.
pub const DIGEST_SELECTOR: &str = "d|GetContextWebInformation d|FormDigestValue";

/// Passes through the digest step: the first attempt plus one re-authentication.
const MAX_PASSES: usize = 2;

/// Configuration for the auth client.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// STS endpoint (default: Microsoft Online extSTS.srf)
    pub sts_url: String,

    /// User agent string (default: "spfed/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sts_url: DEFAULT_STS_URL.to_string(),
            user_agent: "spfed/0.1".to_string(),
            timeout: Duration::from_millis(20000),
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(config: &AppConfig) -> Self {
        Self { sts_url: config.sts_url.clone(), user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// Session artifacts to attach to a SharePoint REST call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    /// `rtFa` / `FedAuth` session cookies
    pub cookies: SessionCookies,
    /// `X-RequestDigest` header value; empty if SharePoint returned none
    pub digest: String,
}

/// Where the cookies for one pass come from.
#[derive(Debug, Clone, Copy)]
enum Lookup<'a> {
    /// Use the cache, refreshing on a miss.
    Cached,
    /// The cached cookies were rejected; refresh unless another caller already did.
    Stale(&'a SessionCookies),
    /// Always run the token chain.
    Forced,
}

/// Runs the token chain and maintains the session cache.
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    config: AuthConfig,
    cache: Arc<SessionCache>,
}

impl AuthClient {
    /// Create a new auth client sharing `cache` with any other client in the process.
    pub fn new(config: AuthConfig, cache: Arc<SessionCache>) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, cache })
    }

    /// Cookies and digest for `site`.
    ///
    /// With `force_refresh` the cache is bypassed and the token chain always
    /// runs. Otherwise cached cookies are tried first and refreshed once if
    /// the digest call rejects them.
    ///
    /// # Errors
    ///
    /// - `Error::Network` / `Error::Parse` / `Error::Auth` from the token chain, unchanged
    /// - `Error::Auth` if sign-in issued no cookies or the digest call still fails after fresh cookies
    /// - `Error::Parse` if the digest response is not well-formed XML
    #[instrument(skip(self, creds), fields(site = %site))]
    pub async fn get_auth_data(
        &self, site: &TargetSite, creds: &Credentials, force_refresh: bool,
    ) -> Result<AuthData, Error> {
        let mut stale: Option<SessionCookies> = None;

        for pass in 1..=MAX_PASSES {
            let lookup = match (&stale, force_refresh) {
                (Some(cookies), _) => Lookup::Stale(cookies),
                (None, true) => Lookup::Forced,
                (None, false) => Lookup::Cached,
            };
            let (cookies, fresh) = self.session_cookies(site, creds, lookup).await?;

            let response = fetch_digest(&self.http, site, &cookies).await?;

            if !response.is_ok() {
                if fresh && cookies.is_empty() {
                    return Err(Error::Auth(format!(
                        "sign-in issued no session cookies (contextinfo status {})",
                        response.status
                    )));
                }
                if fresh || pass == MAX_PASSES {
                    return Err(Error::Auth(format!(
                        "contextinfo rejected fresh session cookies (status {})",
                        response.status
                    )));
                }
                tracing::warn!(status = response.status, "contextinfo rejected cached session, re-authenticating");
                stale = Some(cookies);
                continue;
            }

            let digest = extract_node(&response.body, DIGEST_SELECTOR)?;
            if digest.is_empty() {
                tracing::warn!("contextinfo response carried no form digest");
            }

            return Ok(AuthData { cookies, digest });
        }

        Err(Error::Auth("contextinfo retry limit reached".to_string()))
    }

    /// Drop the cached session.
    pub async fn invalidate(&self) -> Result<(), Error> {
        self.cache.invalidate().await
    }

    /// Cookies for one pass and whether they were issued during this call.
    async fn session_cookies(
        &self, site: &TargetSite, creds: &Credentials, lookup: Lookup<'_>,
    ) -> Result<(SessionCookies, bool), Error> {
        if let Lookup::Cached = lookup
            && let Some(cookies) = self.cache.get().await?
        {
            tracing::debug!("using cached session cookies");
            return Ok((cookies, false));
        }

        let _guard = self.cache.lock_refresh().await;

        // Another caller may have refreshed while this one waited for the lock.
        match lookup {
            Lookup::Cached => {
                if let Some(cookies) = self.cache.get().await? {
                    tracing::debug!("session refreshed by a concurrent caller");
                    return Ok((cookies, false));
                }
            }
            Lookup::Stale(stale) => {
                if let Some(cookies) = self.cache.get().await?
                    && &cookies != stale
                {
                    tracing::debug!("stale session already replaced by a concurrent caller");
                    return Ok((cookies, true));
                }
            }
            Lookup::Forced => {}
        }

        let cookies = self.refresh(site, creds).await?;
        Ok((cookies, true))
    }

    /// Run the token chain and store the resulting cookies.
    async fn refresh(&self, site: &TargetSite, creds: &Credentials) -> Result<SessionCookies, Error> {
        tracing::info!(username = %creds.username, "requesting new SharePoint session");

        let token = request_security_token(&self.http, &self.config.sts_url, site, creds).await?;
        let cookies = exchange_token(&self.http, site, &token).await?;

        self.cache.set(&cookies).await?;
        Ok(cookies)
    }
}
