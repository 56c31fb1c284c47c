//! Form digest request against the site's `contextinfo` endpoint.

use reqwest::{Client, header};
use spfed_core::{Error, SessionCookies};
use tracing::instrument;

use crate::site::TargetSite;

/// Raw `contextinfo` response. Interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct DigestResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, XML when the request was accepted
    pub body: String,
}

impl DigestResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// POST an empty body with the session cookies attached.
///
/// # Errors
///
/// Returns `Error::Network` on transport failure only; any HTTP status is returned as-is.
#[instrument(skip(http, cookies), fields(site = %site))]
pub async fn fetch_digest(http: &Client, site: &TargetSite, cookies: &SessionCookies) -> Result<DigestResponse, Error> {
    let mut request = http
        .post(site.contextinfo_url())
        .header(header::CONTENT_LENGTH, 0);
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies.header_value());
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::Network(format!("contextinfo request failed: {e}")))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("failed to read contextinfo response: {e}")))?;

    tracing::debug!(status, bytes = body.len(), "contextinfo responded");

    Ok(DigestResponse { status, body })
}
