//! Delivery of a list item to SharePoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use spfed_core::Error;
use tracing::instrument;

use super::payload::ODATA_CONTENT_TYPE;
use crate::auth::AuthConfig;

/// Header carrying the form digest.
pub const DIGEST_HEADER: &str = "X-RequestDigest";

/// A fully prepared list-item POST.
#[derive(Debug, Clone)]
pub struct ListPostRequest {
    /// List items endpoint
    pub url: String,
    /// `X-RequestDigest` value
    pub digest: String,
    /// `Cookie` header value
    pub cookie: String,
    /// JSON body
    pub body: Value,
}

impl ListPostRequest {
    /// Headers sent alongside the body, in order.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (DIGEST_HEADER, self.digest.as_str()),
            ("Content-Type", ODATA_CONTENT_TYPE),
            ("Cookie", self.cookie.as_str()),
        ]
    }
}

/// Outcome of a delivered post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResponse {
    pub status: u16,
    pub body: String,
}

/// Sends prepared list items.
#[async_trait]
pub trait RemotePoster: Send + Sync {
    async fn post(&self, request: ListPostRequest) -> Result<PostResponse, Error>;
}

/// [`RemotePoster`] over reqwest.
#[derive(Clone)]
pub struct ReqwestPoster {
    http: Client,
}

impl ReqwestPoster {
    pub fn new(config: &AuthConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl RemotePoster for ReqwestPoster {
    /// # Errors
    ///
    /// Returns `Error::Delivery` on transport failure or a non-2xx status.
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn post(&self, request: ListPostRequest) -> Result<PostResponse, Error> {
        let body = serde_json::to_vec(&request.body)?;

        let mut builder = self.http.post(&request.url);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let response = builder
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("list post failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Delivery(format!("failed to read list post response: {e}")))?;

        tracing::debug!(status = status.as_u16(), "list post responded");

        if !status.is_success() {
            return Err(Error::Delivery(format!("list post returned status {}", status.as_u16())));
        }

        Ok(PostResponse { status: status.as_u16(), body: text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_headers() {
        let request = ListPostRequest {
            url: "https://contoso.sharepoint.com/_api/web/lists".into(),
            digest: "0x1234,01 Jan 2024".into(),
            cookie: "rtFa=xyz; FedAuth=abc".into(),
            body: json!({}),
        };

        let headers = request.headers();
        assert_eq!(headers[0], ("X-RequestDigest", "0x1234,01 Jan 2024"));
        assert_eq!(headers[1], ("Content-Type", "application/json;odata=verbose"));
        assert_eq!(headers[2], ("Cookie", "rtFa=xyz; FedAuth=abc"));
    }
}
