//! Target site parsing.
//!
//! Every auth call is built relative to `scheme://host/`, so the path, query
//! and fragment of the configured URL are discarded up front.

use std::fmt;

use spfed_core::config::DEFAULT_SUB_SITE;

/// Error type for target URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SiteError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<SiteError> for spfed_core::Error {
    fn from(err: SiteError) -> Self {
        spfed_core::Error::InvalidUrl(err.to_string())
    }
}

/// SharePoint site root plus the sub-site serving `contextinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSite {
    scheme: String,
    host: String,
    sub_site: String,
}

impl TargetSite {
    /// Parse a full SharePoint URL down to its site root.
    ///
    /// Normalization steps:
    /// 1. Trim leading/trailing whitespace
    /// 2. Default scheme to https:// if missing
    /// 3. Lowercase the host, keep a non-default port
    /// 4. Drop path, query and fragment
    pub fn parse(input: &str) -> Result<Self, SiteError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(SiteError::Empty);
        }

        let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

        let parsed = url::Url::parse(&url_str).map_err(|e| SiteError::InvalidUrl(e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(SiteError::UnsupportedScheme(scheme.to_string())),
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SiteError::MissingHost(trimmed.to_string()))?
            .to_lowercase();

        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        Ok(Self { scheme: parsed.scheme().to_string(), host, sub_site: DEFAULT_SUB_SITE.to_string() })
    }

    /// Replace the sub-site path used by the digest endpoint.
    pub fn with_sub_site(mut self, sub_site: &str) -> Self {
        self.sub_site = sub_site.trim().trim_matches('/').to_string();
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host, including the port when one was given.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn sub_site(&self) -> &str {
        &self.sub_site
    }

    /// `scheme://host/`
    pub fn base_url(&self) -> String {
        format!("{}://{}/", self.scheme, self.host)
    }

    /// Federated sign-in endpoint that trades a security token for cookies.
    pub fn signin_url(&self) -> String {
        format!("{}_forms/default.aspx?wa=wsignin1.0", self.base_url())
    }

    /// REST endpoint returning the form digest.
    pub fn contextinfo_url(&self) -> String {
        if self.sub_site.is_empty() {
            format!("{}_api/contextinfo", self.base_url())
        } else {
            format!("{}{}/_api/contextinfo", self.base_url(), self.sub_site)
        }
    }
}

impl fmt::Display for TargetSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/", self.scheme, self.host)
    }
}
