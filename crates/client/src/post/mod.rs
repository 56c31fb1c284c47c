//! Remote post of form submissions to a SharePoint list.
//!
//! One [`ListPostHandler::remote_post`] call resolves the URL configured for
//! the submission state, authenticates, converts the submission into a list
//! item, runs the payload hooks and hands the result to a [`RemotePoster`].

pub mod deliver;
pub mod payload;

pub use deliver::{DIGEST_HEADER, ListPostRequest, PostResponse, RemotePoster, ReqwestPoster};
pub use payload::{ODATA_CONTENT_TYPE, PayloadHook, build_payload, is_truthy};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use spfed_core::config::DEFAULT_SUB_SITE;
use spfed_core::{CredentialStore, Error};
use tracing::instrument;

use crate::auth::AuthClient;
use crate::session::SharepointSession;

/// Save operation that triggered the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    New,
    DraftCreated,
    DraftUpdated,
    Completed,
    Updated,
    Converted,
    Deleted,
}

impl SubmissionState {
    pub const ALL: [SubmissionState; 7] = [
        SubmissionState::New,
        SubmissionState::DraftCreated,
        SubmissionState::DraftUpdated,
        SubmissionState::Completed,
        SubmissionState::Updated,
        SubmissionState::Converted,
        SubmissionState::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::New => "new",
            SubmissionState::DraftCreated => "draft_created",
            SubmissionState::DraftUpdated => "draft_updated",
            SubmissionState::Completed => "completed",
            SubmissionState::Updated => "updated",
            SubmissionState::Converted => "converted",
            SubmissionState::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown submission state: {0}")]
pub struct UnknownState(String);

impl FromStr for SubmissionState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// A saved form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    pub uuid: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Form the submission belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormContext {
    /// Form identifier
    #[serde(default)]
    pub id: String,

    /// Submitted asynchronously; errors go back to the caller instead of a redirect
    #[serde(default)]
    pub ajax: bool,

    /// Current language code, sent as `Language`
    #[serde(default)]
    pub langcode: String,

    /// Field name → element type (`checkbox`, `textfield`, ...)
    #[serde(default)]
    pub element_types: HashMap<String, String>,
}

impl FormContext {
    pub fn element_type(&self, key: &str) -> Option<&str> {
        self.element_types.get(key).map(String::as_str)
    }
}

/// Per-form handler settings.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// List items endpoint per submission state; unset states are not posted
    pub state_urls: HashMap<SubmissionState, String>,
    pub credential_key: String,
    /// SharePoint list name, used in `__metadata.type`
    pub list_name: String,
    /// Submission field → SharePoint field
    pub mapping: HashMap<String, String>,
    pub sub_site: String,
}

impl HandlerConfig {
    pub fn new(credential_key: impl Into<String>, list_name: impl Into<String>) -> Self {
        Self {
            state_urls: HashMap::new(),
            credential_key: credential_key.into(),
            list_name: list_name.into(),
            mapping: HashMap::new(),
            sub_site: DEFAULT_SUB_SITE.to_string(),
        }
    }

    pub fn with_state_url(mut self, state: SubmissionState, url: impl Into<String>) -> Self {
        self.state_urls.insert(state, url.into());
        self
    }

    pub fn with_mapping(mut self, mapping: HashMap<String, String>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_sub_site(mut self, sub_site: impl Into<String>) -> Self {
        self.sub_site = sub_site.into();
        self
    }
}

/// Result of a remote post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// No URL configured for the submission state.
    Skipped,
    /// Credentials could not be resolved; send the user back to the form with `message`.
    Redirect { message: String },
    Posted(PostResponse),
}

/// Posts submissions of one form to its SharePoint list.
pub struct ListPostHandler {
    config: HandlerConfig,
    auth: AuthClient,
    store: Arc<dyn CredentialStore>,
    poster: Arc<dyn RemotePoster>,
    hooks: Vec<Box<dyn PayloadHook>>,
}

impl ListPostHandler {
    pub fn new(
        config: HandlerConfig, auth: AuthClient, store: Arc<dyn CredentialStore>, poster: Arc<dyn RemotePoster>,
    ) -> Self {
        Self { config, auth, store, poster, hooks: Vec::new() }
    }

    /// Register a payload hook. Hooks run in registration order.
    pub fn with_hook(mut self, hook: impl PayloadHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Post `submission` for `state`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidUrl` if the configured state URL does not parse
    /// - `Error::Credential` for asynchronous forms whose credentials cannot be
    ///   resolved (other forms get [`PostOutcome::Redirect`])
    /// - `Error::Network` / `Error::Auth` / `Error::Parse` from authentication
    /// - `Error::Delivery` from the poster
    #[instrument(skip(self, submission, form), fields(state = %state, form = %form.id))]
    pub async fn remote_post(
        &self, state: SubmissionState, submission: &Submission, form: &FormContext,
    ) -> Result<PostOutcome, Error> {
        let Some(url) = self.config.state_urls.get(&state).filter(|url| !url.trim().is_empty()) else {
            tracing::debug!("no URL configured for state, skipping");
            return Ok(PostOutcome::Skipped);
        };

        let mut session =
            SharepointSession::new(self.auth.clone(), Arc::clone(&self.store)).with_sub_site(&self.config.sub_site);
        session.set_target_url(url)?;

        if let Err(err) = session.set_credential_key(&self.config.credential_key).await {
            if !matches!(err, Error::Credential(_)) {
                return Err(err);
            }
            tracing::error!(key_id = %self.config.credential_key, "{}", err.message());
            if form.ajax {
                return Err(err);
            }
            return Ok(PostOutcome::Redirect { message: err.message() });
        }

        let auth = session.auth_data().await?;

        let mut payload = build_payload(&self.config.list_name, submission, form, &self.config.mapping);
        for hook in &self.hooks {
            hook.alter(&mut payload, form);
        }

        let request = ListPostRequest {
            url: url.clone(),
            digest: auth.digest,
            cookie: auth.cookies.header_value(),
            body: Value::Object(payload),
        };

        let response = self.poster.post(request).await?;
        tracing::info!(status = response.status, "submission posted");

        Ok(PostOutcome::Posted(response))
    }
}
