//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use spfed_client::{
    AuthClient, AuthConfig, FormContext, HandlerConfig, ListPostHandler, PostOutcome, ReqwestPoster, SessionCache,
    SharepointSession, Submission, SubmissionState,
};
use spfed_core::credentials::{ChainedCredentialStore, EnvCredentialStore, StaticCredentialStore};
use spfed_core::{AppConfig, CacheBackend, CredentialStore, MemoryCache, SqliteCache};

/// Contents of a `post` input file.
#[derive(Debug, Deserialize)]
struct PostInput {
    #[serde(flatten)]
    submission: Submission,
    #[serde(default)]
    form: FormContext,
}

async fn session_cache(config: &AppConfig) -> Result<Arc<SessionCache>> {
    let backend: Arc<dyn CacheBackend> = match &config.cache_path {
        Some(path) => Arc::new(
            SqliteCache::open(path)
                .await
                .with_context(|| format!("failed to open session cache at {}", path.display()))?,
        ),
        None => Arc::new(MemoryCache::new()),
    };

    Ok(Arc::new(SessionCache::new(backend).with_cache_id(&config.cache_id)))
}

/// Configured credentials first, then `SPFED_KEY_*` variables.
fn credential_store(config: &AppConfig) -> Arc<dyn CredentialStore> {
    Arc::new(ChainedCredentialStore::new(vec![
        Arc::new(StaticCredentialStore::new(config.credentials.clone())),
        Arc::new(EnvCredentialStore::default()),
    ]))
}

async fn auth_client(config: &AppConfig) -> Result<AuthClient> {
    let cache = session_cache(config).await?;
    Ok(AuthClient::new(AuthConfig::from(config), cache)?)
}

pub async fn auth(config: &AppConfig, force: bool, json: bool) -> Result<()> {
    let site_url = config.require_site_url()?;
    let key_id = config.require_credential_key()?;

    let mut session = SharepointSession::new(auth_client(config).await?, credential_store(config))
        .with_sub_site(&config.sub_site);
    session.set_target_url(site_url)?;
    session.set_credential_key(key_id).await?;

    let auth = if force { session.auth_data_refreshed().await? } else { session.auth_data().await? };

    if json {
        let output = serde_json::json!({
            "cookie": auth.cookies.header_value(),
            "digest": auth.digest,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Cookie: {}", auth.cookies.header_value());
        println!("X-RequestDigest: {}", auth.digest);
    }

    Ok(())
}

pub async fn logout(config: &AppConfig) -> Result<()> {
    auth_client(config).await?.invalidate().await?;
    println!("Cleared cached session {}", config.cache_id);
    Ok(())
}

pub async fn post(config: &AppConfig, file: &Path, state: SubmissionState, ajax: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let PostInput { submission, mut form } =
        serde_json::from_str(&raw).with_context(|| format!("invalid submission file {}", file.display()))?;
    form.ajax |= ajax;

    let handler_config = HandlerConfig::new(config.require_credential_key()?, config.require_list_name()?)
        .with_state_url(state, config.require_site_url()?)
        .with_mapping(config.mapping.clone())
        .with_sub_site(&config.sub_site);

    let poster = ReqwestPoster::new(&AuthConfig::from(config))?;
    let handler =
        ListPostHandler::new(handler_config, auth_client(config).await?, credential_store(config), Arc::new(poster));

    match handler.remote_post(state, &submission, &form).await? {
        PostOutcome::Skipped => println!("Nothing to post for state {state}"),
        PostOutcome::Redirect { message } => anyhow::bail!("{message}"),
        PostOutcome::Posted(response) => {
            println!("Posted submission {} (HTTP {})", submission.uuid, response.status);
            tracing::debug!(body = %response.body, "list post response");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_input_with_form() {
        let input: PostInput = serde_json::from_str(
            r#"{
                "uuid": "abc",
                "data": {"first_name": "Jane"},
                "form": {"id": "referral", "langcode": "en", "element_types": {"consent": "checkbox"}}
            }"#,
        )
        .unwrap();

        assert_eq!(input.submission.uuid, "abc");
        assert_eq!(input.form.langcode, "en");
        assert_eq!(input.form.element_type("consent"), Some("checkbox"));
        assert!(!input.form.ajax);
    }

    #[test]
    fn test_post_input_without_form() {
        let input: PostInput = serde_json::from_str(r#"{"uuid": "abc", "data": {}}"#).unwrap();
        assert!(input.form.id.is_empty());
    }

    #[tokio::test]
    async fn test_configured_credentials_resolve_first() {
        let mut config = AppConfig::default();
        config.credentials.insert(
            "sp".to_string(),
            [("username".to_string(), "alice".to_string()), ("password".to_string(), "pw".to_string())].into(),
        );

        let store = credential_store(&config);
        let creds = spfed_core::resolve_credentials(store.as_ref(), "sp").await.unwrap();
        assert_eq!(creds.username, "alice");
    }

    #[tokio::test]
    async fn test_logout_clears_persisted_session() {
        let dir = std::env::temp_dir().join(format!("spfed-logout-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = AppConfig { cache_path: Some(dir.join("session.db")), ..Default::default() };

        let mut cookies = spfed_core::SessionCookies::new();
        cookies.insert("FedAuth", "FedAuth=abc");
        session_cache(&config).await.unwrap().set(&cookies).await.unwrap();

        logout(&config).await.unwrap();

        assert!(session_cache(&config).await.unwrap().get().await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_memory_cache_without_path() {
        let config = AppConfig { cache_id: "test:slot".to_string(), ..Default::default() };
        let cache = session_cache(&config).await.unwrap();
        assert_eq!(cache.cache_id(), "test:slot");
        assert!(cache.get().await.unwrap().is_none());
    }
}
