//! Builds the concrete services from an [`UploaderConfig`]

use anyhow::{bail, Context, Result};
use bridge_desktop::ReqwestHttpClient;
use bridge_traits::http::HttpClient;
use core_auth::{
    CredentialManager, FileTokenStore, OAuthConfig, OAuthFlowManager, ProviderKind, TokenStore,
};
use core_runtime::config::{TokenStoreKind, UploaderConfig, DRIVE_SCOPES, YOUTUBE_SCOPES};
use core_uploader::{Ledger, PipelineConfig, UploadPipeline};
use provider_google_drive::GoogleDriveConnector;
use provider_notion::{NotionConfig, NotionNotifier};
use provider_youtube::{MetadataDefaults, YouTubeConfig, YouTubeConnector};
use std::path::Path;
use std::sync::Arc;

use crate::progress::TerminalProgress;

pub fn http_client() -> Result<Arc<dyn HttpClient>> {
    let client = ReqwestHttpClient::new().context("Failed to create HTTP client")?;
    Ok(Arc::new(client))
}

#[cfg(feature = "keyring")]
fn keyring_store(provider: ProviderKind) -> Result<Arc<dyn TokenStore>> {
    use bridge_desktop::KeyringSecureStore;
    use core_auth::SecureTokenStore;

    Ok(Arc::new(SecureTokenStore::new(
        Arc::new(KeyringSecureStore::new()),
        provider,
    )))
}

#[cfg(not(feature = "keyring"))]
fn keyring_store(_provider: ProviderKind) -> Result<Arc<dyn TokenStore>> {
    bail!("TOKEN_STORE=keyring requires drive-uploader to be built with the `keyring` feature")
}

fn token_store(
    config: &UploaderConfig,
    provider: ProviderKind,
    token_file: &Path,
) -> Result<Arc<dyn TokenStore>> {
    match config.token_store {
        TokenStoreKind::File => Ok(Arc::new(FileTokenStore::new(token_file))),
        TokenStoreKind::Keyring => keyring_store(provider),
    }
}

/// Credential manager for one Google API, built from its client secrets file
pub fn credentials(
    config: &UploaderConfig,
    provider: ProviderKind,
    http: Arc<dyn HttpClient>,
) -> Result<Arc<CredentialManager>> {
    let (secrets_file, token_file, scopes) = match provider {
        ProviderKind::GoogleDrive => (
            &config.gdrive_credentials_file,
            &config.gdrive_token_file,
            DRIVE_SCOPES,
        ),
        ProviderKind::YouTube => (
            &config.youtube_credentials_file,
            &config.youtube_token_file,
            YOUTUBE_SCOPES,
        ),
    };

    let oauth = OAuthConfig::from_client_secrets_file(provider, secrets_file, scopes)
        .with_context(|| format!("Failed to load {} credentials", provider.display_name()))?;
    let flow = OAuthFlowManager::new(oauth, http);
    let store = token_store(config, provider, token_file)?;

    Ok(Arc::new(CredentialManager::new(flow, store)))
}

/// Credentials that must already have been authorized through `--setup`
pub async fn authorized_credentials(
    config: &UploaderConfig,
    provider: ProviderKind,
    http: Arc<dyn HttpClient>,
) -> Result<Arc<CredentialManager>> {
    let manager = credentials(config, provider, http)?;
    if !manager.is_authorized().await? {
        bail!(
            "{} is not authorized yet. Run `drive-uploader --setup` first",
            provider.display_name()
        );
    }
    Ok(manager)
}

pub fn youtube_config(config: &UploaderConfig) -> YouTubeConfig {
    YouTubeConfig {
        defaults: MetadataDefaults {
            category_id: config.youtube_category_id.clone(),
            privacy: config.youtube_privacy,
            tags: config.youtube_default_tags.clone(),
        },
        chunk_size: config.chunk_size,
        max_retries: config.max_retries,
        ..YouTubeConfig::default()
    }
}

pub fn notion_config(config: &UploaderConfig) -> Option<NotionConfig> {
    if !config.notion_enabled() {
        return None;
    }
    Some(NotionConfig {
        token: config.notion_token.clone()?,
        database_id: config.notion_database_id.clone()?,
        version: config.notion_version.clone(),
    })
}

pub async fn youtube(config: &UploaderConfig, http: Arc<dyn HttpClient>) -> Result<YouTubeConnector> {
    let credentials = authorized_credentials(config, ProviderKind::YouTube, http.clone()).await?;
    Ok(YouTubeConnector::new(http, credentials, youtube_config(config)))
}

pub async fn drive(
    config: &UploaderConfig,
    http: Arc<dyn HttpClient>,
) -> Result<GoogleDriveConnector> {
    let credentials =
        authorized_credentials(config, ProviderKind::GoogleDrive, http.clone()).await?;
    Ok(GoogleDriveConnector::new(http, credentials).with_chunk_size(config.chunk_size))
}

pub fn ledger(config: &UploaderConfig) -> Result<Ledger> {
    Ledger::open(&config.processed_files_db).context("Failed to open processed files database")
}

/// Everything the process, list and retry commands need
pub async fn pipeline(config: &UploaderConfig) -> Result<UploadPipeline> {
    let http = http_client()?;
    let source = drive(config, http.clone()).await?;
    let publisher = youtube(config, http.clone()).await?;
    let notifier = NotionNotifier::new(http, notion_config(config));

    Ok(UploadPipeline::new(
        PipelineConfig::from(config),
        Arc::new(source),
        Arc::new(publisher),
        Arc::new(notifier),
        ledger(config)?,
    )
    .with_progress(Arc::new(TerminalProgress::new())))
}
