//! # Uploader Configuration
//!
//! Immutable configuration for the Drive to YouTube uploader.
//!
//! ## Overview
//!
//! Configuration is resolved once at startup from environment variables
//! (optionally seeded from a `.env` file) into an [`UploaderConfig`] value.
//! Components receive the parts they need through their constructors; no
//! component consults the environment on its own.
//!
//! Three ways to obtain a configuration:
//!
//! - [`UploaderConfig::from_env`] loads `.env` (if present) then reads the
//!   process environment.
//! - [`UploaderConfig::from_lookup`] reads keys through a caller-supplied
//!   function, which keeps tests away from process-global state.
//! - [`UploaderConfig::builder`] for programmatic construction.
//!
//! ## Validation
//!
//! Structural problems (a non-numeric `MAX_RETRIES`, an unknown privacy
//! status, a chunk size that is not a multiple of 256 KiB) are reported as
//! [`Error`] when the configuration is built. Environmental problems (missing
//! credential files, a half-configured Notion pair) are collected by
//! [`UploaderConfig::validate_environment`] into a [`ValidationReport`] so the
//! CLI can print all of them at once.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::UploaderConfig;
//!
//! let config = UploaderConfig::from_env()?;
//! let report = config.validate_environment();
//! if !report.is_ok() {
//!     for error in &report.errors {
//!         eprintln!("  - {}", error);
//!     }
//! }
//! ```

use crate::error::{Error, Result};
use bridge_traits::{LogLevel, PrivacyStatus};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Resumable upload chunks must be multiples of this size
pub const CHUNK_ALIGNMENT: u64 = 256 * 1024;

pub const DEFAULT_CHUNK_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_CATEGORY_ID: &str = "22";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_VIDEO_EXTENSIONS: &str = ".mp4,.mov,.avi,.mkv,.webm,.flv,.wmv";

pub const DRIVE_SCOPES: &[&str] = &["https://www.googleapis.com/auth/drive.readonly"];
pub const YOUTUBE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/youtube.readonly",
];

/// Environment keys whose values are masked when printed
const SENSITIVE_KEYS: &[&str] = &["NOTION_TOKEN", "GDRIVE_TOKEN", "YOUTUBE_TOKEN"];

/// Where OAuth tokens are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStoreKind {
    /// JSON file at the configured token path
    #[default]
    File,
    /// OS keychain via the `keyring` crate
    Keyring,
}

impl fmt::Display for TokenStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStoreKind::File => f.write_str("file"),
            TokenStoreKind::Keyring => f.write_str("keyring"),
        }
    }
}

impl FromStr for TokenStoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keyring" => Ok(TokenStoreKind::Keyring),
            other => Err(format!("expected 'file' or 'keyring', got '{}'", other)),
        }
    }
}

/// Immutable uploader configuration
#[derive(Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    // Google Drive
    pub gdrive_folder_id: String,
    pub gdrive_credentials_file: PathBuf,
    pub gdrive_token_file: PathBuf,

    // YouTube
    pub youtube_credentials_file: PathBuf,
    pub youtube_token_file: PathBuf,
    pub youtube_category_id: String,
    pub youtube_privacy: PrivacyStatus,
    pub youtube_default_tags: Vec<String>,

    // Notion
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub notion_version: String,

    // Local
    pub temp_download_path: PathBuf,
    pub processed_files_db: PathBuf,
    /// `None` disables the file log sink
    pub log_file: Option<PathBuf>,
    pub log_level: LogLevel,

    // Processing
    /// Retry bound for a single upload session
    pub max_retries: u32,
    /// Download and upload chunk size in bytes
    pub chunk_size: u64,
    /// Lowercase extensions including the leading dot
    pub video_extensions: Vec<String>,

    // Switches
    pub skip_notion: bool,
    pub delete_after_upload: bool,
    pub dry_run: bool,
    pub token_store: TokenStoreKind,
}

impl fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("gdrive_folder_id", &self.gdrive_folder_id)
            .field("processed_files_db", &self.processed_files_db)
            .field("temp_download_path", &self.temp_download_path)
            .field("notion_enabled", &self.notion_enabled())
            .field("max_retries", &self.max_retries)
            .field("chunk_size", &self.chunk_size)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            gdrive_folder_id: String::new(),
            gdrive_credentials_file: PathBuf::from("gdrive_credentials.json"),
            gdrive_token_file: PathBuf::from("gdrive_token.json"),
            youtube_credentials_file: PathBuf::from("youtube_credentials.json"),
            youtube_token_file: PathBuf::from("youtube_token.json"),
            youtube_category_id: DEFAULT_CATEGORY_ID.to_string(),
            youtube_privacy: PrivacyStatus::Private,
            youtube_default_tags: Vec::new(),
            notion_token: None,
            notion_database_id: None,
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            temp_download_path: PathBuf::from("./temp_videos"),
            processed_files_db: PathBuf::from("./processed_files.json"),
            log_file: Some(PathBuf::from("./upload_log.txt")),
            log_level: LogLevel::Info,
            max_retries: DEFAULT_MAX_RETRIES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            video_extensions: split_list(DEFAULT_VIDEO_EXTENSIONS)
                .into_iter()
                .map(|ext| normalize_extension(&ext))
                .collect(),
            skip_notion: false,
            delete_after_upload: true,
            dry_run: false,
            token_store: TokenStoreKind::File,
        }
    }
}

/// Outcome of [`UploaderConfig::validate_environment`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that prevent a run
    pub errors: Vec<String>,
    /// Problems worth mentioning that do not prevent a run
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl UploaderConfig {
    /// Creates a new builder seeded with the defaults
    pub fn builder() -> UploaderConfigBuilder {
        UploaderConfigBuilder::default()
    }

    /// Load `.env` (when present) and read the process environment
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("failed to read .env: {}", e))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration by querying `lookup` for each known key
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut builder = Self::builder();

        if let Some(value) = get("GDRIVE_FOLDER_ID") {
            builder = builder.gdrive_folder_id(value);
        }
        if let Some(value) = get("GDRIVE_CREDENTIALS_FILE") {
            builder = builder.gdrive_credentials_file(value);
        }
        if let Some(value) = get("GDRIVE_TOKEN_FILE") {
            builder = builder.gdrive_token_file(value);
        }
        if let Some(value) = get("YOUTUBE_CREDENTIALS_FILE") {
            builder = builder.youtube_credentials_file(value);
        }
        if let Some(value) = get("YOUTUBE_TOKEN_FILE") {
            builder = builder.youtube_token_file(value);
        }
        if let Some(value) = get("YOUTUBE_CATEGORY_ID") {
            builder = builder.youtube_category_id(value);
        }
        if let Some(value) = get("YOUTUBE_PRIVACY") {
            builder = builder.youtube_privacy(parse_value("YOUTUBE_PRIVACY", &value)?);
        }
        if let Some(value) = get("YOUTUBE_DEFAULT_TAGS") {
            builder = builder.youtube_default_tags(split_list(&value));
        }
        if let Some(value) = get("NOTION_TOKEN") {
            builder = builder.notion_token(value);
        }
        if let Some(value) = get("NOTION_DATABASE_ID") {
            builder = builder.notion_database_id(value);
        }
        if let Some(value) = get("NOTION_VERSION") {
            builder = builder.notion_version(value);
        }
        if let Some(value) = get("TEMP_DOWNLOAD_PATH") {
            builder = builder.temp_download_path(value);
        }
        if let Some(value) = get("PROCESSED_FILES_DB") {
            builder = builder.processed_files_db(value);
        }
        // An explicitly empty LOG_FILE disables the file sink
        match lookup("LOG_FILE") {
            Some(value) if value.trim().is_empty() => builder = builder.log_file(None::<PathBuf>),
            Some(value) => builder = builder.log_file(Some(value.trim())),
            None => {}
        }
        if let Some(value) = get("LOG_LEVEL") {
            builder = builder.log_level(parse_value("LOG_LEVEL", &value)?);
        }
        if let Some(value) = get("MAX_RETRIES") {
            builder = builder.max_retries(parse_value("MAX_RETRIES", &value)?);
        }
        if let Some(value) = get("CHUNK_SIZE") {
            builder = builder.chunk_size(parse_value("CHUNK_SIZE", &value)?);
        }
        if let Some(value) = get("VIDEO_EXTENSIONS") {
            builder = builder.video_extensions(split_list(&value));
        }
        if let Some(value) = get("SKIP_NOTION") {
            builder = builder.skip_notion(parse_flag(&value));
        }
        if let Some(value) = get("DELETE_AFTER_UPLOAD") {
            builder = builder.delete_after_upload(parse_flag(&value));
        }
        if let Some(value) = get("DRY_RUN") {
            builder = builder.dry_run(parse_flag(&value));
        }
        if let Some(value) = get("TOKEN_STORE") {
            builder = builder.token_store(parse_value("TOKEN_STORE", &value)?);
        }

        builder.build()
    }

    /// Structural validation, run by the builder
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size % CHUNK_ALIGNMENT != 0 {
            return Err(Error::InvalidValue {
                key: "CHUNK_SIZE".to_string(),
                message: format!(
                    "{} is not a positive multiple of {} bytes",
                    self.chunk_size, CHUNK_ALIGNMENT
                ),
            });
        }

        if self.video_extensions.is_empty() {
            return Err(Error::InvalidValue {
                key: "VIDEO_EXTENSIONS".to_string(),
                message: "at least one extension is required".to_string(),
            });
        }

        if self.youtube_category_id.is_empty()
            || !self.youtube_category_id.chars().all(|c| c.is_ascii_digit())
        {
            return Err(Error::InvalidValue {
                key: "YOUTUBE_CATEGORY_ID".to_string(),
                message: format!("'{}' is not a numeric category", self.youtube_category_id),
            });
        }

        Ok(())
    }

    /// Check the environment the configuration points at
    ///
    /// Missing folder ID and missing OAuth client files are errors. Notion
    /// misconfiguration and unknown video extensions are warnings.
    pub fn validate_environment(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.gdrive_folder_id.is_empty() {
            report.errors.push("GDRIVE_FOLDER_ID is not set".to_string());
        }

        if !self.gdrive_credentials_file.exists() {
            report.errors.push(format!(
                "Google Drive credentials file not found: {}",
                self.gdrive_credentials_file.display()
            ));
        }

        if !self.youtube_credentials_file.exists() {
            report.errors.push(format!(
                "YouTube credentials file not found: {}",
                self.youtube_credentials_file.display()
            ));
        }

        match (&self.notion_token, &self.notion_database_id) {
            (Some(_), None) => report
                .warnings
                .push("NOTION_TOKEN is set but NOTION_DATABASE_ID is missing".to_string()),
            (None, Some(_)) => report
                .warnings
                .push("NOTION_DATABASE_ID is set but NOTION_TOKEN is missing".to_string()),
            (None, None) if !self.skip_notion => report.warnings.push(
                "Notion credentials not configured. Set SKIP_NOTION=true to disable Notion integration"
                    .to_string(),
            ),
            _ => {}
        }

        for ext in &self.video_extensions {
            if mime_type_for_extension(ext).is_none() {
                report.warnings.push(format!(
                    "Unknown video extension '{}' will be ignored when listing",
                    ext
                ));
            }
        }

        report
    }

    /// Whether the notifier should run
    pub fn notion_enabled(&self) -> bool {
        !self.skip_notion && self.notion_token.is_some() && self.notion_database_id.is_some()
    }

    /// MIME types accepted by the source lister, derived from the extensions
    pub fn mime_types(&self) -> Vec<String> {
        let mut mime_types: Vec<String> = Vec::new();
        for ext in &self.video_extensions {
            if let Some(mime) = mime_type_for_extension(ext) {
                if !mime_types.iter().any(|m| m == mime) {
                    mime_types.push(mime.to_string());
                }
            }
        }
        mime_types
    }

    /// Copy with a different source folder (CLI `--folder`)
    pub fn with_folder(mut self, folder: &str) -> Self {
        self.gdrive_folder_id = normalize_folder_id(folder);
        self
    }

    /// Copy with dry-run forced on
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Every key with a display value; secrets are masked
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let path = |p: &Path| display_or_unset(&p.display().to_string());
        let flag = |b: bool| (if b { "Yes" } else { "No" }).to_string();
        let list = |items: &[String]| {
            if items.is_empty() {
                "(empty)".to_string()
            } else {
                items.join(", ")
            }
        };

        let entries = vec![
            ("GDRIVE_FOLDER_ID", display_or_unset(&self.gdrive_folder_id)),
            ("GDRIVE_CREDENTIALS_FILE", path(&self.gdrive_credentials_file)),
            ("GDRIVE_TOKEN_FILE", path(&self.gdrive_token_file)),
            ("GDRIVE_SCOPES", DRIVE_SCOPES.join(", ")),
            ("YOUTUBE_CREDENTIALS_FILE", path(&self.youtube_credentials_file)),
            ("YOUTUBE_TOKEN_FILE", path(&self.youtube_token_file)),
            ("YOUTUBE_SCOPES", YOUTUBE_SCOPES.join(", ")),
            ("YOUTUBE_CATEGORY_ID", self.youtube_category_id.clone()),
            ("YOUTUBE_PRIVACY", self.youtube_privacy.to_string()),
            ("YOUTUBE_DEFAULT_TAGS", list(&self.youtube_default_tags)),
            (
                "NOTION_TOKEN",
                self.notion_token.clone().unwrap_or_default(),
            ),
            (
                "NOTION_DATABASE_ID",
                display_or_unset(self.notion_database_id.as_deref().unwrap_or("")),
            ),
            ("NOTION_VERSION", self.notion_version.clone()),
            ("TEMP_DOWNLOAD_PATH", path(&self.temp_download_path)),
            ("PROCESSED_FILES_DB", path(&self.processed_files_db)),
            (
                "LOG_FILE",
                self.log_file
                    .as_deref()
                    .map(path)
                    .unwrap_or_else(|| "(not set)".to_string()),
            ),
            ("LOG_LEVEL", self.log_level.as_str().to_ascii_uppercase()),
            ("MAX_RETRIES", self.max_retries.to_string()),
            ("CHUNK_SIZE", self.chunk_size.to_string()),
            ("VIDEO_EXTENSIONS", list(&self.video_extensions)),
            ("SKIP_NOTION", flag(self.skip_notion)),
            ("DELETE_AFTER_UPLOAD", flag(self.delete_after_upload)),
            ("DRY_RUN", flag(self.dry_run)),
            ("TOKEN_STORE", self.token_store.to_string()),
        ];

        entries
            .into_iter()
            .map(|(key, value)| {
                if SENSITIVE_KEYS.iter().any(|s| key.contains(s)) {
                    (key, mask_secret(&value))
                } else {
                    (key, value)
                }
            })
            .collect()
    }
}

/// Builder for [`UploaderConfig`]
#[derive(Debug, Default)]
pub struct UploaderConfigBuilder {
    overrides: UploaderConfigOverrides,
}

#[derive(Debug, Default)]
struct UploaderConfigOverrides {
    gdrive_folder_id: Option<String>,
    gdrive_credentials_file: Option<PathBuf>,
    gdrive_token_file: Option<PathBuf>,
    youtube_credentials_file: Option<PathBuf>,
    youtube_token_file: Option<PathBuf>,
    youtube_category_id: Option<String>,
    youtube_privacy: Option<PrivacyStatus>,
    youtube_default_tags: Option<Vec<String>>,
    notion_token: Option<String>,
    notion_database_id: Option<String>,
    notion_version: Option<String>,
    temp_download_path: Option<PathBuf>,
    processed_files_db: Option<PathBuf>,
    log_file: Option<Option<PathBuf>>,
    log_level: Option<LogLevel>,
    max_retries: Option<u32>,
    chunk_size: Option<u64>,
    video_extensions: Option<Vec<String>>,
    skip_notion: Option<bool>,
    delete_after_upload: Option<bool>,
    dry_run: Option<bool>,
    token_store: Option<TokenStoreKind>,
}

impl UploaderConfigBuilder {
    /// Folder ID or a Drive folder URL
    pub fn gdrive_folder_id(mut self, folder: impl AsRef<str>) -> Self {
        self.overrides.gdrive_folder_id = Some(normalize_folder_id(folder.as_ref()));
        self
    }

    pub fn gdrive_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.gdrive_credentials_file = Some(path.into());
        self
    }

    pub fn gdrive_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.gdrive_token_file = Some(path.into());
        self
    }

    pub fn youtube_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.youtube_credentials_file = Some(path.into());
        self
    }

    pub fn youtube_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.youtube_token_file = Some(path.into());
        self
    }

    pub fn youtube_category_id(mut self, category: impl Into<String>) -> Self {
        self.overrides.youtube_category_id = Some(category.into());
        self
    }

    pub fn youtube_privacy(mut self, privacy: PrivacyStatus) -> Self {
        self.overrides.youtube_privacy = Some(privacy);
        self
    }

    pub fn youtube_default_tags(mut self, tags: Vec<String>) -> Self {
        self.overrides.youtube_default_tags = Some(tags);
        self
    }

    pub fn notion_token(mut self, token: impl Into<String>) -> Self {
        self.overrides.notion_token = Some(token.into());
        self
    }

    pub fn notion_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.overrides.notion_database_id = Some(database_id.into());
        self
    }

    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.overrides.notion_version = Some(version.into());
        self
    }

    pub fn temp_download_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.temp_download_path = Some(path.into());
        self
    }

    pub fn processed_files_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.processed_files_db = Some(path.into());
        self
    }

    /// `None` disables the file log sink
    pub fn log_file<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.overrides.log_file = Some(path.map(Into::into));
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.overrides.log_level = Some(level);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.overrides.max_retries = Some(retries);
        self
    }

    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.overrides.chunk_size = Some(bytes);
        self
    }

    /// Extensions with or without the leading dot; case is ignored
    pub fn video_extensions(mut self, extensions: Vec<String>) -> Self {
        self.overrides.video_extensions = Some(extensions);
        self
    }

    pub fn skip_notion(mut self, skip: bool) -> Self {
        self.overrides.skip_notion = Some(skip);
        self
    }

    pub fn delete_after_upload(mut self, delete: bool) -> Self {
        self.overrides.delete_after_upload = Some(delete);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.overrides.dry_run = Some(dry_run);
        self
    }

    pub fn token_store(mut self, kind: TokenStoreKind) -> Self {
        self.overrides.token_store = Some(kind);
        self
    }

    /// Apply overrides on top of the defaults and validate
    pub fn build(self) -> Result<UploaderConfig> {
        let o = self.overrides;
        let defaults = UploaderConfig::default();

        let config = UploaderConfig {
            gdrive_folder_id: o.gdrive_folder_id.unwrap_or(defaults.gdrive_folder_id),
            gdrive_credentials_file: o
                .gdrive_credentials_file
                .unwrap_or(defaults.gdrive_credentials_file),
            gdrive_token_file: o.gdrive_token_file.unwrap_or(defaults.gdrive_token_file),
            youtube_credentials_file: o
                .youtube_credentials_file
                .unwrap_or(defaults.youtube_credentials_file),
            youtube_token_file: o.youtube_token_file.unwrap_or(defaults.youtube_token_file),
            youtube_category_id: o
                .youtube_category_id
                .unwrap_or(defaults.youtube_category_id),
            youtube_privacy: o.youtube_privacy.unwrap_or(defaults.youtube_privacy),
            youtube_default_tags: o
                .youtube_default_tags
                .unwrap_or(defaults.youtube_default_tags),
            notion_token: o.notion_token.or(defaults.notion_token),
            notion_database_id: o.notion_database_id.or(defaults.notion_database_id),
            notion_version: o.notion_version.unwrap_or(defaults.notion_version),
            temp_download_path: o.temp_download_path.unwrap_or(defaults.temp_download_path),
            processed_files_db: o.processed_files_db.unwrap_or(defaults.processed_files_db),
            log_file: o.log_file.unwrap_or(defaults.log_file),
            log_level: o.log_level.unwrap_or(defaults.log_level),
            max_retries: o.max_retries.unwrap_or(defaults.max_retries),
            chunk_size: o.chunk_size.unwrap_or(defaults.chunk_size),
            video_extensions: o
                .video_extensions
                .map(|exts| {
                    exts.iter()
                        .filter(|e| !e.trim().is_empty())
                        .map(|e| normalize_extension(e))
                        .collect()
                })
                .unwrap_or(defaults.video_extensions),
            skip_notion: o.skip_notion.unwrap_or(defaults.skip_notion),
            delete_after_upload: o
                .delete_after_upload
                .unwrap_or(defaults.delete_after_upload),
            dry_run: o.dry_run.unwrap_or(defaults.dry_run),
            token_store: o.token_store.unwrap_or(defaults.token_store),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Accept a bare folder ID or any Drive folder URL and return the ID
///
/// Handles `.../folders/<id>`, `...?id=<id>` and bare IDs; surrounding
/// whitespace is ignored.
pub fn normalize_folder_id(input: &str) -> String {
    let trimmed = input.trim();

    let Ok(url) = url::Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    if let Some(segments) = url.path_segments() {
        let segments: Vec<&str> = segments.collect();
        if let Some(pos) = segments.iter().position(|s| *s == "folders") {
            if let Some(id) = segments.get(pos + 1).filter(|s| !s.is_empty()) {
                return (*id).to_string();
            }
        }
    }

    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| trimmed.to_string())
}

/// MIME type Drive reports for a video extension
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match normalize_extension(ext).as_str() {
        ".mp4" => Some("video/mp4"),
        ".mov" => Some("video/quicktime"),
        ".avi" => Some("video/x-msvideo"),
        ".mkv" => Some("video/x-matroska"),
        ".webm" => Some("video/webm"),
        ".flv" => Some("video/x-flv"),
        ".wmv" => Some("video/x-ms-wmv"),
        _ => None,
    }
}

/// `"***"` followed by the last four characters, or `(not set)`
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count == 0 {
        "(not set)".to_string()
    } else if count > 4 {
        let tail: String = value.chars().skip(count - 4).collect();
        format!("***{}", tail)
    } else {
        "***".to_string()
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn display_or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else {
        value.to_string()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| Error::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
