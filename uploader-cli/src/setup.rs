//! First-run setup: `.env` generation and OAuth authorization

use anyhow::{Context, Result};
use bridge_traits::PrivacyStatus;
use chrono::{DateTime, Local};
use core_auth::ProviderKind;
use core_runtime::UploaderConfig;
use inquire::{Confirm, Select, Text};
use std::path::Path;

use crate::context;

pub const ENV_TEMPLATE: &str = "\
# Google Drive to YouTube Uploader Configuration
# Copy this file to .env and fill in your values

# ==== REQUIRED SETTINGS ====

# Google Drive folder ID to monitor for videos
# You can use either just the folder ID or the full URL
GDRIVE_FOLDER_ID=

# ==== GOOGLE CREDENTIALS ====

# OAuth client secrets downloaded from Google Cloud Console
GDRIVE_CREDENTIALS_FILE=gdrive_credentials.json
YOUTUBE_CREDENTIALS_FILE=youtube_credentials.json

# ==== NOTION SETTINGS (Optional) ====

# Integration token from https://www.notion.so/my-integrations
NOTION_TOKEN=

# Notion database ID (from the database URL or share link)
NOTION_DATABASE_ID=

# Skip Notion integration entirely (true/false)
SKIP_NOTION=false

# ==== YOUTUBE SETTINGS ====

# Privacy setting for uploaded videos: private, unlisted, or public
YOUTUBE_PRIVACY=private

# YouTube category ID (22 = People & Blogs)
YOUTUBE_CATEGORY_ID=22

# Default tags for videos (comma-separated)
YOUTUBE_DEFAULT_TAGS=

# ==== PROCESSING SETTINGS ====

TEMP_DOWNLOAD_PATH=./temp_videos
PROCESSED_FILES_DB=./processed_files.json
LOG_FILE=./upload_log.txt
MAX_RETRIES=3

# Chunk size for uploads/downloads in bytes (multiple of 256 KiB, default 50 MiB)
CHUNK_SIZE=52428800

# Delete local files after upload (true/false)
DELETE_AFTER_UPLOAD=true

# ==== ADVANCED SETTINGS ====

# OAuth token storage: file or keyring
TOKEN_STORE=file
GDRIVE_TOKEN_FILE=gdrive_token.json
YOUTUBE_TOKEN_FILE=youtube_token.json

NOTION_VERSION=2022-06-28
VIDEO_EXTENSIONS=.mp4,.mov,.avi,.mkv,.webm,.flv,.wmv

# Logging level: DEBUG, INFO, WARNING, ERROR, CRITICAL
LOG_LEVEL=INFO

# List videos without processing (true/false)
DRY_RUN=false
";

const NOTION_PROPERTIES: &str = "\
     - Title (Title)
     - File Size (Number)
     - Google Drive Link (URL)
     - YouTube URL (URL)
     - YouTube ID (Text)
     - Status (Select)
     - Upload Date (Date)
     - Error Message (Text)";

/// Values collected by the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvAnswers {
    pub folder: Option<String>,
    pub gdrive_credentials: String,
    pub youtube_credentials: String,
    pub privacy: PrivacyStatus,
    pub category_id: String,
    pub tags: Option<String>,
    /// `None` when Notion is skipped
    pub notion: Option<NotionAnswers>,
    pub delete_after_upload: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionAnswers {
    pub token: Option<String>,
    pub database_id: Option<String>,
}

impl Default for EnvAnswers {
    fn default() -> Self {
        Self {
            folder: None,
            gdrive_credentials: "gdrive_credentials.json".to_string(),
            youtube_credentials: "youtube_credentials.json".to_string(),
            privacy: PrivacyStatus::Private,
            category_id: "22".to_string(),
            tags: None,
            notion: None,
            delete_after_upload: true,
        }
    }
}

/// `.env` contents for the given answers
pub fn render_env(answers: &EnvAnswers, generated_at: DateTime<Local>) -> String {
    let mut lines = vec![
        "# Generated by setup wizard".to_string(),
        format!("# {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];

    if let Some(folder) = &answers.folder {
        lines.push(format!("GDRIVE_FOLDER_ID={}", folder));
    }
    lines.push(format!("GDRIVE_CREDENTIALS_FILE={}", answers.gdrive_credentials));
    lines.push(format!("YOUTUBE_CREDENTIALS_FILE={}", answers.youtube_credentials));
    lines.push(format!("YOUTUBE_PRIVACY={}", answers.privacy));
    lines.push(format!("YOUTUBE_CATEGORY_ID={}", answers.category_id));
    if let Some(tags) = &answers.tags {
        lines.push(format!("YOUTUBE_DEFAULT_TAGS={}", tags));
    }
    match &answers.notion {
        Some(notion) => {
            if let Some(token) = &notion.token {
                lines.push(format!("NOTION_TOKEN={}", token));
            }
            if let Some(database_id) = &notion.database_id {
                lines.push(format!("NOTION_DATABASE_ID={}", database_id));
            }
            lines.push("SKIP_NOTION=false".to_string());
        }
        None => lines.push("SKIP_NOTION=true".to_string()),
    }
    lines.push(format!("DELETE_AFTER_UPLOAD={}", answers.delete_after_upload));

    lines.push(String::new());
    lines.push("# Default settings (can be modified)".to_string());
    lines.extend(
        [
            "TEMP_DOWNLOAD_PATH=./temp_videos",
            "PROCESSED_FILES_DB=./processed_files.json",
            "LOG_FILE=./upload_log.txt",
            "MAX_RETRIES=3",
            "CHUNK_SIZE=52428800",
            "LOG_LEVEL=INFO",
        ]
        .map(String::from),
    );

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

pub fn write_template(dir: &Path) -> Result<()> {
    let path = dir.join(".env.template");
    std::fs::write(&path, ENV_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn optional(answer: String) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn ask_answers() -> Result<EnvAnswers> {
    let mut answers = EnvAnswers::default();

    println!("\nGoogle Drive Configuration:");
    answers.folder = optional(
        Text::new("Folder ID or URL:")
            .with_help_message("e.g. 1ABC123xyz or https://drive.google.com/drive/folders/1ABC123xyz")
            .prompt()?,
    );
    if answers.folder.is_none() {
        println!("  ⚠️  No folder ID provided, add GDRIVE_FOLDER_ID to .env later");
    }

    if Confirm::new("Use custom credential file paths?")
        .with_default(false)
        .prompt()?
    {
        if let Some(path) = optional(Text::new("Google Drive credentials path:").prompt()?) {
            answers.gdrive_credentials = path;
        }
        if let Some(path) = optional(Text::new("YouTube credentials path:").prompt()?) {
            answers.youtube_credentials = path;
        }
    }

    println!("\nYouTube Settings:");
    answers.privacy = Select::new(
        "Privacy for uploaded videos:",
        vec![
            PrivacyStatus::Private,
            PrivacyStatus::Unlisted,
            PrivacyStatus::Public,
        ],
    )
    .prompt()?;
    answers.category_id = Text::new("Category ID:")
        .with_default("22")
        .with_help_message("1 Film, 10 Music, 22 People & Blogs, 24 Entertainment, 28 Science & Tech")
        .prompt()?;
    answers.tags = optional(Text::new("Default tags (comma-separated, optional):").prompt()?);

    println!("\nNotion Integration:");
    if Confirm::new("Configure Notion integration?")
        .with_default(false)
        .prompt()?
    {
        println!("  1. Go to https://www.notion.so/my-integrations");
        println!("  2. Create a new integration and copy its token");
        let token = optional(Text::new("Notion token:").prompt()?);
        let mut database_id = None;
        if token.is_some() {
            println!("  3. Create a database with these properties:");
            println!("{}", NOTION_PROPERTIES);
            println!("  4. Share the database with your integration");
            database_id = optional(Text::new("Database ID:").prompt()?);
        }
        answers.notion = Some(NotionAnswers { token, database_id });
    }

    println!("\nProcessing Settings:");
    answers.delete_after_upload = Confirm::new("Delete local copies after upload?")
        .with_default(true)
        .prompt()?;

    Ok(answers)
}

fn check_credential_files(config: &UploaderConfig) {
    println!("\nChecking credential files:");
    for path in [&config.gdrive_credentials_file, &config.youtube_credentials_file] {
        if path.exists() {
            println!("  ✓ Found {}", path.display());
        } else {
            println!("  ✗ Missing {}", path.display());
        }
    }
}

async fn authorize(config: &UploaderConfig, provider: ProviderKind) -> Result<()> {
    let name = provider.display_name();
    let manager = match context::credentials(config, provider, context::http_client()?) {
        Ok(manager) => manager,
        Err(e) => {
            println!("  ✗ Skipping {} authorization: {:#}", name, e);
            return Ok(());
        }
    };

    if manager.is_authorized().await?
        && !Confirm::new(&format!("{} is already authorized. Authorize again?", name))
            .with_default(false)
            .prompt()?
    {
        return Ok(());
    }

    let (url, verifier) = manager.begin_authorization()?;
    println!("\nOpen this URL in your browser to authorize {}:\n\n  {}\n", name, url);
    let pasted = Text::new("Paste the redirected URL or the authorization code:").prompt()?;
    manager
        .complete_authorization(&pasted, &verifier)
        .await
        .with_context(|| format!("{} authorization failed", name))?;
    println!("  ✓ {} authorized", name);
    Ok(())
}

/// Interactive wizard; writes `.env.template` and `.env` in the current
/// directory and runs both OAuth authorizations
pub async fn run_wizard() -> Result<()> {
    let rule = "=".repeat(60);
    println!("\n{}\nGOOGLE DRIVE TO YOUTUBE UPLOADER - SETUP WIZARD\n{}", rule, rule);
    println!("\nPrerequisites:");
    println!("1. A Google Cloud project with the Drive API and YouTube Data API v3 enabled");
    println!("2. OAuth 2.0 client credentials downloaded as JSON files");
    println!("3. (Optional) A Notion integration token and database");

    let cwd = Path::new(".");
    println!("\n1. CREATING CONFIGURATION TEMPLATE\n{}", "-".repeat(40));
    write_template(cwd)?;
    println!("✓ Created .env.template");

    let env_path = cwd.join(".env");
    let write_env = !env_path.exists()
        || Confirm::new(".env already exists. Overwrite it?")
            .with_default(false)
            .prompt()?;

    if write_env {
        println!("\n2. CREATING .ENV FILE\n{}", "-".repeat(40));
        let answers = ask_answers()?;
        std::fs::write(&env_path, render_env(&answers, Local::now()))
            .context("Failed to write .env")?;
        println!("✓ Created .env");
    } else {
        println!("  Keeping existing .env file");
    }

    let config = UploaderConfig::from_env().context("Failed to load configuration")?;
    check_credential_files(&config);

    println!("\n3. AUTHORIZING GOOGLE ACCOUNTS\n{}", "-".repeat(40));
    authorize(&config, ProviderKind::GoogleDrive).await?;
    authorize(&config, ProviderKind::YouTube).await?;

    println!("\n{}\nSETUP COMPLETE\n{}", rule, rule);
    println!("\nNext steps:");
    println!("1. Check the configuration: drive-uploader --validate");
    println!("2. Try a dry run:           drive-uploader --dry-run");
    println!("3. Start processing:        drive-uploader");
    Ok(())
}
