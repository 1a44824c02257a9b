//! Command handlers
//!
//! Each handler prints its report to stdout; progress and diagnostics go
//! through `tracing`.

use anyhow::{bail, Context, Result};
use bridge_traits::media::{format_size, truncate_chars};
use bridge_traits::{BestEffort, MediaItem, UploadStatus};
use core_runtime::UploaderConfig;
use core_uploader::{LedgerStatistics, ProcessOptions};
use inquire::Confirm;
use provider_notion::NotionNotifier;
use provider_youtube::video_url;
use std::path::Path;
use tracing::info;

use crate::cli::{ClearArgs, ProcessArgs, VideoCommand};
use crate::context;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Length of an error shown in the failed-uploads listing
const ERROR_PREVIEW_CHARS: usize = 100;

pub fn process_options(args: &ProcessArgs, config: &UploaderConfig) -> ProcessOptions {
    ProcessOptions {
        folder: args.folder.clone(),
        skip_processed: !args.reprocess,
        filter: args.filter.clone(),
        dry_run: args.dry_run || config.dry_run,
    }
}

pub async fn process(config: &UploaderConfig, args: &ProcessArgs) -> Result<()> {
    let report = config.validate_environment();
    if !report.is_ok() {
        for error in &report.errors {
            eprintln!("  - {}", error);
        }
        bail!("Configuration errors found. Run `drive-uploader --validate` for details");
    }
    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }

    let options = process_options(args, config);
    let mut pipeline = context::pipeline(config).await?;
    let summary = pipeline.process(&options).await?;

    if options.dry_run {
        println!(
            "Dry run: {} video(s) would be processed",
            summary.found - summary.skipped
        );
    }
    Ok(())
}

pub async fn list(config: &UploaderConfig, folder: Option<&str>) -> Result<()> {
    let pipeline = context::pipeline(config).await?;
    let videos = pipeline.list(folder).await?;
    print!("{}", render_listing(&videos));
    Ok(())
}

pub fn render_listing(videos: &[MediaItem]) -> String {
    if videos.is_empty() {
        return "No videos found in the specified folder\n".to_string();
    }

    let mut out = format!("\nFound {} video(s):\n{}\n", videos.len(), THIN_RULE);
    for video in videos {
        let icon = match video.status {
            UploadStatus::Success => "✓",
            UploadStatus::Failed => "✗",
            UploadStatus::Pending => "○",
        };
        out.push_str(&format!("{} {}\n", icon, video.name));
        out.push_str(&format!("  Size: {}\n", format_size(video.size_bytes)));
        match (&video.status, &video.dest_url) {
            (UploadStatus::Success, Some(url)) => out.push_str(&format!("  YouTube: {}\n", url)),
            (UploadStatus::Failed, _) => out.push_str("  Status: Failed\n"),
            _ => out.push_str("  Status: Not processed\n"),
        }
    }
    out
}

pub fn stats(config: &UploaderConfig, show_failed: bool) -> Result<()> {
    let ledger = context::ledger(config)?;
    print!("{}", render_statistics(&ledger.statistics()));

    if show_failed {
        let failed = ledger.list_failed();
        if !failed.is_empty() {
            println!("\nFailed uploads:\n{}", &THIN_RULE[..40]);
            for entry in failed {
                println!("• {}", entry.name);
                if let Some(error) = entry.error.as_deref() {
                    println!("  Error: {}...", truncate_chars(error, ERROR_PREVIEW_CHARS));
                }
                println!("  Date: {}", entry.date);
            }
        }
    }
    Ok(())
}

pub fn render_statistics(stats: &LedgerStatistics) -> String {
    format!(
        "\n{rule}\nPROCESSING STATISTICS\n{rule}\n\
         Total processed: {}\nSuccessful: {}\nFailed: {}\nPending: {}\nTotal size: {}\n",
        stats.total_processed,
        stats.successful,
        stats.failed,
        stats.pending,
        stats.total_size_formatted(),
        rule = RULE,
    )
}

pub async fn retry(config: &UploaderConfig) -> Result<()> {
    let mut pipeline = context::pipeline(config).await?;
    let options = ProcessOptions {
        dry_run: config.dry_run,
        ..ProcessOptions::default()
    };
    let summary = pipeline.retry_failed(&options).await?;
    if options.dry_run {
        println!("Dry run: {} failed video(s) would be retried", summary.found);
    } else if summary.found == 0 {
        println!("No failed uploads to retry");
    }
    Ok(())
}

pub fn clear(config: &UploaderConfig, args: &ClearArgs) -> Result<()> {
    let mut ledger = context::ledger(config)?;

    if args.failed {
        let removed = ledger.clear_failed()?;
        println!("Cleared {} failed entries from database", removed);
    } else if args.all {
        let confirmed = Confirm::new("Are you sure you want to clear ALL entries?")
            .with_default(false)
            .prompt()
            .context("Confirmation prompt failed")?;
        if confirmed {
            let removed = ledger.clear_all()?;
            println!("Cleared all {} entries from database", removed);
        } else {
            println!("Operation cancelled");
        }
    }
    Ok(())
}

pub fn export(config: &UploaderConfig, output: &Path) -> Result<()> {
    let ledger = context::ledger(config)?;
    let rows = ledger.export_csv(output)?;
    if rows == 0 {
        println!("No data to export");
    } else {
        println!("Exported {} row(s) to {}", rows, output.display());
    }
    Ok(())
}

pub async fn video(config: &UploaderConfig, command: &VideoCommand) -> Result<()> {
    let youtube = context::youtube(config, context::http_client()?).await?;

    match command {
        VideoCommand::Status { video_id } => match youtube.get_video_status(video_id).await? {
            None => bail!("Video {} not found", video_id),
            Some(video) => {
                let status = video.status.unwrap_or_default();
                let processing = video.processing_details.unwrap_or_default();
                println!("Video: {}", video_url(&video.id));
                println!(
                    "  Upload status: {}",
                    status.upload_status.as_deref().unwrap_or("unknown")
                );
                println!(
                    "  Privacy: {}",
                    status.privacy_status.as_deref().unwrap_or("unknown")
                );
                println!(
                    "  Processing: {}",
                    processing.processing_status.as_deref().unwrap_or("unknown")
                );
                if let Some(reason) = status.failure_reason.or(status.rejection_reason) {
                    println!("  Problem: {}", reason);
                }
            }
        },
        VideoCommand::Update {
            video_id,
            title,
            description,
            tags,
        } => {
            if title.is_none() && description.is_none() && tags.is_empty() {
                bail!("Nothing to update: pass --title, --description or --tags");
            }
            let tags = (!tags.is_empty()).then_some(tags.as_slice());
            let updated = youtube
                .update_video_metadata(video_id, title.as_deref(), description.as_deref(), tags)
                .await?;
            let title = updated.snippet.map(|s| s.title).unwrap_or_default();
            println!("Updated {} ({})", video_id, title);
        }
        VideoCommand::Thumbnail { video_id, image } => {
            match youtube.upload_thumbnail(video_id, image).await {
                BestEffort::Done(()) => println!("Thumbnail set for {}", video_id),
                BestEffort::Skipped => println!("Thumbnail skipped"),
                BestEffort::Failed(message) => bail!("Thumbnail upload failed: {}", message),
            }
        }
    }
    Ok(())
}

/// Print the environment report; returns whether the configuration is usable
pub async fn validate(config: &UploaderConfig, verbose: bool) -> Result<bool> {
    let report = config.validate_environment();

    println!("\n{}\nENVIRONMENT VALIDATION\n{}", RULE, RULE);
    if !report.errors.is_empty() {
        println!("\n❌ ERRORS:");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
    if !report.warnings.is_empty() {
        println!("\n⚠️  WARNINGS:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
    if report.is_ok() && report.warnings.is_empty() {
        println!("\n✅ All environment variables are properly configured!");
    }

    if verbose {
        println!("\nConfiguration:");
        for (key, value) in config.summary() {
            println!("  {:<26} {}", key, value);
        }
        if report.is_ok() {
            check_notion(config).await?;
        }
    }
    println!("{}", RULE);

    Ok(report.is_ok())
}

async fn check_notion(config: &UploaderConfig) -> Result<()> {
    let Some(notion) = context::notion_config(config) else {
        return Ok(());
    };
    let notifier = NotionNotifier::new(context::http_client()?, Some(notion));

    match notifier.get_database_schema().await {
        Ok(schema) => {
            info!(database = %schema.id, "Notion database reachable");
            println!("\nNotion database: {}", schema.title_text());
            let problems = schema.schema_problems();
            if problems.is_empty() {
                println!("  ✅ Properties match");
            }
            for problem in problems {
                println!("  ⚠️  {}", problem);
            }
        }
        Err(e) => println!("\n❌ Notion database not reachable: {}", e),
    }
    Ok(())
}
