//! Command-line surface of `drive-uploader`

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const EXAMPLES: &str = "\
Examples:
  drive-uploader                      Process videos from the configured folder
  drive-uploader --dry-run            Show what would be processed without uploading
  drive-uploader --folder FOLDER_ID   Process a specific folder
  drive-uploader --filter vacation    Process only videos whose name contains \"vacation\"
  drive-uploader list                 List all videos in the folder
  drive-uploader stats --failed       Show statistics and failed uploads
  drive-uploader retry                Retry failed uploads
  drive-uploader --setup              Run the setup wizard";

#[derive(Parser, Debug)]
#[command(
    name = "drive-uploader",
    version,
    about = "Upload videos from Google Drive to YouTube with Notion tracking",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Run the interactive setup wizard
    #[arg(long)]
    pub setup: bool,

    /// Validate the environment configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub process: ProcessArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options of the default (process) command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessArgs {
    /// Google Drive folder ID or URL to process
    #[arg(long)]
    pub folder: Option<String>,

    /// Reprocess videos that are already in the database
    #[arg(long)]
    pub reprocess: bool,

    /// List what would be processed without downloading or uploading
    #[arg(long)]
    pub dry_run: bool,

    /// Only process videos whose name contains this text (case-insensitive)
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List videos in the folder with their processing status
    List {
        /// Google Drive folder ID or URL
        #[arg(long)]
        folder: Option<String>,
    },

    /// Show processing statistics
    Stats {
        /// Show details of failed uploads
        #[arg(long)]
        failed: bool,
    },

    /// Retry failed uploads
    Retry,

    /// Clear the processed files database
    Clear(ClearArgs),

    /// Export the processed files database to CSV
    Export {
        /// Output CSV file
        #[arg(long, default_value = "processed_files.csv")]
        output: PathBuf,
    },

    /// Inspect or edit uploaded videos
    #[command(subcommand)]
    Video(VideoCommand),
}

#[derive(Args, Debug, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct ClearArgs {
    /// Clear only failed entries
    #[arg(long)]
    pub failed: bool,

    /// Clear all entries
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum VideoCommand {
    /// Show privacy and processing status of a video
    Status { video_id: String },

    /// Update title, description or tags of a video
    Update {
        video_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Comma-separated tags (replace the existing ones)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Set a custom thumbnail (JPEG or PNG)
    Thumbnail { video_id: String, image: PathBuf },
}
