//! `drive-uploader`: batch-upload Google Drive videos to YouTube

mod cli;
mod commands;
mod context;
mod progress;
mod setup;

use anyhow::{Context, Result};
use bridge_traits::LogLevel;
use clap::Parser;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_runtime::UploaderConfig;
use std::process::ExitCode;
use tracing::{error, info};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.setup {
        setup::run_wizard().await?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = UploaderConfig::from_env().context("Failed to load configuration")?;

    let mut logging = LoggingConfig::default().with_level(if cli.verbose {
        LogLevel::Debug
    } else {
        config.log_level
    });
    if let Some(path) = &config.log_file {
        logging = logging.with_log_file(path);
    }
    // Keeps the file writer alive until exit
    let _guard = init_logging(logging).context("Failed to initialize logging")?;

    if cli.validate {
        let ok = commands::validate(&config, cli.verbose).await?;
        return Ok(if ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    tokio::select! {
        result = dispatch(&cli, &config) => result.map(|()| ExitCode::SUCCESS),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted by user");
            println!("\nProcess interrupted by user");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn dispatch(cli: &Cli, config: &UploaderConfig) -> Result<()> {
    match &cli.command {
        None => commands::process(config, &cli.process).await,
        Some(Command::List { folder }) => commands::list(config, folder.as_deref()).await,
        Some(Command::Stats { failed }) => commands::stats(config, *failed),
        Some(Command::Retry) => commands::retry(config).await,
        Some(Command::Clear(args)) => commands::clear(config, args),
        Some(Command::Export { output }) => commands::export(config, output),
        Some(Command::Video(command)) => commands::video(config, command).await,
    }
}
