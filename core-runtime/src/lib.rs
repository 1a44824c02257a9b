//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by every uploader crate:
//! - Configuration loading from the environment / `.env`
//! - Logging and tracing initialisation (stdout plus optional log file)
//! - Redaction helpers for printing configuration and log fields
//!
//! ## Overview
//!
//! Configuration is read exactly once, validated, and then handed to each
//! component constructor as an immutable [`UploaderConfig`](config::UploaderConfig).
//! Nothing downstream reads environment variables directly.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{TokenStoreKind, UploaderConfig, UploaderConfigBuilder, ValidationReport};
pub use error::{Error, Result};
