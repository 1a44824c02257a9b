//! # Google Drive Provider
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Paginated listing of a folder's video files, filtered by MIME type and
//!   excluding trashed objects
//! - Chunked downloads using `Range` requests, reporting cumulative progress
//! - Removal of the partial scratch file when a download fails
//!
//! Authentication is delegated to an `AccessTokenProvider`; the connector
//! asks for a fresh bearer token before each request.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
