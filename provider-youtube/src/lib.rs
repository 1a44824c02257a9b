//! # YouTube Provider
//!
//! Implements the `VideoPublisher` trait for the YouTube Data API v3.
//!
//! ## Overview
//!
//! - Resumable uploads sent in fixed-size chunks
//! - Bounded retry of 5xx responses with exponential backoff; after each
//!   backoff the session is queried so the next chunk starts at the offset
//!   the server actually confirmed
//! - Title, description and tag defaults with YouTube's length limits
//! - Thumbnail upload, processing status read and metadata update

pub mod connector;
pub mod error;
pub mod metadata;
pub mod types;

pub use connector::{YouTubeConfig, YouTubeConnector};
pub use error::{Result, YouTubeError};
pub use metadata::{video_url, MetadataDefaults};
