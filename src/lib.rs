//! # cms-backup
//!
//! Status-aware backup of headless CMS (microCMS) content APIs.
//!
//! ## Overview
//!
//! For every configured endpoint the backup either
//! - paginates the publish-only content API and stores every record under
//!   `PUBLISH`, or
//! - paginates the all-status content API and the management (metadata) API
//!   in lockstep, joins the two by position, and stores each record under its
//!   publication status. Items that are published *and* carry a pending draft
//!   are stored twice: the draft under `DRAFT/PUBLISH_AND_DRAFT` and a freshly
//!   fetched published copy under `PUBLISH`.
//!
//! Records are written either as one pretty-printed JSON file per item or as
//! one `contents.csv` per bucket.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cms_backup::{BackupRunner, BackupStore, CmsClient, Config};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file(Path::new("config.json"))?;
//!     let client = CmsClient::new(&config)?;
//!     let dir = cms_backup::utils::create_run_dir(Path::new("backup"), &config.service_id).await?;
//!
//!     let summary = BackupRunner::new(&client, &config, BackupStore::new(dir)).run().await?;
//!     println!("{} records backed up", summary.record_count());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Per-endpoint backup orchestration
pub mod backup;
/// Status classification and bucket accumulation
pub mod classifier;
/// HTTP access to the content and management APIs
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Content and metadata pagination in lockstep
pub mod fetcher;
/// Limit/offset pagination
pub mod paginator;
/// CSV projection
pub mod projector;
/// Positional join of content and metadata pages
pub mod reconciler;
/// Output layout and file writing
pub mod storage;
/// Core record and page types
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod test_helpers;

// Re-export commonly used types
pub use backup::{BackupRunner, BackupSummary, EndpointSummary};
pub use client::{CmsClient, ContentSource, Host};
pub use config::{ApiConfig, BackupTarget, Config, ContentsConfig};
pub use error::{Error, Phase, Result, ResultExt};
pub use storage::{BackupStore, OutputFormat};
pub use types::{BucketKey, BucketStatus, DraftDetail, Record, StatusTag};
