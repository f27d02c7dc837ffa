//! On-disk layout of a backup run
//!
//! ```text
//! <base>/contents/<endpoint>/<STATUS>/[<draftDetail>/]<n>.json
//! <base>/contents/<endpoint>/<STATUS>/[<draftDetail>/]contents.csv
//! ```
//!
//! Files are written to a sibling temporary name and renamed into place, so
//! a crash never leaves a truncated file under its final name.

use crate::classifier::{Bucket, BucketSet};
use crate::error::Result;
use crate::projector::{KeyUnion, render_csv};
use crate::types::{BucketKey, NumberedRecord};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the run directory holding all content backups
pub const CONTENTS_DIR: &str = "contents";

/// File name of the per-bucket CSV file
pub const CSV_FILE_NAME: &str = "contents.csv";

/// How records are written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One pretty-printed JSON file per record, named by sequence number
    Json,
    /// One `contents.csv` per bucket with a key-union header
    Csv,
}

impl OutputFormat {
    /// Format selected by the `saveAsCSV` flag
    pub fn from_csv_flag(save_as_csv: bool) -> Self {
        if save_as_csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Json
        }
    }
}

/// Writes buckets below a run directory
#[derive(Clone, Debug)]
pub struct BackupStore {
    base_dir: PathBuf,
}

impl BackupStore {
    /// Create a store rooted at `base_dir` (the timestamped run directory)
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root of the run directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory for one bucket of one endpoint
    pub fn bucket_dir(&self, endpoint: &str, key: &BucketKey) -> PathBuf {
        let mut dir = self
            .base_dir
            .join(CONTENTS_DIR)
            .join(endpoint)
            .join(key.status.as_str());
        if let Some(detail) = key.draft_detail {
            dir.push(detail.as_str());
        }
        dir
    }

    /// Write one record as `<n>.json`
    pub async fn write_json(
        &self,
        endpoint: &str,
        key: &BucketKey,
        record: &NumberedRecord,
    ) -> Result<PathBuf> {
        let dir = self.bucket_dir(endpoint, key);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.json", record.number));
        let body = serde_json::to_string_pretty(&record.record.to_value())?;
        write_atomic(&path, body.as_bytes()).await?;
        debug!(path = %path.display(), id = record.record.id(), "Wrote JSON file");
        Ok(path)
    }

    /// Write a bucket's records as one `contents.csv`
    pub async fn write_csv(
        &self,
        endpoint: &str,
        bucket: &Bucket,
        keys: &KeyUnion,
    ) -> Result<PathBuf> {
        let dir = self.bucket_dir(endpoint, &bucket.key);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(CSV_FILE_NAME);
        let body = render_csv(keys, bucket.records.iter().map(|r| &r.record))?;
        write_atomic(&path, &body).await?;
        debug!(
            path = %path.display(),
            rows = bucket.records.len(),
            columns = keys.len(),
            "Wrote CSV file"
        );
        Ok(path)
    }

    /// Write every bucket in first-use order
    ///
    /// `keys` is required for [`OutputFormat::Csv`] and ignored otherwise; a
    /// shared header keeps the columns of all buckets of an endpoint aligned.
    pub async fn write_buckets(
        &self,
        endpoint: &str,
        buckets: &BucketSet,
        format: OutputFormat,
        keys: &KeyUnion,
    ) -> Result<usize> {
        let mut files = 0;
        for bucket in buckets.iter() {
            match format {
                OutputFormat::Json => {
                    for record in &bucket.records {
                        self.write_json(endpoint, &bucket.key, record).await?;
                        files += 1;
                    }
                }
                OutputFormat::Csv => {
                    self.write_csv(endpoint, bucket, keys).await?;
                    files += 1;
                }
            }
        }
        Ok(files)
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = path.with_file_name(format!(".{}.partial", file_name));

    tokio::fs::write(&partial, contents).await?;
    tokio::fs::rename(&partial, path).await?;
    Ok(())
}
