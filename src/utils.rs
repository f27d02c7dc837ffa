//! Utility functions for backup directory naming

use crate::error::Result;
use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

/// `strftime` format of the per-run directory name
pub const RUN_DIR_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Name of the run directory for a backup started at `started`
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use cms_backup::utils::run_dir_name;
///
/// let started = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
/// assert_eq!(run_dir_name(&started), "2024_03_09_07_05_00");
/// ```
pub fn run_dir_name<Tz>(started: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    started.format(RUN_DIR_FORMAT).to_string()
}

/// `<output>/<serviceId>/<timestamp>` for a backup started at `started`
pub fn run_dir<Tz>(output: &Path, service_id: &str, started: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    output.join(service_id).join(run_dir_name(started))
}

/// Create the run directory for a backup starting now (local time)
pub async fn create_run_dir(output: &Path, service_id: &str) -> Result<PathBuf> {
    let dir = run_dir(output, service_id, &Local::now());
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}
