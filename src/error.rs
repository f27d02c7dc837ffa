//! Error types for cms-backup
//!
//! This module provides the error handling for the backup pipeline:
//! - Domain-specific error variants (HTTP status, identifier mismatch, etc.)
//! - Phase context so a failure names the pipeline stage and endpoint
//! - Process exit code mapping for the command line front end
//!
//! The pipeline is fail-fast: nothing here is retried. The only non-fatal
//! condition (an unrecognized status tag) never becomes an `Error`.

use std::fmt;
use thiserror::Error;

/// Result type alias for cms-backup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error occurred in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Zero-limit request that reads `totalCount`
    CountProbe,
    /// Paginated content or metadata request
    PageFetch,
    /// Pairing content records with metadata records
    Reconciliation,
    /// Single-item publish re-fetch for a `PUBLISH_AND_DRAFT` item
    FanoutFetch,
    /// Directory creation or file output
    FileWrite,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::CountProbe => "count probe",
            Phase::PageFetch => "page fetch",
            Phase::Reconciliation => "reconciliation",
            Phase::FanoutFetch => "fan-out fetch",
            Phase::FileWrite => "file write",
        };
        f.write_str(name)
    }
}

/// Main error type for cms-backup
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "contents.requestUnit")
        key: Option<String>,
    },

    /// Transport-level failure (connection refused, timeout, TLS, ...)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with anything other than 200 OK
    #[error("status code {status}: unexpected response from {url}")]
    HttpStatus {
        /// HTTP status code returned by the API
        status: u16,
        /// Request URL (without the API key, which travels in a header)
        url: String,
    },

    /// JSON decode or encode failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Well-formed JSON that does not have the expected shape
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Content and metadata pages disagree on the item at a position
    #[error(
        "content id mismatch at page {page}, position {position}: content {content_id:?}, metadata {meta_id:?}"
    )]
    IdMismatch {
        /// Zero-based page index
        page: usize,
        /// Zero-based position within the page
        position: usize,
        /// `id` read from the content record
        content_id: String,
        /// `id` read from the metadata record
        meta_id: String,
    },

    /// A single-item fetch answered with a different item than requested
    #[error("requested item {requested:?} but the API returned {received:?}")]
    FetchedIdMismatch {
        /// `id` that was requested
        requested: String,
        /// `id` of the record in the response
        received: String,
    },

    /// Content and metadata pages returned a different number of items
    #[error(
        "page {page} length mismatch: {content_len} content records, {meta_len} metadata records"
    )]
    PageLengthMismatch {
        /// Zero-based page index
        page: usize,
        /// Number of records in the content page
        content_len: usize,
        /// Number of records in the metadata page
        meta_len: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error wrapped with the phase and endpoint it happened in
    #[error("{phase} failed for endpoint {endpoint:?}: {source}")]
    Phase {
        /// Pipeline stage
        phase: Phase,
        /// Endpoint being backed up
        endpoint: String,
        /// Underlying error
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Innermost error beneath any phase context
    pub fn root(&self) -> &Error {
        match self {
            Error::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Phase of the outermost context, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Process exit code for this error
    ///
    /// - 2: configuration
    /// - 3: network or HTTP status
    /// - 4: pairing invariant violated (id or length mismatch, wrong fetched item)
    /// - 5: local I/O
    /// - 1: anything else
    pub fn exit_code(&self) -> u8 {
        match self.root() {
            Error::Config { .. } => 2,
            Error::Network(_) | Error::HttpStatus { .. } => 3,
            Error::IdMismatch { .. }
            | Error::FetchedIdMismatch { .. }
            | Error::PageLengthMismatch { .. } => 4,
            Error::Io(_) => 5,
            Error::Serialization(_)
            | Error::InvalidResponse(_)
            | Error::Csv(_)
            | Error::Phase { .. } => 1,
        }
    }
}

/// Attach phase context to a fallible result
pub trait ResultExt<T> {
    /// Wrap the error (if any) with the phase and endpoint it occurred in
    fn in_phase(self, phase: Phase, endpoint: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn in_phase(self, phase: Phase, endpoint: &str) -> Result<T> {
        self.map_err(|e| match e {
            // Already attributed further down; keep the innermost phase.
            e @ Error::Phase { .. } => e,
            e => Error::Phase {
                phase,
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            },
        })
    }
}
