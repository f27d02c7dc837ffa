//! Per-endpoint backup orchestration
//!
//! Endpoints are processed one after another. Each endpoint's records are
//! collected into a [`BucketSet`] and written once the endpoint has been fully
//! fetched, so a fatal error leaves no partial output for that endpoint.

use crate::classifier::{BucketSet, Classifier, Placement};
use crate::client::{ContentSource, Host};
use crate::config::{BackupTarget, Config};
use crate::error::{Error, Phase, Result, ResultExt};
use crate::fetcher::{DualListing, DualSourceFetcher, decode_content_page};
use crate::paginator::{Listing, Paginator, RequestPacing, required_page_count};
use crate::projector::KeyUnion;
use crate::reconciler::reconcile;
use crate::storage::{BackupStore, OutputFormat};
use crate::types::{BucketKey, BucketStatus};
use tracing::{info, warn};

/// Result of backing up one endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointSummary {
    /// Endpoint name
    pub endpoint: String,
    /// `totalCount` reported by the count probe
    pub total_count: usize,
    /// Number of page requests (pairs, on the classified path)
    pub pages: usize,
    /// Items dropped for an unrecognized status
    pub skipped: usize,
    /// Items placed twice because of `PUBLISH_AND_DRAFT`
    pub fanned_out: usize,
    /// Record count per bucket, in order of first use
    pub buckets: Vec<(BucketKey, usize)>,
    /// Files written for this endpoint
    pub files_written: usize,
}

impl EndpointSummary {
    /// Records stored across all buckets
    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|(_, count)| count).sum()
    }
}

/// Result of a full run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackupSummary {
    /// One entry per configured endpoint, in configuration order
    pub endpoints: Vec<EndpointSummary>,
}

impl BackupSummary {
    /// Records stored across all endpoints
    pub fn record_count(&self) -> usize {
        self.endpoints.iter().map(EndpointSummary::record_count).sum()
    }

    /// Files written across all endpoints
    pub fn files_written(&self) -> usize {
        self.endpoints.iter().map(|e| e.files_written).sum()
    }
}

struct Collected {
    total_count: usize,
    pages: usize,
    skipped: usize,
    fanned_out: usize,
    buckets: BucketSet,
    keys: KeyUnion,
}

/// Runs the backup of every configured endpoint
pub struct BackupRunner<'a> {
    source: &'a dyn ContentSource,
    config: &'a Config,
    store: BackupStore,
    format: OutputFormat,
}

impl<'a> BackupRunner<'a> {
    /// Create a runner writing into `store`
    pub fn new(source: &'a dyn ContentSource, config: &'a Config, store: BackupStore) -> Self {
        Self {
            source,
            config,
            store,
            format: OutputFormat::from_csv_flag(config.contents.save_as_csv),
        }
    }

    /// Back up every endpoint in order, stopping at the first error
    ///
    /// # Errors
    ///
    /// The configuration is validated first; an invalid one fails with
    /// [`Error::Config`] before any request is made.
    pub async fn run(&self) -> Result<BackupSummary> {
        self.config.validate()?;
        if self.config.target == BackupTarget::All {
            warn!("Media backup is not supported, backing up contents only");
        }

        let mut summary = BackupSummary::default();
        for endpoint in &self.config.contents.endpoints {
            summary.endpoints.push(self.backup_endpoint(endpoint).await?);
        }
        Ok(summary)
    }

    async fn backup_endpoint(&self, endpoint: &str) -> Result<EndpointSummary> {
        info!(
            endpoint,
            classify = self.config.contents.classify_by_status,
            format = ?self.format,
            "Backing up endpoint"
        );

        let collected = if self.config.contents.classify_by_status {
            self.collect_classified(endpoint).await?
        } else {
            self.collect_unclassified(endpoint).await?
        };

        let files_written = self
            .store
            .write_buckets(endpoint, &collected.buckets, self.format, &collected.keys)
            .await
            .in_phase(Phase::FileWrite, endpoint)?;

        let summary = EndpointSummary {
            endpoint: endpoint.to_string(),
            total_count: collected.total_count,
            pages: collected.pages,
            skipped: collected.skipped,
            fanned_out: collected.fanned_out,
            buckets: collected
                .buckets
                .iter()
                .map(|b| (b.key, b.records.len()))
                .collect(),
            files_written,
        };
        info!(
            endpoint,
            records = summary.record_count(),
            skipped = summary.skipped,
            files = files_written,
            "Endpoint backed up"
        );
        Ok(summary)
    }

    async fn collect_classified(&self, endpoint: &str) -> Result<Collected> {
        let contents = &self.config.contents;
        let all_status_key = required_key(
            contents.all_status_api_key.as_deref(),
            "contents.getAllStatusContentsAPIKey",
        )?;
        let metadata_key = required_key(
            contents.metadata_api_key.as_deref(),
            "contents.getContentsMetaDataAPIKey",
        )?;

        let total_count = self
            .source
            .total_count(Host::Content, endpoint, all_status_key)
            .await
            .in_phase(Phase::CountProbe, endpoint)?;
        let page_size = contents.request_unit;
        let page_count = required_page_count(total_count, page_size);
        info!(endpoint, total_count, pages = page_count, "Counted contents");

        let mut fetcher = DualSourceFetcher::new(
            self.source,
            DualListing {
                endpoint: endpoint.to_string(),
                content_api_key: all_status_key.to_string(),
                metadata_api_key: metadata_key.to_string(),
            },
            page_size,
            page_count,
        );
        let classifier = Classifier::new(self.source, endpoint, &contents.publish_api_key);

        let mut collected = Collected::new(total_count);
        while let Some(pair) = fetcher.next_pair().await? {
            collected.pages += 1;
            for item in reconcile(pair).in_phase(Phase::Reconciliation, endpoint)? {
                let item = item.in_phase(Phase::Reconciliation, endpoint)?;
                collected.keys.observe(&item.record);
                match classifier.place(item, &mut collected.buckets).await? {
                    Placement::Placed => {}
                    Placement::FannedOut => collected.fanned_out += 1,
                    Placement::Skipped => collected.skipped += 1,
                }
            }
        }

        if collected.skipped > 0 {
            warn!(
                endpoint,
                skipped = collected.skipped,
                "Some items had an unrecognized status and were not backed up"
            );
        }
        Ok(collected)
    }

    async fn collect_unclassified(&self, endpoint: &str) -> Result<Collected> {
        let publish_key = self.config.contents.publish_api_key.as_str();

        let total_count = self
            .source
            .total_count(Host::Content, endpoint, publish_key)
            .await
            .in_phase(Phase::CountProbe, endpoint)?;
        let page_size = self.config.contents.request_unit;
        let page_count = required_page_count(total_count, page_size);
        info!(endpoint, total_count, pages = page_count, "Counted contents");

        let mut paginator = Paginator::new(
            self.source,
            Listing {
                host: Host::Content,
                endpoint: endpoint.to_string(),
                api_key: publish_key.to_string(),
            },
            page_size,
            page_count,
            RequestPacing::Fixed,
        );

        let publish = BucketKey::plain(BucketStatus::Publish);
        let mut collected = Collected::new(total_count);
        while let Some(raw) = paginator.next_page().await? {
            collected.pages += 1;
            let page = decode_content_page(raw, page_size).in_phase(Phase::PageFetch, endpoint)?;
            for numbered in page.into_numbered() {
                collected.keys.observe(&numbered.record);
                collected.buckets.push(publish, numbered);
            }
        }
        Ok(collected)
    }
}

impl Collected {
    fn new(total_count: usize) -> Self {
        Self {
            total_count,
            pages: 0,
            skipped: 0,
            fanned_out: 0,
            buckets: BucketSet::new(),
            keys: KeyUnion::new(),
        }
    }
}

fn required_key<'k>(key: Option<&'k str>, name: &str) -> Result<&'k str> {
    match key {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(Error::config(
            name,
            "classifyByStatus requires this API key",
        )),
    }
}
