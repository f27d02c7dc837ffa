//! Status classification and bucket accumulation
//!
//! Deciding where an item goes ([`classify`]) is separate from carrying it
//! out ([`Classifier::place`]), because the composite `PUBLISH_AND_DRAFT`
//! status needs a network fetch to produce its second placement.

use crate::client::ContentSource;
use crate::error::{Error, Phase, Result, ResultExt};
use crate::reconciler::ReconciledItem;
use crate::types::{BucketKey, BucketStatus, DraftDetail, NumberedRecord, Record, StatusTag};
use tracing::{debug, warn};

/// Single-item fetch needed to complete a fan-out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchSpec {
    /// Item id to fetch from the publish-only content API
    pub id: String,
    /// Bucket the fetched record goes into
    pub bucket: BucketKey,
}

/// Where a tagged item goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The record itself goes into one bucket
    Single(BucketKey),
    /// The record goes into `draft`; a freshly fetched copy goes into
    /// `publish.bucket`
    Fanout {
        /// Bucket for the record as received
        draft: BucketKey,
        /// Fetch producing the second placement
        publish: FetchSpec,
    },
    /// Unrecognized status: the item is not stored
    Skip,
}

/// Map a status tag to its placement
pub fn classify(status: &StatusTag, id: &str) -> Classification {
    match status {
        StatusTag::Publish => Classification::Single(BucketKey::plain(BucketStatus::Publish)),
        StatusTag::Draft => Classification::Single(BucketKey::plain(BucketStatus::Draft)),
        StatusTag::Closed => Classification::Single(BucketKey::plain(BucketStatus::Closed)),
        StatusTag::PublishAndDraft => Classification::Fanout {
            draft: BucketKey::detailed(BucketStatus::Draft, DraftDetail::PublishAndDraft),
            publish: FetchSpec {
                id: id.to_string(),
                bucket: BucketKey::plain(BucketStatus::Publish),
            },
        },
        StatusTag::Unrecognized(_) => Classification::Skip,
    }
}

/// A named, ordered sequence of records
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    /// `(status, draftDetail)`
    pub key: BucketKey,
    /// Records in placement order
    pub records: Vec<NumberedRecord>,
}

/// Append-only buckets, iterated in order of first use
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketSet {
    buckets: Vec<Bucket>,
}

impl BucketSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the bucket for `key`, creating it on first use
    pub fn push(&mut self, key: BucketKey, record: NumberedRecord) {
        match self.buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.records.push(record),
            None => self.buckets.push(Bucket {
                key,
                records: vec![record],
            }),
        }
    }

    /// Records in the bucket for `key`, if it exists
    pub fn get(&self, key: &BucketKey) -> Option<&[NumberedRecord]> {
        self.buckets
            .iter()
            .find(|b| b.key == *key)
            .map(|b| b.records.as_slice())
    }

    /// Buckets in first-use order
    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no record has been placed
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of placed records across all buckets
    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|b| b.records.len()).sum()
    }
}

/// What happened to one item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Stored once
    Placed,
    /// Stored twice (draft copy and re-fetched publish copy)
    FannedOut,
    /// Not stored (unrecognized status)
    Skipped,
}

/// Carries out classifications for one endpoint
pub struct Classifier<'a> {
    source: &'a dyn ContentSource,
    endpoint: &'a str,
    publish_api_key: &'a str,
}

impl<'a> Classifier<'a> {
    /// Create a classifier that re-fetches fan-out copies with `publish_api_key`
    pub fn new(source: &'a dyn ContentSource, endpoint: &'a str, publish_api_key: &'a str) -> Self {
        Self {
            source,
            endpoint,
            publish_api_key,
        }
    }

    /// Classify `item` and append the resulting records to `buckets`
    ///
    /// # Errors
    ///
    /// A failed fan-out fetch is fatal ([`Phase::FanoutFetch`]); the draft
    /// copy has already been placed when that happens.
    pub async fn place(&self, item: ReconciledItem, buckets: &mut BucketSet) -> Result<Placement> {
        let ReconciledItem {
            number,
            record,
            status,
        } = item;

        match classify(&status, record.id()) {
            Classification::Single(key) => {
                debug!(endpoint = self.endpoint, id = record.id(), bucket = %key, "Placed item");
                buckets.push(key, NumberedRecord { number, record });
                Ok(Placement::Placed)
            }
            Classification::Fanout { draft, publish } => {
                debug!(endpoint = self.endpoint, id = record.id(), "Fanning out item");
                buckets.push(draft, NumberedRecord { number, record });

                let fetched = self.fetch_publish_copy(&publish.id).await?;
                buckets.push(
                    publish.bucket,
                    NumberedRecord {
                        number,
                        record: fetched,
                    },
                );
                Ok(Placement::FannedOut)
            }
            Classification::Skip => {
                warn!(
                    endpoint = self.endpoint,
                    id = record.id(),
                    status = %status,
                    "Unknown status, skipping item"
                );
                Ok(Placement::Skipped)
            }
        }
    }

    async fn fetch_publish_copy(&self, id: &str) -> Result<Record> {
        let value = self
            .source
            .fetch_item(self.endpoint, self.publish_api_key, id)
            .await
            .in_phase(Phase::FanoutFetch, self.endpoint)?;
        let record = Record::from_value(value).in_phase(Phase::FanoutFetch, self.endpoint)?;
        if record.id() != id {
            return Err::<Record, _>(Error::FetchedIdMismatch {
                requested: id.to_string(),
                received: record.id().to_string(),
            })
            .in_phase(Phase::FanoutFetch, self.endpoint);
        }
        Ok(record)
    }
}
