//! Core types for cms-backup

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// One content item, decoded from an element of a page's `contents` array
///
/// Field order is the order the API sent it in. The `id` field is required
/// and non-empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    id: String,
    fields: Map<String, Value>,
}

impl Record {
    /// Decode a record from one JSON value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] if the value is not an object or has
    /// no non-empty string `id`.
    pub fn from_value(value: Value) -> Result<Self> {
        let fields = into_object(value, "content record")?;
        let id = required_id(&fields, "content record")?;
        Ok(Self { id, fields })
    }

    /// The record's `id`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All fields, in API order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a single field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The record as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// One item of a metadata (management API) page
#[derive(Clone, Debug, PartialEq)]
pub struct MetaRecord {
    id: String,
    status: Vec<String>,
}

impl MetaRecord {
    /// Decode a metadata record from one JSON value
    ///
    /// A missing or non-array `status` decodes as an empty status list; the
    /// item is later skipped as unrecognized rather than failing the run.
    pub fn from_value(value: Value) -> Result<Self> {
        let fields = into_object(value, "metadata record")?;
        let id = required_id(&fields, "metadata record")?;
        let status = fields
            .get("status")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .map(|tag| match tag {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self { id, status })
    }

    /// The record's `id`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw status list as returned by the API
    pub fn status(&self) -> &[String] {
        &self.status
    }

    /// Status tag from the first entry of the status list
    pub fn status_tag(&self) -> StatusTag {
        self.status
            .first()
            .map(|s| StatusTag::parse(s))
            .unwrap_or_else(|| StatusTag::Unrecognized(String::new()))
    }
}

/// Publication state of a content item
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatusTag {
    /// Published
    Publish,
    /// Draft only
    Draft,
    /// Unpublished
    Closed,
    /// Published, with pending draft changes
    PublishAndDraft,
    /// Any tag this tool does not know about
    Unrecognized(String),
}

impl StatusTag {
    /// Parse an API status string; never fails
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PUBLISH" => StatusTag::Publish,
            "DRAFT" => StatusTag::Draft,
            "CLOSED" => StatusTag::Closed,
            "PUBLISH_AND_DRAFT" => StatusTag::PublishAndDraft,
            other => StatusTag::Unrecognized(other.to_string()),
        }
    }

    /// API spelling of the tag
    pub fn as_str(&self) -> &str {
        match self {
            StatusTag::Publish => "PUBLISH",
            StatusTag::Draft => "DRAFT",
            StatusTag::Closed => "CLOSED",
            StatusTag::PublishAndDraft => "PUBLISH_AND_DRAFT",
            StatusTag::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a bucket is named after
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketStatus {
    /// `PUBLISH`
    Publish,
    /// `DRAFT`
    Draft,
    /// `CLOSED`
    Closed,
}

impl BucketStatus {
    /// Directory name for the status
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketStatus::Publish => "PUBLISH",
            BucketStatus::Draft => "DRAFT",
            BucketStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-tag refining a bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DraftDetail {
    /// Draft copy of an item that also has a published version
    PublishAndDraft,
}

impl DraftDetail {
    /// Directory name for the sub-tag
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftDetail::PublishAndDraft => "PUBLISH_AND_DRAFT",
        }
    }
}

/// Identity of an output bucket: `(status, draftDetail)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BucketKey {
    /// Status the bucket is named after
    pub status: BucketStatus,
    /// Optional sub-tag
    pub draft_detail: Option<DraftDetail>,
}

impl BucketKey {
    /// Bucket without a sub-tag
    pub fn plain(status: BucketStatus) -> Self {
        Self {
            status,
            draft_detail: None,
        }
    }

    /// Bucket with a sub-tag
    pub fn detailed(status: BucketStatus, detail: DraftDetail) -> Self {
        Self {
            status,
            draft_detail: Some(detail),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.draft_detail {
            Some(detail) => write!(f, "{}/{}", self.status, detail.as_str()),
            None => write!(f, "{}", self.status),
        }
    }
}

/// A record with its 1-based position in the whole endpoint listing
#[derive(Clone, Debug, PartialEq)]
pub struct NumberedRecord {
    /// `pageIndex * pageSize + j + 1`
    pub number: usize,
    /// The record
    pub record: Record,
}

/// One page of content records
#[derive(Clone, Debug)]
pub struct Page {
    /// Zero-based page index
    pub index: usize,
    /// Page size the page was requested with
    pub page_size: usize,
    /// Records in API order
    pub records: Vec<Record>,
}

impl Page {
    /// Global 1-based sequence number of the record at `position`
    pub fn sequence_number(&self, position: usize) -> usize {
        self.index * self.page_size + position + 1
    }

    /// Records paired with their global sequence numbers
    pub fn into_numbered(self) -> impl Iterator<Item = NumberedRecord> {
        let Page {
            index,
            page_size,
            records,
        } = self;
        records
            .into_iter()
            .enumerate()
            .map(move |(j, record)| NumberedRecord {
                number: index * page_size + j + 1,
                record,
            })
    }
}

/// One page of metadata records
#[derive(Clone, Debug)]
pub struct MetaPage {
    /// Zero-based page index
    pub index: usize,
    /// Records in API order
    pub records: Vec<MetaRecord>,
}

/// Content and metadata pages covering the same offset
#[derive(Clone, Debug)]
pub struct PagePair {
    /// Content page (all-status key)
    pub content: Page,
    /// Metadata page (management key)
    pub meta: MetaPage,
}

/// Body of a list request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsResponse {
    /// Items of this page
    pub contents: Vec<Value>,
    /// Number of items in the whole listing
    pub total_count: usize,
}

/// Body of a zero-limit count probe
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    /// Number of items in the whole listing
    pub total_count: usize,
}

fn into_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::InvalidResponse(format!(
            "{} is not a JSON object: {}",
            what, other
        ))),
    }
}

fn required_id(fields: &Map<String, Value>, what: &str) -> Result<String> {
    match fields.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        _ => Err(Error::InvalidResponse(format!(
            "{} has no non-empty string id",
            what
        ))),
    }
}
