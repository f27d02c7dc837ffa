//! Positional join of content and metadata pages
//!
//! A [`PagePair`] is consumed as two zipped sequences. At every step the
//! content `id` must equal the metadata `id`; a difference means the two APIs
//! returned differently ordered or differently filtered pages, and the
//! iterator yields [`Error::IdMismatch`] and stops.

use crate::error::{Error, Result};
use crate::types::{MetaRecord, PagePair, Record, StatusTag};
use std::iter::Zip;
use std::vec::IntoIter;

/// A content record tagged with the status reported by the metadata API
#[derive(Clone, Debug, PartialEq)]
pub struct ReconciledItem {
    /// Global 1-based sequence number (`pageIndex * pageSize + j + 1`)
    pub number: usize,
    /// The content record, unchanged
    pub record: Record,
    /// First entry of the metadata record's status list
    pub status: StatusTag,
}

/// Iterator over the reconciled items of one page pair
pub struct Reconciled {
    page: usize,
    page_size: usize,
    position: usize,
    pairs: Zip<IntoIter<Record>, IntoIter<MetaRecord>>,
    failed: bool,
}

/// Start reconciling a page pair
///
/// # Errors
///
/// Returns [`Error::PageLengthMismatch`] if the pages hold a different number
/// of records; nothing from such a pair is yielded.
pub fn reconcile(pair: PagePair) -> Result<Reconciled> {
    let PagePair { content, meta } = pair;
    if content.records.len() != meta.records.len() {
        return Err(Error::PageLengthMismatch {
            page: content.index,
            content_len: content.records.len(),
            meta_len: meta.records.len(),
        });
    }

    Ok(Reconciled {
        page: content.index,
        page_size: content.page_size,
        position: 0,
        pairs: content.records.into_iter().zip(meta.records),
        failed: false,
    })
}

impl Iterator for Reconciled {
    type Item = Result<ReconciledItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (record, meta) = self.pairs.next()?;
        let position = self.position;
        self.position += 1;

        if record.id() != meta.id() {
            self.failed = true;
            return Some(Err(Error::IdMismatch {
                page: self.page,
                position,
                content_id: record.id().to_string(),
                meta_id: meta.id().to_string(),
            }));
        }

        Some(Ok(ReconciledItem {
            number: self.page * self.page_size + position + 1,
            status: meta.status_tag(),
            record,
        }))
    }
}
