//! Limit/offset pagination over one listing endpoint
//!
//! A [`Paginator`] is a lazy, finite, non-restartable sequence of pages. The
//! page count is fixed up front from the count probe (see
//! [`required_page_count`]); pages are requested strictly in ascending offset
//! order, one request at a time.

use crate::client::{ContentSource, Host};
use crate::error::{Phase, Result, ResultExt};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Pause inserted before every paced page request except the first
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Number of page requests needed to cover `total` items
///
/// Always `total / page_size + 1`: when `total` is an exact multiple of
/// `page_size` this requests one trailing empty page. The extra request is
/// kept for compatibility with existing backups and API quotas observed in
/// the field.
///
/// `page_size` must be at least 1 (enforced by config validation).
pub fn required_page_count(total: usize, page_size: usize) -> usize {
    total / page_size + 1
}

/// Whether page requests are spaced out by [`PAGE_DELAY`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestPacing {
    /// Sleep [`PAGE_DELAY`] before every request but the first
    Fixed,
    /// Issue requests back to back
    Unpaced,
}

/// Which listing to paginate, and with which key
#[derive(Clone, Debug)]
pub struct Listing {
    /// API host
    pub host: Host,
    /// Endpoint name
    pub endpoint: String,
    /// API key sent with every request
    pub api_key: String,
}

/// Undecoded page as returned by the API
#[derive(Clone, Debug)]
pub struct RawPage {
    /// Zero-based page index
    pub index: usize,
    /// Elements of the `contents` array, in API order
    pub items: Vec<Value>,
}

/// Sequential page fetcher for one listing
pub struct Paginator<'a> {
    source: &'a dyn ContentSource,
    listing: Listing,
    page_size: usize,
    page_count: usize,
    next_index: usize,
    pacing: RequestPacing,
}

impl<'a> Paginator<'a> {
    /// Create a paginator that will issue exactly `page_count` requests
    pub fn new(
        source: &'a dyn ContentSource,
        listing: Listing,
        page_size: usize,
        page_count: usize,
        pacing: RequestPacing,
    ) -> Self {
        Self {
            source,
            listing,
            page_size,
            page_count,
            next_index: 0,
            pacing,
        }
    }

    /// Total number of pages this paginator yields
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Page size used for every request
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Offset of the page at `index`
    pub fn offset(&self, index: usize) -> usize {
        self.page_size * index
    }

    /// Fetch the next page, or `None` once all pages have been yielded
    ///
    /// A failed request ends the sequence: later calls return `None`.
    pub async fn next_page(&mut self) -> Result<Option<RawPage>> {
        if self.next_index >= self.page_count {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;

        if index > 0 && self.pacing == RequestPacing::Fixed {
            tokio::time::sleep(PAGE_DELAY).await;
        }

        let offset = self.offset(index);
        debug!(
            endpoint = %self.listing.endpoint,
            host = ?self.listing.host,
            limit = self.page_size,
            offset,
            "Requesting page"
        );

        let items = self
            .source
            .fetch_page(
                self.listing.host,
                &self.listing.endpoint,
                &self.listing.api_key,
                self.page_size,
                offset,
            )
            .await
            .in_phase(Phase::PageFetch, &self.listing.endpoint);

        let items = match items {
            Ok(items) => items,
            Err(e) => {
                self.next_index = self.page_count;
                return Err(e);
            }
        };

        info!(
            endpoint = %self.listing.endpoint,
            host = ?self.listing.host,
            "[{} / {}] offset {}",
            index + 1,
            self.page_count,
            offset
        );
        Ok(Some(RawPage { index, items }))
    }
}
