//! Content and metadata pagination in lockstep
//!
//! Both paginators share one page size and one page count, derived from the
//! all-status total, so page `i` of the content listing and page `i` of the
//! metadata listing cover the same offset.

use crate::client::{ContentSource, Host};
use crate::error::{Error, Phase, Result, ResultExt};
use crate::paginator::{Listing, Paginator, RawPage, RequestPacing};
use crate::types::{MetaPage, MetaRecord, Page, PagePair, Record};

/// Keys for one endpoint's two listings
#[derive(Clone, Debug)]
pub struct DualListing {
    /// Endpoint name
    pub endpoint: String,
    /// All-status content API key
    pub content_api_key: String,
    /// Management API key
    pub metadata_api_key: String,
}

/// Yields `(content page, metadata page)` pairs for one endpoint
pub struct DualSourceFetcher<'a> {
    endpoint: String,
    content: Paginator<'a>,
    meta: Paginator<'a>,
}

impl<'a> DualSourceFetcher<'a> {
    /// Create a fetcher issuing `page_count` request pairs
    ///
    /// The pacing delay is applied once per pair, before the content request.
    pub fn new(
        source: &'a dyn ContentSource,
        listing: DualListing,
        page_size: usize,
        page_count: usize,
    ) -> Self {
        let content = Paginator::new(
            source,
            Listing {
                host: Host::Content,
                endpoint: listing.endpoint.clone(),
                api_key: listing.content_api_key,
            },
            page_size,
            page_count,
            RequestPacing::Fixed,
        );
        let meta = Paginator::new(
            source,
            Listing {
                host: Host::Management,
                endpoint: listing.endpoint.clone(),
                api_key: listing.metadata_api_key,
            },
            page_size,
            page_count,
            RequestPacing::Unpaced,
        );

        Self {
            endpoint: listing.endpoint,
            content,
            meta,
        }
    }

    /// Number of page pairs this fetcher yields
    pub fn page_count(&self) -> usize {
        self.content.page_count()
    }

    /// Fetch and decode the next page pair, or `None` when done
    ///
    /// Failure of either request aborts the pair.
    pub async fn next_pair(&mut self) -> Result<Option<PagePair>> {
        let Some(content) = self.content.next_page().await? else {
            return Ok(None);
        };
        let Some(meta) = self.meta.next_page().await? else {
            let err = Error::InvalidResponse(format!(
                "metadata listing ended before content page {}",
                content.index
            ));
            return Err::<Option<PagePair>, _>(err).in_phase(Phase::PageFetch, &self.endpoint);
        };

        let content = decode_content_page(content, self.content.page_size())
            .in_phase(Phase::PageFetch, &self.endpoint)?;
        let meta = decode_meta_page(meta).in_phase(Phase::PageFetch, &self.endpoint)?;

        Ok(Some(PagePair { content, meta }))
    }
}

/// Decode every element of a raw page into a [`Record`]
pub fn decode_content_page(raw: RawPage, page_size: usize) -> Result<Page> {
    let records = raw
        .items
        .into_iter()
        .map(Record::from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(Page {
        index: raw.index,
        page_size,
        records,
    })
}

/// Decode every element of a raw page into a [`MetaRecord`]
pub fn decode_meta_page(raw: RawPage) -> Result<MetaPage> {
    let records = raw
        .items
        .into_iter()
        .map(MetaRecord::from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(MetaPage {
        index: raw.index,
        records,
    })
}
