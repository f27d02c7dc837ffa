//! Shared test helpers: an in-memory [`ContentSource`] with call recording.

use crate::client::{ContentSource, Host};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A request observed by [`MemorySource`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Count {
        host: Host,
        endpoint: String,
        api_key: String,
    },
    Page {
        host: Host,
        endpoint: String,
        api_key: String,
        limit: usize,
        offset: usize,
    },
    Item {
        endpoint: String,
        api_key: String,
        id: String,
    },
}

/// In-memory listings keyed by `(host, endpoint)`, plus single items by id
#[derive(Default)]
pub(crate) struct MemorySource {
    listings: HashMap<(Host, String), Vec<Value>>,
    items: HashMap<(String, String), Value>,
    failing_pages: HashSet<(Host, usize)>,
    failing_items: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_listing(mut self, host: Host, endpoint: &str, items: Vec<Value>) -> Self {
        self.listings.insert((host, endpoint.to_string()), items);
        self
    }

    pub(crate) fn with_item(mut self, endpoint: &str, id: &str, item: Value) -> Self {
        self.items
            .insert((endpoint.to_string(), id.to_string()), item);
        self
    }

    /// Make the page request at `offset` on `host` answer 500
    pub(crate) fn failing_page(mut self, host: Host, offset: usize) -> Self {
        self.failing_pages.insert((host, offset));
        self
    }

    /// Make the single-item request for `id` answer 500
    pub(crate) fn failing_item(mut self, id: &str) -> Self {
        self.failing_items.insert(id.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn item_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Item { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn listing(&self, host: Host, endpoint: &str) -> Result<&Vec<Value>> {
        self.listings
            .get(&(host, endpoint.to_string()))
            .ok_or_else(|| Error::HttpStatus {
                status: 404,
                url: format!("memory://{:?}/{}", host, endpoint),
            })
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn total_count(&self, host: Host, endpoint: &str, api_key: &str) -> Result<usize> {
        self.record(Call::Count {
            host,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        });
        Ok(self.listing(host, endpoint)?.len())
    }

    async fn fetch_page(
        &self,
        host: Host,
        endpoint: &str,
        api_key: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Value>> {
        self.record(Call::Page {
            host,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            limit,
            offset,
        });
        if self.failing_pages.contains(&(host, offset)) {
            return Err(Error::HttpStatus {
                status: 500,
                url: format!("memory://{:?}/{}?offset={}", host, endpoint, offset),
            });
        }
        let items = self.listing(host, endpoint)?;
        Ok(items.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn fetch_item(&self, endpoint: &str, api_key: &str, id: &str) -> Result<Value> {
        self.record(Call::Item {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            id: id.to_string(),
        });
        if self.failing_items.contains(id) {
            return Err(Error::HttpStatus {
                status: 500,
                url: format!("memory://{}/{}", endpoint, id),
            });
        }
        self.items
            .get(&(endpoint.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| Error::HttpStatus {
                status: 404,
                url: format!("memory://{}/{}", endpoint, id),
            })
    }
}

/// `count` content items with ids `item-1..=item-count`
pub(crate) fn items_with_ids(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| json!({"id": format!("item-{n}"), "title": format!("Title {n}")}))
        .collect()
}

/// Metadata items for `ids`, each with a single status tag
pub(crate) fn meta_items(entries: &[(&str, &str)]) -> Vec<Value> {
    entries
        .iter()
        .map(|(id, status)| json!({"id": id, "status": [status]}))
        .collect()
}
