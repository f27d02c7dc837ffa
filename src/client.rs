//! HTTP access to the content and management APIs
//!
//! [`ContentSource`] is the seam between the backup pipeline and the network.
//! [`CmsClient`] implements it with `reqwest`; tests substitute in-memory
//! sources so pagination, reconciliation, and classification can be exercised
//! without I/O.

use crate::config::{API_KEY_HEADER, Config};
use crate::error::{Error, Result};
use crate::types::{ContentsResponse, CountResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Which API host a listing request goes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Host {
    /// Content API (publish-only or all-status, depending on the key)
    Content,
    /// Management API (per-item metadata including `status`)
    Management,
}

/// Source of paginated content listings and single items
///
/// Every call is a single request: implementations must not retry.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read `totalCount` for an endpoint with a zero-limit request
    async fn total_count(&self, host: Host, endpoint: &str, api_key: &str) -> Result<usize>;

    /// Fetch the `contents` array at `offset`, at most `limit` items
    async fn fetch_page(
        &self,
        host: Host,
        endpoint: &str,
        api_key: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Value>>;

    /// Fetch a single item from the content API by id
    async fn fetch_item(&self, endpoint: &str, api_key: &str, id: &str) -> Result<Value>;
}

/// `reqwest`-backed [`ContentSource`]
pub struct CmsClient {
    http_client: reqwest::Client,
    content_base_url: String,
    management_base_url: String,
}

impl CmsClient {
    /// Create a client for the hosts named in the configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.api.timeout)
            .user_agent(concat!("cms-backup/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            content_base_url: config.content_base_url(),
            management_base_url: config.management_base_url(),
        })
    }

    fn listing_url(&self, host: Host, endpoint: &str) -> String {
        let base = match host {
            Host::Content => &self.content_base_url,
            Host::Management => &self.management_base_url,
        };
        format!("{}/{}", base, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, usize)],
        api_key: &str,
    ) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "API response");
        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ContentSource for CmsClient {
    async fn total_count(&self, host: Host, endpoint: &str, api_key: &str) -> Result<usize> {
        let url = self.listing_url(host, endpoint);
        let body: CountResponse = self.get_json(&url, &[("limit", 0)], api_key).await?;
        Ok(body.total_count)
    }

    async fn fetch_page(
        &self,
        host: Host,
        endpoint: &str,
        api_key: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Value>> {
        let url = self.listing_url(host, endpoint);
        let body: ContentsResponse = self
            .get_json(&url, &[("limit", limit), ("offset", offset)], api_key)
            .await?;
        Ok(body.contents)
    }

    async fn fetch_item(&self, endpoint: &str, api_key: &str, id: &str) -> Result<Value> {
        let url = format!(
            "{}/{}/{}",
            self.content_base_url,
            endpoint,
            urlencoding::encode(id)
        );
        self.get_json(&url, &[], api_key).await
    }
}
