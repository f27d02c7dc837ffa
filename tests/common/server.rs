//! Fake CMS API on a wiremock server

use cms_backup::config::API_KEY_HEADER;
use cms_backup::{ApiConfig, Config, ContentsConfig};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Key accepted by the publish-only content API
pub const PUBLISH_KEY: &str = "publish-key";
/// Key accepted by the all-status content API
pub const ALL_STATUS_KEY: &str = "all-status-key";
/// Key accepted by the management API
pub const METADATA_KEY: &str = "metadata-key";

const CONTENT_PREFIX: &str = "/api/v1";
const MANAGEMENT_PREFIX: &str = "/management/api/v1/contents";

/// A mock CMS serving both API hosts from one server
pub struct FakeCms {
    pub server: MockServer,
}

impl FakeCms {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Configuration pointing both hosts at this server
    pub fn config(
        &self,
        endpoints: &[&str],
        request_unit: usize,
        classify: bool,
        csv: bool,
    ) -> Config {
        Config {
            service_id: "test-service".to_string(),
            contents: ContentsConfig {
                publish_api_key: PUBLISH_KEY.to_string(),
                all_status_api_key: Some(ALL_STATUS_KEY.to_string()),
                metadata_api_key: Some(METADATA_KEY.to_string()),
                endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
                request_unit,
                classify_by_status: classify,
                save_as_csv: csv,
            },
            api: ApiConfig {
                content_base_url: Some(format!("{}{}", self.server.uri(), CONTENT_PREFIX)),
                management_base_url: Some(format!(
                    "{}{}",
                    self.server.uri(),
                    MANAGEMENT_PREFIX
                )),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Serve `items` from the content host for requests carrying `api_key`
    pub async fn content_listing(
        &self,
        endpoint: &str,
        api_key: &str,
        items: &[Value],
        page_size: usize,
    ) {
        let route = format!("{}/{}", CONTENT_PREFIX, endpoint);
        self.listing(&route, api_key, items, page_size).await;
    }

    /// Serve `items` from the management host
    pub async fn metadata_listing(&self, endpoint: &str, items: &[Value], page_size: usize) {
        let route = format!("{}/{}", MANAGEMENT_PREFIX, endpoint);
        self.listing(&route, METADATA_KEY, items, page_size).await;
    }

    /// Serve one item from the publish-only content API
    pub async fn published_item(&self, endpoint: &str, id: &str, item: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}/{}", CONTENT_PREFIX, endpoint, id)))
            .and(header(API_KEY_HEADER, PUBLISH_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(item))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Answer `status` for every request to a content endpoint
    pub async fn failing_endpoint(&self, endpoint: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", CONTENT_PREFIX, endpoint)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    async fn listing(&self, route: &str, api_key: &str, items: &[Value], page_size: usize) {
        let total = items.len();

        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("limit", "0"))
            .and(header(API_KEY_HEADER, api_key))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contents": [],
                "totalCount": total,
                "offset": 0,
                "limit": 0
            })))
            .mount(&self.server)
            .await;

        for page in 0..=total / page_size {
            let offset = page * page_size;
            let contents: Vec<Value> =
                items.iter().skip(offset).take(page_size).cloned().collect();
            Mock::given(method("GET"))
                .and(path(route))
                .and(query_param("limit", page_size.to_string()))
                .and(query_param("offset", offset.to_string()))
                .and(header(API_KEY_HEADER, api_key))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "contents": contents,
                    "totalCount": total,
                    "offset": offset,
                    "limit": page_size
                })))
                .expect(1)
                .mount(&self.server)
                .await;
        }
    }
}

/// `count` content items with ids `item-1..=item-count`
pub fn content_items(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| json!({"id": format!("item-{n}"), "title": format!("Title {n}"), "views": n}))
        .collect()
}

/// Metadata entries giving every id in `items` the same status
pub fn uniform_metadata(items: &[Value], status: &str) -> Vec<Value> {
    items
        .iter()
        .map(|item| json!({"id": item["id"], "status": [status]}))
        .collect()
}
