//! Configuration types for cms-backup
//!
//! The on-disk format is the camelCase JSON file used by the tool's
//! unattended mode, so existing `config.json` files keep working.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Smallest accepted page size
pub const MIN_REQUEST_UNIT: usize = 1;

/// Largest page size the content API accepts
pub const MAX_REQUEST_UNIT: usize = 100;

/// Content backup settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsConfig {
    /// Key for the publish-only content API (always required)
    #[serde(rename = "getPublishContentsAPIKey", default)]
    pub publish_api_key: String,

    /// Key for the all-status content API (classified backups only)
    #[serde(rename = "getAllStatusContentsAPIKey", default)]
    pub all_status_api_key: Option<String>,

    /// Key for the management/metadata API (classified backups only)
    #[serde(rename = "getContentsMetaDataAPIKey", default)]
    pub metadata_api_key: Option<String>,

    /// Endpoints to back up, in order
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Page size for paginated requests (default: 10)
    #[serde(default = "default_request_unit")]
    pub request_unit: usize,

    /// Split output by publication status
    #[serde(default)]
    pub classify_by_status: bool,

    /// Write one `contents.csv` per bucket instead of one JSON file per item
    #[serde(rename = "saveAsCSV", default)]
    pub save_as_csv: bool,
}

impl Default for ContentsConfig {
    fn default() -> Self {
        Self {
            publish_api_key: String::new(),
            all_status_api_key: None,
            metadata_api_key: None,
            endpoints: Vec::new(),
            request_unit: default_request_unit(),
            classify_by_status: false,
            save_as_csv: false,
        }
    }
}

/// API host overrides and HTTP client settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Content API base URL (default: `https://<serviceId>.microcms.io/api/v1`)
    #[serde(default)]
    pub content_base_url: Option<String>,

    /// Management API base URL
    /// (default: `https://<serviceId>.microcms-management.io/api/v1/contents`)
    #[serde(default)]
    pub management_base_url: Option<String>,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_secs", rename = "timeoutSecs")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            content_base_url: None,
            management_base_url: None,
            timeout: default_timeout(),
        }
    }
}

/// What a run backs up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupTarget {
    /// Contents and media; only contents are supported, media is skipped with a warning
    All,
    /// Contents only (default)
    #[default]
    Contents,
    /// Media only; not supported and rejected by validation
    Media,
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// CMS service identifier (the subdomain of the API hosts)
    #[serde(rename = "serviceId", default)]
    pub service_id: String,

    /// What to back up (default: contents)
    #[serde(default)]
    pub target: BackupTarget,

    /// Content backup settings
    #[serde(default)]
    pub contents: ContentsConfig,

    /// API hosts and client settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load a configuration file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for missing or out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.service_id.trim().is_empty() {
            return Err(Error::config("serviceId", "serviceId must not be empty"));
        }

        if self.target == BackupTarget::Media {
            return Err(Error::config(
                "target",
                "media backup is not supported; use \"contents\" or \"all\"",
            ));
        }

        let contents = &self.contents;
        if contents.endpoints.is_empty() {
            return Err(Error::config(
                "contents.endpoints",
                "at least one endpoint is required",
            ));
        }
        if contents.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::config(
                "contents.endpoints",
                "endpoint names must not be empty",
            ));
        }
        if let Some(name) = contents.endpoints.iter().find(|e| !is_path_segment(e)) {
            return Err(Error::config(
                "contents.endpoints",
                format!("endpoint name {:?} must be a single path segment", name),
            ));
        }
        if !(MIN_REQUEST_UNIT..=MAX_REQUEST_UNIT).contains(&contents.request_unit) {
            return Err(Error::config(
                "contents.requestUnit",
                format!(
                    "requestUnit must be between {} and {}, got {}",
                    MIN_REQUEST_UNIT, MAX_REQUEST_UNIT, contents.request_unit
                ),
            ));
        }
        if contents.publish_api_key.is_empty() {
            return Err(Error::config(
                "contents.getPublishContentsAPIKey",
                "the publish API key is required",
            ));
        }
        if contents.classify_by_status {
            if is_blank(&contents.all_status_api_key) {
                return Err(Error::config(
                    "contents.getAllStatusContentsAPIKey",
                    "classifyByStatus requires the all-status API key",
                ));
            }
            if is_blank(&contents.metadata_api_key) {
                return Err(Error::config(
                    "contents.getContentsMetaDataAPIKey",
                    "classifyByStatus requires the metadata API key",
                ));
            }
        }

        for (key, value) in [
            ("api.contentBaseUrl", &self.api.content_base_url),
            ("api.managementBaseUrl", &self.api.management_base_url),
        ] {
            if let Some(raw) = value {
                url::Url::parse(raw)
                    .map_err(|e| Error::config(key, format!("invalid URL {:?}: {}", raw, e)))?;
            }
        }

        if self.api.timeout.is_zero() {
            return Err(Error::config("api.timeoutSecs", "timeout must be positive"));
        }

        Ok(())
    }

    /// Base URL of the content API, without a trailing slash
    pub fn content_base_url(&self) -> String {
        match &self.api.content_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.microcms.io/api/v1", self.service_id),
        }
    }

    /// Base URL of the management API contents listing, without a trailing slash
    pub fn management_base_url(&self) -> String {
        match &self.api.management_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.microcms-management.io/api/v1/contents",
                self.service_id
            ),
        }
    }
}

/// Endpoint names become a URL path segment and a directory name
fn is_path_segment(name: &str) -> bool {
    name != "." && !name.contains("..") && !name.contains(['/', '\\', '?', '#'])
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.is_empty())
}

fn default_request_unit() -> usize {
    10
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        Config {
            service_id: "backup-test".to_string(),
            contents: ContentsConfig {
                publish_api_key: "publish".to_string(),
                all_status_api_key: Some("all".to_string()),
                metadata_api_key: Some("meta".to_string()),
                endpoints: vec!["blogs".to_string()],
                classify_by_status: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn invalid_key(config: &Config) -> Option<String> {
        match config.validate() {
            Err(Error::Config { key, .. }) => key,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn parses_camel_case_file_format() {
        let json = r#"{
            "target": "contents",
            "serviceId": "test-service",
            "contents": {
                "getPublishContentsAPIKey": "pub-key",
                "getAllStatusContentsAPIKey": "all-key",
                "getContentsMetaDataAPIKey": "meta-key",
                "endpoints": ["test", "test2"],
                "requestUnit": 20,
                "classifyByStatus": true,
                "saveAsCSV": true
            }
        }"#;

        let config: Config = serde_json::from_str(json).expect("config must parse");

        assert_eq!(config.service_id, "test-service");
        assert_eq!(config.target, BackupTarget::Contents);
        assert_eq!(config.contents.publish_api_key, "pub-key");
        assert_eq!(config.contents.all_status_api_key.as_deref(), Some("all-key"));
        assert_eq!(config.contents.metadata_api_key.as_deref(), Some("meta-key"));
        assert_eq!(config.contents.endpoints, vec!["test", "test2"]);
        assert_eq!(config.contents.request_unit, 20);
        assert!(config.contents.classify_by_status);
        assert!(config.contents.save_as_csv);
        config.validate().expect("config must validate");
    }

    #[test]
    fn request_unit_defaults_to_ten() {
        let json = r#"{
            "serviceId": "test-service",
            "contents": {
                "getPublishContentsAPIKey": "k",
                "endpoints": ["test"]
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.contents.request_unit, 10);
        assert!(!config.contents.classify_by_status);
        assert!(!config.contents.save_as_csv);
        assert_eq!(config.api.timeout, Duration::from_secs(30));
    }

    #[test]
    fn request_unit_outside_range_is_rejected() {
        for bad in [0, 101, 1000] {
            let mut config = valid_config();
            config.contents.request_unit = bad;
            assert_eq!(
                invalid_key(&config).as_deref(),
                Some("contents.requestUnit"),
                "requestUnit {bad} must be rejected"
            );
        }
        for good in [1, 10, 100] {
            let mut config = valid_config();
            config.contents.request_unit = good;
            assert!(config.validate().is_ok(), "requestUnit {good} must pass");
        }
    }

    #[test]
    fn classification_requires_both_extra_keys() {
        let mut config = valid_config();
        config.contents.all_status_api_key = None;
        assert_eq!(
            invalid_key(&config).as_deref(),
            Some("contents.getAllStatusContentsAPIKey")
        );

        let mut config = valid_config();
        config.contents.metadata_api_key = Some(String::new());
        assert_eq!(
            invalid_key(&config).as_deref(),
            Some("contents.getContentsMetaDataAPIKey")
        );

        // Unclassified backups only need the publish key.
        let mut config = valid_config();
        config.contents.classify_by_status = false;
        config.contents.all_status_api_key = None;
        config.contents.metadata_api_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_service_id_and_endpoints_are_rejected() {
        let mut config = valid_config();
        config.service_id = "  ".to_string();
        assert_eq!(invalid_key(&config).as_deref(), Some("serviceId"));

        let mut config = valid_config();
        config.contents.endpoints.clear();
        assert_eq!(invalid_key(&config).as_deref(), Some("contents.endpoints"));

        let mut config = valid_config();
        config.contents.endpoints.push(String::new());
        assert_eq!(invalid_key(&config).as_deref(), Some("contents.endpoints"));
    }

    #[test]
    fn endpoint_names_must_be_single_path_segments() {
        for bad in ["../x", "a/b", "..", ".", "a\\b", "blogs?limit=1", "blogs#x"] {
            let mut config = valid_config();
            config.contents.endpoints = vec![bad.to_string()];
            assert_eq!(
                invalid_key(&config).as_deref(),
                Some("contents.endpoints"),
                "endpoint {bad:?} must be rejected"
            );
        }

        let mut config = valid_config();
        config.contents.endpoints = vec!["news-2024".to_string(), "blog_posts".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn target_defaults_to_contents_and_rejects_media() {
        let json = r#"{
            "serviceId": "s",
            "contents": {"getPublishContentsAPIKey": "k", "endpoints": ["e"]}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.target, BackupTarget::Contents);

        let mut config = valid_config();
        config.target = BackupTarget::All;
        assert!(config.validate().is_ok());

        config.target = BackupTarget::Media;
        assert_eq!(invalid_key(&config).as_deref(), Some("target"));
    }

    #[test]
    fn unknown_target_fails_to_parse() {
        let parsed =
            serde_json::from_str::<Config>(r#"{"serviceId": "s", "target": "everything"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn base_urls_default_to_service_hosts() {
        let config = valid_config();
        assert_eq!(
            config.content_base_url(),
            "https://backup-test.microcms.io/api/v1"
        );
        assert_eq!(
            config.management_base_url(),
            "https://backup-test.microcms-management.io/api/v1/contents"
        );
    }

    #[test]
    fn base_url_overrides_drop_trailing_slash() {
        let mut config = valid_config();
        config.api.content_base_url = Some("http://127.0.0.1:9000/api/v1/".to_string());
        config.api.management_base_url = Some("http://127.0.0.1:9001/contents".to_string());

        assert!(config.validate().is_ok());
        assert_eq!(config.content_base_url(), "http://127.0.0.1:9000/api/v1");
        assert_eq!(config.management_base_url(), "http://127.0.0.1:9001/contents");
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let mut config = valid_config();
        config.api.management_base_url = Some("not a url".to_string());
        assert_eq!(
            invalid_key(&config).as_deref(),
            Some("api.managementBaseUrl")
        );
    }

    #[test]
    fn from_file_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Config::from_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(Error::Config { .. })));

        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"{invalid json}").unwrap();
        let malformed = Config::from_file(&path);
        assert!(matches!(malformed, Err(Error::Config { .. })));
    }

    #[test]
    fn from_file_loads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let json = serde_json::to_string(&valid_config()).unwrap();
        std::fs::write(&path, json).unwrap();

        let config = Config::from_file(&path).expect("round-tripped config must load");
        assert_eq!(config.service_id, "backup-test");
        assert_eq!(config.contents.endpoints, vec!["blogs"]);
        assert!(config.contents.classify_by_status);
    }
}
