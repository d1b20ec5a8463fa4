use anyhow::{anyhow, Context, Result};
use fmswatch::{FleetReport, StatusCode, StatusLabels};
use reqwest::{Client, StatusCode as HttpStatus};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::time::Duration;

use super::config::{LEGACY_NEWS_PATH, NEWS_V2_PATH, PULL_ALL_PATH, USER_AGENT};

/// `GET /api/v2/pull/all` response (only the parts we read).
#[derive(Debug, Deserialize)]
pub struct PullAllResponse {
    pub data: PullAllData,
}

#[derive(Debug, Deserialize)]
pub struct PullAllData {
    pub cluster: ClusterData,
}

#[derive(Debug, Deserialize)]
pub struct ClusterData {
    /// Vehicle id -> vehicle record
    #[serde(default, deserialize_with = "object_or_empty_array")]
    pub vehicle: Map<String, Value>,
    #[serde(default)]
    pub fms_status: FmsStatusTable,
}

#[derive(Debug, Default, Deserialize)]
pub struct FmsStatusTable {
    /// Status code (as string) -> `{ "name": ... }`
    #[serde(default, deserialize_with = "object_or_empty_array")]
    pub items: Map<String, Value>,
}

/// Divera encodes empty maps as `[]`.
fn object_or_empty_array<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Array(items) if items.is_empty() => Ok(Map::new()),
        other => Err(D::Error::custom(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

impl PullAllResponse {
    /// Converts the response into a report; vehicle records stay raw.
    pub fn into_report(self) -> FleetReport {
        let cluster = self.data.cluster;

        let labels: StatusLabels = cluster
            .fms_status
            .items
            .iter()
            .filter_map(|(code, item)| {
                let code = code.parse::<StatusCode>().ok()?;
                let name = item.get("name")?.as_str()?;
                Some((code, name.to_string()))
            })
            .collect();

        let records = cluster.vehicle.into_iter().collect();

        FleetReport::new(records, labels)
    }
}

/// HTTP client for the Divera 24/7 API.
///
/// Authenticates with the `accesskey` query parameter.
#[derive(Clone)]
pub struct DiveraClient {
    access_key: String,
    http_client: Client,
    base_url: String,
}

impl DiveraClient {
    /// Create a client for `base_url` (`[source] base_url`, or a mock server in tests).
    pub fn with_base_url(access_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            access_key,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all vehicles of the unit with their current FMS status.
    pub async fn fetch_pull_all(&self) -> Result<PullAllResponse> {
        let url = format!("{}{}", self.base_url, PULL_ALL_PATH);
        let response = self
            .http_client
            .get(&url)
            .query(&[("accesskey", self.access_key.as_str())])
            .send()
            .await
            .context("Failed to send pull/all request")?;

        check_response_status(&response)?;
        response
            .json::<PullAllResponse>()
            .await
            .context("Failed to parse pull/all response")
    }

    /// Create a news item from a v2 JSON payload.
    pub async fn post_news(&self, payload: &Value) -> Result<()> {
        let url = format!("{}{}", self.base_url, NEWS_V2_PATH);
        let response = self
            .http_client
            .post(&url)
            .query(&[("accesskey", self.access_key.as_str())])
            .json(payload)
            .send()
            .await
            .context("Failed to send news request")?;

        check_response_status(&response)?;
        let body: Value = response
            .json()
            .await
            .context("Failed to parse news response")?;
        check_success_flag(&body)
    }

    /// Create a news item through the legacy query-string endpoint.
    ///
    /// `query` is the already URL-encoded parameter string without `accesskey`.
    pub async fn get_legacy_news(&self, query: &str) -> Result<()> {
        let url = format!(
            "{}{}?accesskey={}&{}",
            self.base_url,
            LEGACY_NEWS_PATH,
            urlencoding::encode(&self.access_key),
            query
        );
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Failed to send legacy news request")?;

        check_response_status(&response)?;
        let body: Value = response
            .json()
            .await
            .context("Failed to parse legacy news response")?;
        check_success_flag(&body)
    }
}

/// Check the response status and map known error codes to descriptive errors.
///
/// - 401/403 → auth error (access key invalid or lacking permission)
/// - Other non-2xx → generic API error
fn check_response_status(response: &reqwest::Response) -> Result<()> {
    match response.status() {
        HttpStatus::UNAUTHORIZED | HttpStatus::FORBIDDEN => Err(anyhow!(
            "Divera auth error ({}): access key invalid or not permitted",
            response.status()
        )),
        s if !s.is_success() => Err(anyhow!("Divera API error: {}", s)),
        _ => Ok(()),
    }
}

/// Divera reports rejected requests with `"success": false` and HTTP 200.
fn check_success_flag(body: &Value) -> Result<()> {
    match body.get("success").and_then(Value::as_bool) {
        Some(false) => {
            let detail = body
                .get("errors")
                .or_else(|| body.get("message"))
                .map(|v| v.to_string())
                .unwrap_or_else(|| "no details".to_string());
            Err(anyhow!("Divera rejected the request: {}", detail))
        }
        _ => Ok(()),
    }
}
