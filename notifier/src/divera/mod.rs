pub mod api;
pub mod config;
pub mod payload;

use crate::{PushMessage, PushSink, StatusSource};
use anyhow::Result;
use async_trait::async_trait;
use fmswatch::FleetReport;
use tracing::debug;

use self::api::DiveraClient;
use self::payload::{legacy_news_query, news_v2_payload};

/// Divera status source: reads every vehicle of the unit from `pull/all`.
pub struct DiveraStatusSource {
    client: DiveraClient,
}

impl DiveraStatusSource {
    pub fn new(client: DiveraClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusSource for DiveraStatusSource {
    fn name(&self) -> &str {
        "divera"
    }

    async fn fetch(&self) -> Result<FleetReport> {
        let report = self.client.fetch_pull_all().await?.into_report();
        debug!(
            vehicles = report.len(),
            labels = report.labels.len(),
            "Fetched fleet report"
        );
        Ok(report)
    }
}

/// Push backend using the structured `POST /api/v2/news` endpoint.
pub struct NewsV2Sink {
    client: DiveraClient,
}

impl NewsV2Sink {
    pub fn new(client: DiveraClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushSink for NewsV2Sink {
    fn name(&self) -> &str {
        "divera-news-v2"
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        let payload = news_v2_payload(message);
        debug!(payload = %payload, "Posting news");
        self.client.post_news(&payload).await
    }
}

/// Push backend using the legacy `GET /api/news` query-string endpoint.
pub struct LegacyNewsSink {
    client: DiveraClient,
}

impl LegacyNewsSink {
    pub fn new(client: DiveraClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushSink for LegacyNewsSink {
    fn name(&self) -> &str {
        "divera-legacy"
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        self.client.get_legacy_news(&legacy_news_query(message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecipientSelector;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn client(server: &Server) -> DiveraClient {
        DiveraClient::with_base_url("test-key".to_string(), server.url(), TIMEOUT).unwrap()
    }

    fn message(recipients: RecipientSelector) -> PushMessage {
        PushMessage {
            title: "RTW 1 nicht einsatzbereit!".to_string(),
            body: "Fahrzeug RTW 1 ist nicht einsatzbereit.\n".to_string(),
            recipients,
            archive_at: None,
            location: None,
        }
    }

    #[test]
    fn test_names() {
        let server_url = "http://127.0.0.1:1".to_string();
        let client = DiveraClient::with_base_url("k".into(), server_url, TIMEOUT).unwrap();
        assert_eq!(DiveraStatusSource::new(client.clone()).name(), "divera");
        assert_eq!(NewsV2Sink::new(client.clone()).name(), "divera-news-v2");
        assert_eq!(LegacyNewsSink::new(client).name(), "divera-legacy");
    }

    #[tokio::test]
    async fn test_news_v2_sink_posts_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/news")
            .match_query(Matcher::UrlEncoded("accesskey".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "News": {
                    "title": "RTW 1 nicht einsatzbereit!",
                    "notification_type": 4,
                    "user_cluster_relation": ["1000"]
                }
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"id": 1}}"#)
            .create_async()
            .await;

        let sink = NewsV2Sink::new(client(&server));
        sink.send(&message(RecipientSelector::Users(vec!["1000".into()])))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_news_v2_sink_auth_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/news")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let sink = NewsV2Sink::new(client(&server));
        let err = sink
            .send(&message(RecipientSelector::Groups(vec!["Zug 1".into()])))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("auth error"));
    }

    #[tokio::test]
    async fn test_legacy_sink_sends_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/news")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("accesskey".into(), "test-key".into()),
                Matcher::UrlEncoded("title".into(), "RTW 1 nicht einsatzbereit!".into()),
                Matcher::UrlEncoded("ric".into(), "12345,67890".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let sink = LegacyNewsSink::new(client(&server));
        sink.send(&message(RecipientSelector::Pagers(vec![
            "12345".into(),
            "67890".into(),
        ])))
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_source_fetch_error_propagates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/pull/all")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let source = DiveraStatusSource::new(client(&server));
        assert!(source.fetch().await.is_err());
    }
}
