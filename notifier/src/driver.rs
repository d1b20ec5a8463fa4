//! One polling run: load snapshot, fetch, classify, notify, persist.

use crate::dispatcher::{selectors_from, Dispatcher};
use crate::divera::api::DiveraClient;
use crate::divera::{DiveraStatusSource, LegacyNewsSink, NewsV2Sink};
use crate::smtp::SmtpEmailSink;
use crate::{PushSink, StatusSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fmswatch::config::{AppConfig, PushBackend};
use fmswatch::history::TransitionLog;
use fmswatch::snapshot::open_store;
use fmswatch::{Classification, Classifier, MessageComposer, SnapshotStore};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Counters for one run, logged at the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub entities_seen: usize,
    pub new_entities: usize,
    pub unchanged: usize,
    pub transitions: usize,
    pub skipped_records: usize,
    pub failed_deliveries: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seen, {} new, {} unchanged, {} transitions, {} skipped, {} failed deliveries",
            self.entities_seen,
            self.new_entities,
            self.unchanged,
            self.transitions,
            self.skipped_records,
            self.failed_deliveries
        )
    }
}

pub struct PollingDriver {
    source: Box<dyn StatusSource>,
    store: Box<dyn SnapshotStore>,
    classifier: Classifier,
    composer: MessageComposer,
    dispatcher: Dispatcher,
    history: Option<TransitionLog>,
}

impl PollingDriver {
    pub fn new(
        source: Box<dyn StatusSource>,
        store: Box<dyn SnapshotStore>,
        classifier: Classifier,
        composer: MessageComposer,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            source,
            store,
            classifier,
            composer,
            dispatcher,
            history: None,
        }
    }

    pub fn with_history(mut self, history: TransitionLog) -> Self {
        self.history = Some(history);
        self
    }

    /// Wires the Divera source, the configured sinks and the snapshot store.
    ///
    /// `config` must already be validated. Must be called inside a tokio runtime.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = DiveraClient::with_base_url(
            config.api_key.clone(),
            config.source.base_url.clone(),
            Duration::from_secs(config.source.timeout_secs),
        )?;

        let store = open_store(&config.snapshot).context("Failed to open snapshot store")?;
        let composer = config.message.composer()?;
        let classifier = Classifier::new(config.classification.policy());

        let mut dispatcher = Dispatcher::new(config.push.archive);
        let push_sink: Option<Box<dyn PushSink>> = match config.push.backend {
            PushBackend::NewsV2 => Some(Box::new(NewsV2Sink::new(client.clone()))),
            PushBackend::Legacy => Some(Box::new(LegacyNewsSink::new(client.clone()))),
            PushBackend::Disabled => None,
        };
        if let Some(sink) = push_sink {
            dispatcher = dispatcher.with_push(sink, selectors_from(&config.push));
        }
        if config.email.enabled {
            let sink = SmtpEmailSink::from_config(&config.email)
                .context("Failed to configure SMTP transport")?;
            dispatcher = dispatcher.with_email(Box::new(sink), config.email.recipients.clone());
        }

        let mut driver = Self::new(
            Box::new(DiveraStatusSource::new(client)),
            store,
            classifier,
            composer,
            dispatcher,
        );
        if let Some(path) = &config.history.path {
            driver = driver.with_history(TransitionLog::new(path, composer.zone()));
        }
        Ok(driver)
    }

    /// Executes one run with the current time as poll time.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let span = info_span!("poll_run", run_id = %Uuid::now_v7());
        self.run_at(Utc::now()).instrument(span).await
    }

    /// Executes one run; `poll_time` is used for every archive computation.
    ///
    /// Returns an error when the snapshot cannot be loaded or saved, or when
    /// the fetch fails. A failed fetch leaves the stored snapshot untouched.
    pub async fn run_at(&self, poll_time: DateTime<Utc>) -> Result<RunSummary> {
        let mut snapshot = self.store.load().context("Failed to load snapshot")?;
        debug!(entries = snapshot.len(), "Snapshot loaded");

        let report = match self.source.fetch().await {
            Ok(report) => report,
            Err(e) => {
                error!(
                    source = self.source.name(),
                    error = %format!("{:#}", e),
                    "Fetch failed, snapshot not updated"
                );
                return Err(e.context("Failed to fetch fleet status"));
            }
        };
        info!(source = self.source.name(), vehicles = report.len(), "Fleet status fetched");

        let mut summary = RunSummary::default();

        for (entity_id, parsed) in report.entities() {
            summary.entities_seen += 1;

            let entity = match parsed {
                Ok(entity) => entity,
                Err(e) => {
                    warn!(entity_id = %entity_id, error = %e, "Skipping malformed vehicle record");
                    summary.skipped_records += 1;
                    continue;
                }
            };

            let previous = snapshot.get(&entity.entity_id);
            match self.classifier.classify(previous, &entity) {
                Classification::NewEntity => {
                    info!(
                        entity_id = %entity.entity_id,
                        name = %entity.display_name,
                        status = entity.status_code,
                        "New vehicle, recording status"
                    );
                    summary.new_entities += 1;
                }
                Classification::Unchanged => {
                    debug!(
                        entity_id = %entity.entity_id,
                        status = entity.status_code,
                        "No notification"
                    );
                    summary.unchanged += 1;
                }
                Classification::Transitioned(event) => {
                    info!(
                        entity_id = %event.entity_id,
                        name = %event.display_name,
                        old_status = event.old_status,
                        new_status = event.new_status,
                        kind = ?event.kind,
                        "Status transition"
                    );
                    summary.transitions += 1;

                    let message = self.composer.compose(&event, &report.labels);
                    let delivery = self.dispatcher.dispatch(&event, &message, poll_time).await;
                    summary.failed_deliveries += delivery.failed();

                    if let Some(history) = &self.history {
                        if let Err(e) = history.append(&event) {
                            warn!(
                                path = %history.path().display(),
                                error = %format!("{:#}", e),
                                "Failed to append transition history"
                            );
                        }
                    }
                }
            }

            snapshot.record(&entity.entity_id, entity.status_code);
        }

        self.store
            .save(&snapshot)
            .context("Failed to save snapshot")?;

        info!(
            seen = summary.entities_seen,
            new = summary.new_entities,
            unchanged = summary.unchanged,
            transitions = summary.transitions,
            skipped = summary.skipped_records,
            failed_deliveries = summary.failed_deliveries,
            "Run complete"
        );
        Ok(summary)
    }
}
