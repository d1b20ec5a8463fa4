//! Fan-out of one composed message to the configured channels.
//!
//! Order is fixed: email first, then one push per recipient selector
//! (users or groups, then pagers). A failing channel never prevents the
//! next one from being tried.

use crate::{EmailMessage, EmailSink, PushMessage, PushSink, RecipientSelector};
use chrono::{DateTime, Utc};
use fmswatch::config::{ArchivePolicy, PushConfig};
use fmswatch::{ComposedMessage, TransitionEvent};
use std::fmt;
use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Channel not attempted (nothing configured)
    Skipped(String),
    Failed(String),
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Sent => write!(f, "sent"),
            DeliveryOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            DeliveryOutcome::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}

/// One channel attempt (e.g., channel `email`, `push:users[1000]`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub channel: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempts: Vec<DeliveryAttempt>,
}

impl DispatchReport {
    fn record(&mut self, channel: impl Into<String>, outcome: DeliveryOutcome) {
        self.attempts.push(DeliveryAttempt {
            channel: channel.into(),
            outcome,
        });
    }

    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.attempts.iter().filter(|a| pred(&a.outcome)).count()
    }
}

/// Recipient selectors in send order.
///
/// Users take precedence over groups; pagers are always added when set.
pub fn selectors_from(push: &PushConfig) -> Vec<RecipientSelector> {
    let mut selectors = Vec::new();
    if !push.users.is_empty() {
        selectors.push(RecipientSelector::Users(push.users.clone()));
    } else if !push.groups.is_empty() {
        selectors.push(RecipientSelector::Groups(push.groups.clone()));
    }
    if !push.pager_ids.is_empty() {
        selectors.push(RecipientSelector::Pagers(push.pager_ids.clone()));
    }
    selectors
}

pub struct Dispatcher {
    email: Option<(Box<dyn EmailSink>, Vec<String>)>,
    push: Option<(Box<dyn PushSink>, Vec<RecipientSelector>)>,
    archive: ArchivePolicy,
}

impl Dispatcher {
    pub fn new(archive: ArchivePolicy) -> Self {
        Self {
            email: None,
            push: None,
            archive,
        }
    }

    pub fn with_email(mut self, sink: Box<dyn EmailSink>, recipients: Vec<String>) -> Self {
        self.email = Some((sink, recipients));
        self
    }

    pub fn with_push(mut self, sink: Box<dyn PushSink>, selectors: Vec<RecipientSelector>) -> Self {
        self.push = Some((sink, selectors));
        self
    }

    /// Delivers `message` on every channel. Never fails; see the report.
    pub async fn dispatch(
        &self,
        event: &TransitionEvent,
        message: &ComposedMessage,
        poll_time: DateTime<Utc>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        self.dispatch_email(event, message, &mut report).await;
        self.dispatch_push(event, message, poll_time, &mut report).await;
        report
    }

    async fn dispatch_email(
        &self,
        event: &TransitionEvent,
        message: &ComposedMessage,
        report: &mut DispatchReport,
    ) {
        let (sink, recipients) = match &self.email {
            Some((sink, recipients)) if !recipients.is_empty() => (sink, recipients),
            _ => {
                info!(
                    entity_id = %event.entity_id,
                    "No email recipients configured, email not sent"
                );
                report.record("email", DeliveryOutcome::Skipped("no recipients".to_string()));
                return;
            }
        };

        let email = EmailMessage {
            subject: message.title.clone(),
            body: message.body.clone(),
            to: recipients.clone(),
        };
        match sink.send(&email).await {
            Ok(()) => {
                info!(
                    entity_id = %event.entity_id,
                    sink = sink.name(),
                    recipients = recipients.len(),
                    "Email sent"
                );
                report.record("email", DeliveryOutcome::Sent);
            }
            Err(e) => {
                error!(
                    entity_id = %event.entity_id,
                    sink = sink.name(),
                    recipients = %recipients.join(","),
                    error = %format!("{:#}", e),
                    "Email delivery failed"
                );
                report.record("email", DeliveryOutcome::Failed(format!("{:#}", e)));
            }
        }
    }

    async fn dispatch_push(
        &self,
        event: &TransitionEvent,
        message: &ComposedMessage,
        poll_time: DateTime<Utc>,
        report: &mut DispatchReport,
    ) {
        let (sink, selectors) = match &self.push {
            Some((sink, selectors)) if !selectors.is_empty() => (sink, selectors),
            Some(_) => {
                info!(entity_id = %event.entity_id, "No push recipients configured, push not sent");
                report.record("push", DeliveryOutcome::Skipped("no recipients".to_string()));
                return;
            }
            None => {
                info!(entity_id = %event.entity_id, "Push disabled");
                report.record("push", DeliveryOutcome::Skipped("no push backend".to_string()));
                return;
            }
        };

        let archive_at = self.archive.archive_at(poll_time);
        if archive_at.is_none() && self.archive.is_active() {
            warn!(
                entity_id = %event.entity_id,
                seconds = self.archive.total_seconds(),
                "Archive offset out of range, sending without auto-archive"
            );
        }

        for selector in selectors {
            let channel = format!("push:{}", selector);
            let push = PushMessage {
                title: message.title.clone(),
                body: message.body.clone(),
                recipients: selector.clone(),
                archive_at,
                location: event.location,
            };

            match sink.send(&push).await {
                Ok(()) => {
                    info!(
                        entity_id = %event.entity_id,
                        sink = sink.name(),
                        recipients = %selector,
                        "Push sent"
                    );
                    report.record(channel, DeliveryOutcome::Sent);
                }
                Err(e) => {
                    error!(
                        entity_id = %event.entity_id,
                        sink = sink.name(),
                        recipients = %selector,
                        error = %format!("{:#}", e),
                        "Push delivery failed"
                    );
                    report.record(channel, DeliveryOutcome::Failed(format!("{:#}", e)));
                }
            }
        }
    }
}
