//! fmswatch notifier - polls fleet status and sends change notifications.
//!
//! This crate wires the `fmswatch` core (snapshot, classifier, composer) to
//! the outside world: the Divera status source, push sinks and SMTP.
//!
//! # Architecture
//!
//! ```text
//!     Divera pull/all (StatusSource)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       PollingDriver (one run)            │
//! │  - Load snapshot                         │
//! │  - Classify each vehicle                 │
//! │  - Compose + dispatch transitions        │
//! │  - Persist snapshot                      │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Dispatcher                         │
//! │  - Email (all recipients in To)          │
//! │  - Push: users | groups, then pagers     │
//! │  - Failures logged, never fatal          │
//! └─────────────────────────────────────────┘
//!          ↓                    ↓
//!     SmtpEmailSink      NewsV2Sink / LegacyNewsSink
//! ```
//!
//! # Core Types
//!
//! - [`StatusSource`] - Trait for fetching the current fleet report
//! - [`PushSink`] / [`EmailSink`] - Traits for notification transports
//! - [`Dispatcher`] - Channel selection and partial-failure handling
//! - [`PollingDriver`] - Orchestrates a single run
//!
//! # Adding a Push Backend
//!
//! ```no_run
//! use anyhow::Result;
//! use async_trait::async_trait;
//! use fmswatch_notifier::{PushMessage, PushSink};
//!
//! struct ConsoleSink;
//!
//! #[async_trait]
//! impl PushSink for ConsoleSink {
//!     fn name(&self) -> &str {
//!         "console"
//!     }
//!
//!     async fn send(&self, message: &PushMessage) -> Result<()> {
//!         println!("{}: {}", message.title, message.body);
//!         Ok(())
//!     }
//! }
//! ```

mod sink;
mod source;
mod types;
pub mod dispatcher;
pub mod divera;
pub mod driver;
pub mod smtp;

// Re-export public types
pub use dispatcher::{DeliveryAttempt, DeliveryOutcome, DispatchReport, Dispatcher};
pub use driver::{PollingDriver, RunSummary};
pub use sink::{EmailSink, PushSink};
pub use source::StatusSource;
pub use types::{EmailMessage, PushMessage, RecipientSelector};
