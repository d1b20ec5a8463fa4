use crate::types::{EmailMessage, PushMessage};
use anyhow::Result;
use async_trait::async_trait;

/// Push notification transport.
///
/// Implementations deliver one message to one recipient selector. Errors
/// are reported to the dispatcher, which logs them and carries on; sinks
/// never retry.
///
/// # Example
/// ```no_run
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use fmswatch_notifier::{PushMessage, PushSink};
///
/// struct Discard;
///
/// #[async_trait]
/// impl PushSink for Discard {
///     fn name(&self) -> &str {
///         "discard"
///     }
///
///     async fn send(&self, _message: &PushMessage) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PushSink: Send + Sync {
    /// Backend identifier used in logs (e.g., "divera-news-v2")
    fn name(&self) -> &str;

    /// Sends `message` to its recipient selector.
    async fn send(&self, message: &PushMessage) -> Result<()>;
}

/// Email transport.
///
/// One call sends one message with every recipient in `To`.
#[async_trait]
pub trait EmailSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &EmailMessage) -> Result<()>;
}
