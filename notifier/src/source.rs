use anyhow::Result;
use async_trait::async_trait;
use fmswatch::FleetReport;

/// Source of current fleet status.
///
/// A fetch either yields the whole report or fails as a whole; a failed
/// fetch aborts the run before the snapshot is touched. Individual malformed
/// vehicle records are not a fetch failure, they are rejected later when the
/// report is parsed.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Identifier used in logs (e.g., "divera")
    fn name(&self) -> &str;

    /// Fetches the current status of every vehicle plus the status label table.
    ///
    /// # Returns
    /// * `Ok(FleetReport)` - Raw vehicle records and labels
    /// * `Err(...)` - Network, authentication or envelope parse errors
    async fn fetch(&self) -> Result<FleetReport>;
}
