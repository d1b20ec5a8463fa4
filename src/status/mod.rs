use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

mod validation;
#[cfg(test)]
mod tests;

pub use validation::{parse_record, RecordError};

/// Operational status code reported by the fleet (FMS status, 0-9 in practice).
pub type StatusCode = u32;

/// Geographic position of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Returns a location only when both coordinates are reported and non-zero.
    ///
    /// The source reports `0`/`null` for vehicles without a position fix.
    pub fn from_coordinates(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// Current status of one tracked entity, as reported by a single poll.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityStatus {
    /// Stable identifier (the source's vehicle id)
    pub entity_id: String,

    /// Current operational state
    pub status_code: StatusCode,

    /// When the source observed the last change (not the poll time)
    pub status_since: DateTime<Utc>,

    /// Full vehicle name
    pub display_name: String,

    /// Short call sign
    pub short_name: String,

    pub location: Option<Location>,
}

/// Side table mapping status codes to human-readable labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusLabels {
    labels: HashMap<StatusCode, String>,
}

impl StatusLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: StatusCode, label: impl Into<String>) {
        self.labels.insert(code, label.into());
    }

    pub fn get(&self, code: StatusCode) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    /// Label for `code`, falling back to `Status <code>` when the source has none.
    pub fn label_for(&self, code: StatusCode) -> String {
        self.get(code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Status {}", code))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(StatusCode, String)> for StatusLabels {
    fn from_iter<I: IntoIterator<Item = (StatusCode, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

/// Result of one successful fetch from the status source.
///
/// Records are kept as raw JSON so a single malformed vehicle can be skipped
/// without discarding the rest of the batch.
#[derive(Clone, Debug, Default)]
pub struct FleetReport {
    /// `(entity_id, raw record)` in source order
    pub records: Vec<(String, Value)>,

    pub labels: StatusLabels,
}

impl FleetReport {
    pub fn new(records: Vec<(String, Value)>, labels: StatusLabels) -> Self {
        Self { records, labels }
    }

    /// Parses every record, yielding either the entity status or the reason it was rejected.
    pub fn entities(
        &self,
    ) -> impl Iterator<Item = (&str, Result<EntityStatus, RecordError>)> + '_ {
        self.records
            .iter()
            .map(|(id, record)| (id.as_str(), parse_record(id, record)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
