use crate::status::{EntityStatus, Location, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};


/// FMS status 6: "nicht einsatzbereit" (out of service)
pub const DEFAULT_UNAVAILABLE_STATUS: StatusCode = 6;

/// Which status changes warrant a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassificationPolicy {
    /// Every change of status code is reported.
    AnyChange,
    /// Only entering or leaving the designated unavailable status is reported.
    AvailabilityEdge { unavailable: StatusCode },
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        ClassificationPolicy::AnyChange
    }
}

/// What kind of transition an event describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Generic status change
    Changed,
    /// Entered the unavailable status
    Unavailable,
    /// Left the unavailable status
    AvailableAgain,
}

/// A status transition that warrants a notification.
///
/// Produced by the classifier and consumed immediately by composer and
/// dispatcher; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionEvent {
    pub entity_id: String,
    pub display_name: String,
    pub short_name: String,
    pub old_status: StatusCode,
    pub new_status: StatusCode,
    pub status_since: DateTime<Utc>,
    pub location: Option<Location>,
    pub kind: TransitionKind,
}

impl TransitionEvent {
    fn new(entity: &EntityStatus, old_status: StatusCode, kind: TransitionKind) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            display_name: entity.display_name.clone(),
            short_name: entity.short_name.clone(),
            old_status,
            new_status: entity.status_code,
            status_since: entity.status_since,
            location: entity.location,
            kind,
        }
    }
}

/// Outcome of comparing one reading against the stored status.
///
/// In every case the caller records the new status code in the snapshot;
/// classification only decides whether a notification fires.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// First sighting: seed the snapshot, no notification.
    NewEntity,
    /// Nothing to report (same code, or a change the policy ignores).
    Unchanged,
    Transitioned(TransitionEvent),
}

impl Classification {
    pub fn event(&self) -> Option<&TransitionEvent> {
        match self {
            Classification::Transitioned(event) => Some(event),
            _ => None,
        }
    }
}

/// Compares polled readings with the last-known status.
#[derive(Clone, Copy, Debug, Default)]
pub struct Classifier {
    policy: ClassificationPolicy,
}

impl Classifier {
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    /// Classifies `entity` given its previously stored status.
    pub fn classify(&self, previous: Option<StatusCode>, entity: &EntityStatus) -> Classification {
        let old = match previous {
            None => return Classification::NewEntity,
            Some(old) if old == entity.status_code => return Classification::Unchanged,
            Some(old) => old,
        };
        let new = entity.status_code;

        let kind = match self.policy {
            ClassificationPolicy::AnyChange => Some(TransitionKind::Changed),
            ClassificationPolicy::AvailabilityEdge { unavailable } => {
                if new == unavailable {
                    Some(TransitionKind::Unavailable)
                } else if old == unavailable {
                    Some(TransitionKind::AvailableAgain)
                } else {
                    None
                }
            }
        };

        match kind {
            Some(kind) => Classification::Transitioned(TransitionEvent::new(entity, old, kind)),
            None => Classification::Unchanged,
        }
    }
}
