// Vehicle status records and per-record parsing
pub mod status;

// Durable last-known status per vehicle
pub mod snapshot;

// Transition detection policies
pub mod classifier;

// Notification text rendering
pub mod composer;

// Configuration loading and validation
pub mod config;

// Transition history file
pub mod history;

pub use classifier::{
    Classification, ClassificationPolicy, Classifier, TransitionEvent, TransitionKind,
};
pub use composer::{ComposedMessage, MessageComposer};
pub use snapshot::{SnapshotStore, StatusSnapshot};
pub use status::{EntityStatus, FleetReport, StatusCode, StatusLabels};
