use chrono::{DateTime, Utc};
use fmswatch::status::Location;
use std::fmt;

/// Who receives a push message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecipientSelector {
    /// User foreign keys
    Users(Vec<String>),
    /// Group titles
    Groups(Vec<String>),
    /// Pager identifiers (RICs)
    Pagers(Vec<String>),
}

impl RecipientSelector {
    pub fn kind(&self) -> &'static str {
        match self {
            RecipientSelector::Users(_) => "users",
            RecipientSelector::Groups(_) => "groups",
            RecipientSelector::Pagers(_) => "pagers",
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            RecipientSelector::Users(ids)
            | RecipientSelector::Groups(ids)
            | RecipientSelector::Pagers(ids) => ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

impl fmt::Display for RecipientSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind(), self.ids().join(","))
    }
}

/// Push message handed to a [`PushSink`](crate::PushSink).
#[derive(Clone, Debug, PartialEq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub recipients: RecipientSelector,
    /// When set, the message is archived automatically at this instant
    pub archive_at: Option<DateTime<Utc>>,
    pub location: Option<Location>,
}

/// Email handed to an [`EmailSink`](crate::EmailSink).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    /// All recipients, sent as a single message
    pub to: Vec<String>,
}
