use crate::classifier::{TransitionEvent, TransitionKind};
use crate::status::{Location, StatusLabels};
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


const SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MAP_LINK_BASE: &str = "https://www.google.com/maps/place/";

/// How a vehicle position is rendered in the message body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFormat {
    /// Google Maps link
    MapLink,
    /// Raw `lat,lng`
    Coordinates,
    /// Never include the position
    None,
}

impl Default for LocationFormat {
    fn default() -> Self {
        LocationFormat::MapLink
    }
}

/// Time zone used to render the since-timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayZone {
    /// Host local time
    Local,
    Fixed(FixedOffset),
}

impl Default for DisplayZone {
    fn default() -> Self {
        DisplayZone::Local
    }
}

impl DisplayZone {
    pub fn utc() -> Self {
        DisplayZone::Fixed(Utc.fix())
    }

    /// Formats `ts` as `YYYY-MM-DD HH:MM:SS` in this zone.
    pub fn format(&self, ts: DateTime<Utc>) -> String {
        match self {
            DisplayZone::Local => ts.with_timezone(&Local).format(SINCE_FORMAT).to_string(),
            DisplayZone::Fixed(offset) => ts.with_timezone(offset).format(SINCE_FORMAT).to_string(),
        }
    }
}

/// Invalid `timezone` setting
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidZone(pub String);

impl fmt::Display for InvalidZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid timezone '{}': expected \"local\", \"UTC\" or an offset like \"+01:00\"",
            self.0
        )
    }
}

impl std::error::Error for InvalidZone {}

impl FromStr for DisplayZone {
    type Err = InvalidZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" | "" => Ok(DisplayZone::Local),
            "utc" | "z" => Ok(DisplayZone::utc()),
            _ => trimmed
                .parse::<FixedOffset>()
                .map(DisplayZone::Fixed)
                .map_err(|_| InvalidZone(s.to_string())),
        }
    }
}

/// Rendered notification text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedMessage {
    pub title: String,
    pub body: String,
}

/// Renders notification text from transition events.
///
/// Output depends only on the event, the status labels and the composer
/// settings, never on the clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageComposer {
    location_format: LocationFormat,
    zone: DisplayZone,
}

impl MessageComposer {
    pub fn new(location_format: LocationFormat, zone: DisplayZone) -> Self {
        Self {
            location_format,
            zone,
        }
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    pub fn compose(&self, event: &TransitionEvent, labels: &StatusLabels) -> ComposedMessage {
        let short = &event.short_name;

        let (title, headline) = match event.kind {
            TransitionKind::Changed => (
                format!("Änderung Fahrzeugstatus {}!", short),
                "Status von Fahrzeug wurde geändert.".to_string(),
            ),
            TransitionKind::Unavailable => (
                format!("{} nicht einsatzbereit!", short),
                format!("Fahrzeug {} ist nicht einsatzbereit.", short),
            ),
            TransitionKind::AvailableAgain => (
                format!("{} wieder einsatzbereit!", short),
                format!("Fahrzeug {} ist wieder einsatzbereit.", short),
            ),
        };

        let mut body = format!(
            "{}\nFahrzeugname: {}\nKurzname: {}\nNeuer Status (seit {}): {} ({})\n",
            headline,
            event.display_name,
            short,
            self.zone.format(event.status_since),
            labels.label_for(event.new_status),
            event.new_status,
        );

        if let Some(position) = event.location.and_then(|l| self.render_location(l)) {
            body.push_str(&format!("\nPosition:\n{}\n", position));
        }

        ComposedMessage { title, body }
    }

    fn render_location(&self, location: Location) -> Option<String> {
        match self.location_format {
            LocationFormat::MapLink => Some(format!(
                "{}{},{}",
                MAP_LINK_BASE, location.lat, location.lng
            )),
            LocationFormat::Coordinates => Some(format!("{},{}", location.lat, location.lng)),
            LocationFormat::None => None,
        }
    }
}
