use super::{EntityStatus, Location, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

/// Reasons a single vehicle record is rejected.
///
/// A rejected record is skipped for the current run only; the stored status
/// of that entity is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    NotAnObject,
    MissingStatus,
    InvalidStatus(String),
    MissingTimestamp,
    InvalidTimestamp(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::NotAnObject => write!(f, "record is not a JSON object"),
            RecordError::MissingStatus => write!(f, "fmsstatus_id is missing"),
            RecordError::InvalidStatus(v) => {
                write!(f, "fmsstatus_id must be a non-negative integer, got {}", v)
            }
            RecordError::MissingTimestamp => write!(f, "fmsstatus_ts is missing"),
            RecordError::InvalidTimestamp(v) => {
                write!(f, "fmsstatus_ts must be a Unix timestamp in seconds, got {}", v)
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// Parses one vehicle record from the `pull/all` response.
///
/// Required: `fmsstatus_id` (non-negative integer) and `fmsstatus_ts`
/// (Unix seconds). Names default to empty strings; `shortname` falls back
/// to `name`. Coordinates are kept only when both are non-zero.
pub fn parse_record(entity_id: &str, record: &Value) -> Result<EntityStatus, RecordError> {
    let obj = record.as_object().ok_or(RecordError::NotAnObject)?;

    let status_code = match obj.get("fmsstatus_id") {
        None | Some(Value::Null) => return Err(RecordError::MissingStatus),
        Some(v) => parse_status_code(v)?,
    };

    let status_since = match obj.get("fmsstatus_ts") {
        None | Some(Value::Null) => return Err(RecordError::MissingTimestamp),
        Some(v) => parse_timestamp(v)?,
    };

    let display_name = string_field(record, "name");
    let short_name = match string_field(record, "shortname") {
        s if s.is_empty() => display_name.clone(),
        s => s,
    };

    let location = Location::from_coordinates(
        obj.get("lat").and_then(Value::as_f64),
        obj.get("lng").and_then(Value::as_f64),
    );

    Ok(EntityStatus {
        entity_id: entity_id.to_string(),
        status_code,
        status_since,
        display_name,
        short_name,
        location,
    })
}

fn parse_status_code(value: &Value) -> Result<StatusCode, RecordError> {
    value
        .as_u64()
        .and_then(|n| StatusCode::try_from(n).ok())
        .ok_or_else(|| RecordError::InvalidStatus(value.to_string()))
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, RecordError> {
    value
        .as_i64()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| RecordError::InvalidTimestamp(value.to_string()))
}

fn string_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
