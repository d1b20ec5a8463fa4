use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Auto-archive delay for push messages.
///
/// All components zero means messages are never archived automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ArchivePolicy {
    #[serde(default)]
    pub days: u64,
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
}

impl ArchivePolicy {
    pub fn total_seconds(&self) -> u64 {
        self.days
            .saturating_mul(86_400)
            .saturating_add(self.hours.saturating_mul(3_600))
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.seconds)
    }

    pub fn is_active(&self) -> bool {
        self.total_seconds() > 0
    }

    /// Absolute archive instant for a message sent during the poll at `poll_time`.
    pub fn archive_at(&self, poll_time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_active() {
            return None;
        }
        let offset = i64::try_from(self.total_seconds()).ok()?;
        poll_time.checked_add_signed(Duration::try_seconds(offset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_inactive_by_default() {
        let policy = ArchivePolicy::default();
        assert!(!policy.is_active());
        assert_eq!(policy.archive_at(Utc::now()), None);
    }

    #[test]
    fn test_hour_and_a_half() {
        let policy = ArchivePolicy {
            days: 0,
            hours: 1,
            minutes: 30,
            seconds: 0,
        };
        let poll_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(policy.total_seconds(), 5400);
        let archive_at = policy.archive_at(poll_time).unwrap();
        assert_eq!(archive_at.timestamp(), poll_time.timestamp() + 5400);
    }

    #[test]
    fn test_unrepresentable_offset_has_no_archive_time() {
        let policy = ArchivePolicy {
            days: 200_000_000,
            ..ArchivePolicy::default()
        };
        assert!(policy.is_active());
        assert_eq!(policy.archive_at(Utc::now()), None);
    }

    #[test]
    fn test_all_components_summed() {
        let policy = ArchivePolicy {
            days: 2,
            hours: 3,
            minutes: 4,
            seconds: 5,
        };
        assert_eq!(policy.total_seconds(), 2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
    }
}
