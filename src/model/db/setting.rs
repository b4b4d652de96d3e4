use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the instant (RFC 3339) from which the public leaderboard opens.
pub const LEADERBOARD_VISIBLE_TIME: &str = "leaderboard_visible_time";

/// A single configuration value, keyed by a unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
}

/// Parse a stored timestamp setting.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Render an instant the way timestamp settings are stored.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn instants_survive_storage() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        assert_eq!(parse_instant(&format_instant(instant)), Some(instant));
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let parsed = parse_instant("2025-03-14T10:30:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap());
        assert_eq!(parse_instant("next tuesday"), None);
    }
}
