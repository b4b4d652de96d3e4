use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The instant from which the public leaderboard is visible, as read and
/// written by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSchedule {
    pub visible_at: DateTime<Utc>,
}
