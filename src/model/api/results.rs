use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::CandidateDescription;

/// One candidate's share of the vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub candidate: CandidateDescription,
    pub vote_count: u32,
    /// Whole percentage of all votes cast.
    pub percentage: u32,
}

/// Headline figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStats {
    pub total_votes: u32,
    /// Whole percentage of eligible (non-admin) voters who have voted.
    pub turnout_rate: u32,
    pub leading_candidate: String,
    /// Countdown until the leaderboard opens, e.g. "2d 14h".
    pub time_left: String,
    pub leaderboard_visible: bool,
    pub leaderboard_visible_time: Option<DateTime<Utc>>,
}

/// Whether the public leaderboard is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStatus {
    pub visible: bool,
    pub visible_at: Option<DateTime<Utc>>,
}

/// A recent vote, without the voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub candidate_name: String,
    pub timestamp: DateTime<Utc>,
}
