use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, VoteId, VoterId},
    db::vote::VoteRecord,
};

/// The candidate a voter wishes to vote for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub candidate_id: CandidateId,
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDescription {
    pub id: VoteId,
    pub candidate_id: CandidateId,
    pub voter_id: VoterId,
    pub timestamp: DateTime<Utc>,
}

impl From<VoteRecord> for VoteDescription {
    fn from(record: VoteRecord) -> Self {
        Self {
            id: record.id,
            candidate_id: record.vote.candidate_id,
            voter_id: record.vote.voter_id,
            timestamp: record.vote.timestamp,
        }
    }
}

/// Confirmation handed back after a successful vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub message: String,
    pub vote: VoteDescription,
}

impl From<VoteRecord> for VoteReceipt {
    fn from(record: VoteRecord) -> Self {
        Self {
            message: "Vote submitted successfully".to_string(),
            vote: record.into(),
        }
    }
}

/// Whether the caller has voted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
}
