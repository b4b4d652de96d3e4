use serde::{Deserialize, Serialize};

use crate::model::{common::CandidateId, db::candidate::Candidate};

/// A candidate as shown on the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescription {
    pub id: CandidateId,
    pub name: String,
    pub grade: String,
    pub platform: String,
    pub image_url: String,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.candidate.name,
            grade: candidate.candidate.grade,
            platform: candidate.candidate.platform,
            image_url: candidate.candidate.image_url,
        }
    }
}
