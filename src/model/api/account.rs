use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{Email, VoterId},
    db::voter::Voter,
};

/// An account as reported back to its owner. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDescription {
    pub id: VoterId,
    pub email: Email,
    pub name: String,
    pub is_admin: bool,
    pub has_voted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Voter> for AccountDescription {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            email: voter.voter.email,
            name: voter.voter.name,
            is_admin: voter.voter.is_admin,
            has_voted: voter.voter.has_voted,
            created_at: voter.voter.created_at,
        }
    }
}
