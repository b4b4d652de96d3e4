//! A process-local store. Nothing survives a restart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, Email, VoteId, VoterId},
    db::{
        candidate::{Candidate, NewCandidate},
        vote::{newest_first, NewVote, VoteRecord},
        voter::{NewVoter, Voter},
    },
};

use super::{CandidateRegistry, IdentityStore, SettingsStore, VoteLedger};

/// Records are only ever appended, so IDs are simply 1-based positions.
#[derive(Default)]
pub struct MemoryStore {
    voters: RwLock<Vec<Voter>>,
    candidates: RwLock<Vec<Candidate>>,
    votes: RwLock<Vec<VoteRecord>>,
    settings: RwLock<HashMap<String, String>>,
}

fn next_id(len: usize) -> u32 {
    // More than `u32::MAX` records cannot fit in memory alongside each other anyway.
    u32::try_from(len + 1).unwrap_or(u32::MAX)
}

#[rocket::async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_id(&self, id: VoterId) -> Result<Option<Voter>> {
        let voters = self.voters.read().await;
        Ok(voters.iter().find(|voter| voter.id == id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Voter>> {
        let voters = self.voters.read().await;
        Ok(voters.iter().find(|voter| &voter.email == email).cloned())
    }

    async fn create(&self, voter: NewVoter) -> Result<Voter> {
        let mut voters = self.voters.write().await;
        if voters.iter().any(|existing| existing.email == voter.email) {
            return Err(Error::DuplicateEmail(voter.email.to_string()));
        }
        let voter = Voter {
            id: next_id(voters.len()),
            voter,
        };
        voters.push(voter.clone());
        Ok(voter)
    }

    async fn mark_voted(&self, id: VoterId) -> Result<()> {
        let mut voters = self.voters.write().await;
        let voter = voters
            .iter_mut()
            .find(|voter| voter.id == id)
            .ok_or_else(|| Error::not_found(format!("Voter with ID '{id}'")))?;
        voter.has_voted = true;
        Ok(())
    }

    async fn count_eligible(&self) -> Result<u32> {
        let voters = self.voters.read().await;
        let eligible = voters.iter().filter(|voter| !voter.is_admin).count();
        Ok(u32::try_from(eligible).unwrap_or(u32::MAX))
    }
}

#[rocket::async_trait]
impl CandidateRegistry for MemoryStore {
    async fn list(&self) -> Result<Vec<Candidate>> {
        Ok(self.candidates.read().await.clone())
    }

    async fn find_by_id(&self, id: CandidateId) -> Result<Option<Candidate>> {
        let candidates = self.candidates.read().await;
        Ok(candidates.iter().find(|candidate| candidate.id == id).cloned())
    }

    async fn create(&self, candidate: NewCandidate) -> Result<Candidate> {
        let mut candidates = self.candidates.write().await;
        let candidate = Candidate {
            id: next_id(candidates.len()),
            candidate,
        };
        candidates.push(candidate.clone());
        Ok(candidate)
    }
}

#[rocket::async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.settings.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.settings
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[rocket::async_trait]
impl VoteLedger for MemoryStore {
    async fn append(
        &self,
        candidate_id: CandidateId,
        voter_id: VoterId,
        timestamp: DateTime<Utc>,
    ) -> Result<VoteRecord> {
        // The existence check and the push happen under one write lock.
        let mut votes = self.votes.write().await;
        if votes.iter().any(|vote| vote.voter_id == voter_id) {
            return Err(Error::AlreadyVoted);
        }
        let id: VoteId = next_id(votes.len());
        let record = VoteRecord {
            id,
            vote: NewVote {
                candidate_id,
                voter_id,
                timestamp,
            },
        };
        votes.push(record.clone());
        Ok(record)
    }

    async fn all(&self) -> Result<Vec<VoteRecord>> {
        let mut votes = self.votes.read().await.clone();
        newest_first(&mut votes);
        Ok(votes)
    }

    async fn counts_by_candidate(&self) -> Result<HashMap<CandidateId, u32>> {
        let votes = self.votes.read().await;
        let mut counts = HashMap::new();
        for vote in votes.iter() {
            *counts.entry(vote.candidate_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
