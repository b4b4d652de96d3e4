use std::collections::HashMap;
use std::sync::Arc;

use rocket::tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, VoterId},
    db::{vote::VoteRecord, voter::Voter},
};
use crate::store::Store;

/// Accepts votes, at most one per voter.
///
/// Each submission holds its voter's lock from the `has_voted` check until the
/// flag is set, so concurrent submissions by the same voter are processed one
/// after another. The ledger's own uniqueness check rejects anything that
/// slips past, e.g. a second server process sharing the database.
pub struct VotingService {
    store: Store,
    clock: Arc<dyn Clock>,
    voter_locks: Mutex<HashMap<VoterId, Arc<Mutex<()>>>>,
}

impl VotingService {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            voter_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Cast `voter_id`'s vote for `candidate_id`.
    pub async fn submit_vote(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
    ) -> Result<VoteRecord> {
        // Unknown voters and voters who are done never take a lock.
        if self.find_voter(voter_id).await?.has_voted {
            return Err(Error::AlreadyVoted);
        }

        let lock = self.lock_for(voter_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.submit_locked(voter_id, candidate_id).await
        };

        // Once the flag is set every later submission stops at the check above.
        if matches!(result, Ok(_) | Err(Error::AlreadyVoted)) {
            self.voter_locks.lock().await.remove(&voter_id);
        }
        result
    }

    /// The check-then-act part of [`submit_vote`](Self::submit_vote), run under the voter's lock.
    async fn submit_locked(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
    ) -> Result<VoteRecord> {
        let voter = self.find_voter(voter_id).await?;
        if voter.has_voted {
            return Err(Error::AlreadyVoted);
        }

        let candidate = self
            .store
            .candidates
            .find_by_id(candidate_id)
            .await?
            .ok_or(Error::InvalidCandidate(candidate_id))?;

        if voter.is_admin {
            return Err(Error::Forbidden("Admins cannot vote".to_string()));
        }

        let record = match self
            .store
            .ledger
            .append(candidate.id, voter.id, self.clock.now())
            .await
        {
            Ok(record) => record,
            Err(Error::AlreadyVoted) => {
                // The ledger holds a vote the flag doesn't reflect; finish the earlier attempt.
                warn!("Voter {voter_id} has a recorded vote but was not marked as voted; repairing");
                self.mark_voted(voter_id).await?;
                return Err(Error::AlreadyVoted);
            }
            Err(e) => return Err(e),
        };

        self.mark_voted(voter_id).await?;
        info!(
            "Voter {voter_id} voted for candidate {} (vote {})",
            candidate.id, record.id
        );
        Ok(record)
    }

    /// Whether the voter has cast their vote.
    pub async fn has_voted(&self, voter_id: VoterId) -> Result<bool> {
        Ok(self.find_voter(voter_id).await?.has_voted)
    }

    async fn find_voter(&self, voter_id: VoterId) -> Result<Voter> {
        self.store
            .voters
            .find_by_id(voter_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Voter with ID '{voter_id}'")))
    }

    /// Set the flag for a voter whose vote is already in the ledger.
    async fn mark_voted(&self, voter_id: VoterId) -> Result<()> {
        self.store.voters.mark_voted(voter_id).await.map_err(|e| {
            error!("ALERT vote by voter {voter_id} is in the ledger but the voter could not be marked as voted: {e}");
            Error::Inconsistent(format!(
                "Vote recorded for voter {voter_id} but has_voted could not be set: {e}"
            ))
        })
    }

    /// The lock serialising submissions by one voter. Entries exist only for
    /// registered voters and are dropped once the voter has voted.
    async fn lock_for(&self, voter_id: VoterId) -> Arc<Mutex<()>> {
        let mut locks = self.voter_locks.lock().await;
        locks.entry(voter_id).or_default().clone()
    }
}
