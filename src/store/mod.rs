//! Storage collaborators of the voting core.
//!
//! Each concern is a separate trait so services only see what they need; a
//! [`Store`] bundles one implementation of each and is constructed once at
//! start-up, then shared.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mongodb::Database;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, Email, VoterId},
    db::{
        candidate::{default_roster, Candidate, NewCandidate},
        setting::{format_instant, LEADERBOARD_VISIBLE_TIME},
        vote::VoteRecord,
        voter::{NewVoter, Voter},
    },
};

pub mod memory;
pub mod mongo;

pub use self::memory::MemoryStore;
pub use self::mongo::MongoStore;

/// Voter accounts.
#[rocket::async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: VoterId) -> Result<Option<Voter>>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Voter>>;

    /// Insert a new account, failing with [`Error::DuplicateEmail`] if the address is taken.
    async fn create(&self, voter: NewVoter) -> Result<Voter>;

    /// Set the voter's `has_voted` flag. Setting an already-set flag succeeds.
    async fn mark_voted(&self, id: VoterId) -> Result<()>;

    /// Number of accounts entitled to vote, i.e. non-admins.
    async fn count_eligible(&self) -> Result<u32>;

    /// Check a plaintext password against the voter's stored hash.
    fn verify_credential(&self, voter: &Voter, plaintext: &str) -> bool {
        voter.verify_password(plaintext)
    }
}

/// The candidates standing for election, in registration order.
#[rocket::async_trait]
pub trait CandidateRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<Candidate>>;

    async fn find_by_id(&self, id: CandidateId) -> Result<Option<Candidate>>;

    async fn create(&self, candidate: NewCandidate) -> Result<Candidate>;
}

/// String-keyed configuration values.
#[rocket::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert the value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// The append-only record of cast votes.
#[rocket::async_trait]
pub trait VoteLedger: Send + Sync {
    /// Record a vote, failing with [`Error::AlreadyVoted`] if the voter already has one.
    async fn append(
        &self,
        candidate_id: CandidateId,
        voter_id: VoterId,
        timestamp: DateTime<Utc>,
    ) -> Result<VoteRecord>;

    /// Every vote, newest first.
    async fn all(&self) -> Result<Vec<VoteRecord>>;

    /// Number of votes per candidate. Candidates without votes are absent.
    async fn counts_by_candidate(&self) -> Result<HashMap<CandidateId, u32>>;
}

/// One implementation of every storage collaborator.
#[derive(Clone)]
pub struct Store {
    pub voters: Arc<dyn IdentityStore>,
    pub candidates: Arc<dyn CandidateRegistry>,
    pub settings: Arc<dyn SettingsStore>,
    pub ledger: Arc<dyn VoteLedger>,
}

impl Store {
    /// A fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::default()))
    }

    /// A store backed by the given MongoDB database.
    pub fn mongodb(db: &Database) -> Self {
        Self::from_backend(Arc::new(MongoStore::new(db)))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: IdentityStore + CandidateRegistry + SettingsStore + VoteLedger + 'static,
    {
        Self {
            voters: backend.clone(),
            candidates: backend.clone(),
            settings: backend.clone(),
            ledger: backend,
        }
    }

    /// Seed whatever a fresh deployment is missing: the candidate roster, the
    /// leaderboard reveal time and the configured admin account.
    ///
    /// This operation is idempotent.
    pub async fn ensure_defaults(&self, config: &Config, clock: &dyn Clock) -> Result<()> {
        if self.candidates.list().await?.is_empty() {
            info!("Candidate registry is empty, registering the default roster");
            for candidate in default_roster() {
                self.candidates.create(candidate).await?;
            }
        }

        if self.settings.get(LEADERBOARD_VISIBLE_TIME).await?.is_none() {
            let visible_at = clock.now() + Duration::hours(config.leaderboard_delay());
            info!("Leaderboard will open at {visible_at}");
            self.settings
                .set(LEADERBOARD_VISIBLE_TIME, &format_instant(visible_at))
                .await?;
        }

        let admin_email = Email::normalise(config.admin_email());
        if self.voters.find_by_email(&admin_email).await?.is_none() {
            let admin = NewVoter::new(
                admin_email,
                config.admin_password(),
                config.admin_name().to_string(),
                true,
                clock.now(),
            )?;
            match self.voters.create(admin).await {
                Ok(admin) => info!("Created admin account {}", admin.email),
                // Another instance seeded it first.
                Err(Error::DuplicateEmail(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::db::setting::parse_instant;

    #[rocket::async_test]
    async fn defaults_are_seeded_once() {
        let store = Store::memory();
        let clock = ManualClock::default();
        let config = Config::example();

        store.ensure_defaults(&config, &clock).await.unwrap();
        store.ensure_defaults(&config, &clock).await.unwrap();

        let candidates = store.candidates.list().await.unwrap();
        assert_eq!(candidates.len(), default_roster().len());
        assert_eq!(candidates[0].name, "Ashvith");

        let visible_at = store
            .settings
            .get(LEADERBOARD_VISIBLE_TIME)
            .await
            .unwrap()
            .and_then(|value| parse_instant(&value))
            .unwrap();
        assert_eq!(visible_at, clock.now() + Duration::hours(24));

        let admin = store
            .voters
            .find_by_email(&Email::normalise(config.admin_email()))
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin);
        assert!(store.voters.verify_credential(&admin, config.admin_password()));
        // Admins do not count towards turnout.
        assert_eq!(store.voters.count_eligible().await.unwrap(), 0);
    }

    #[rocket::async_test]
    async fn existing_leaderboard_time_is_kept() {
        let store = Store::memory();
        let clock = ManualClock::default();
        let chosen = format_instant(clock.now() - Duration::hours(1));
        store
            .settings
            .set(LEADERBOARD_VISIBLE_TIME, &chosen)
            .await
            .unwrap();

        store
            .ensure_defaults(&Config::example(), &clock)
            .await
            .unwrap();

        assert_eq!(
            store.settings.get(LEADERBOARD_VISIBLE_TIME).await.unwrap(),
            Some(chosen)
        );
    }
}
