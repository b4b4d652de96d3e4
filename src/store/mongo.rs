//! A store persisted in MongoDB. IDs come from per-collection counters and the
//! one-vote-per-voter rule is backed by a unique index on `votes.voter_id`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, from_document},
    error::Error as DbError,
    options::{FindOptions, ReplaceOptions},
    Database,
};
use rocket::futures::TryStreamExt;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, Email, VoterId},
    db::{
        candidate::{Candidate, NewCandidate},
        setting::Setting,
        vote::{newest_first, NewVote, VoteRecord},
        voter::{NewVoter, Voter},
    },
    mongodb::{
        ensure_counters_exist, ensure_indexes_exist, id_filter, is_duplicate_key_error, Coll,
        Counter, MongoCollection,
    },
};

use super::{CandidateRegistry, IdentityStore, SettingsStore, VoteLedger};

pub struct MongoStore {
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    votes: Coll<VoteRecord>,
    settings: Coll<Setting>,
    counters: Coll<Counter>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            voters: Coll::from_db(db),
            candidates: Coll::from_db(db),
            votes: Coll::from_db(db),
            settings: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }

    /// Create the indexes and ID counters the store relies on.
    ///
    /// This operation is idempotent.
    pub async fn prepare(db: &Database) -> Result<()> {
        ensure_indexes_exist(db).await?;
        ensure_counters_exist(&Coll::from_db(db)).await
    }

    /// Hand out the next ID for records of type `T`.
    async fn next_id<T: MongoCollection>(&self) -> Result<u32> {
        Counter::next(&self.counters, T::NAME).await
    }
}

/// One row of the per-candidate `$group` aggregation.
#[derive(Deserialize)]
struct CandidateCount {
    #[serde(rename = "_id")]
    candidate_id: CandidateId,
    count: u32,
}

#[rocket::async_trait]
impl IdentityStore for MongoStore {
    async fn find_by_id(&self, id: VoterId) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(id_filter(id), None).await?)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Voter>> {
        let with_email = doc! {
            "email": email.as_str(),
        };
        Ok(self.voters.find_one(with_email, None).await?)
    }

    async fn create(&self, voter: NewVoter) -> Result<Voter> {
        let voter = Voter {
            id: self.next_id::<Voter>().await?,
            voter,
        };
        match self.voters.insert_one(&voter, None).await {
            Ok(_) => Ok(voter),
            Err(e) if is_duplicate_key_error(&e) => {
                Err(Error::DuplicateEmail(voter.email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_voted(&self, id: VoterId) -> Result<()> {
        let update = doc! {
            "$set": { "has_voted": true }
        };
        let result = self.voters.update_one(id_filter(id), update, None).await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Voter with ID '{id}'")));
        }
        Ok(())
    }

    async fn count_eligible(&self) -> Result<u32> {
        let count = self
            .voters
            .count_documents(doc! { "is_admin": false }, None)
            .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[rocket::async_trait]
impl CandidateRegistry for MongoStore {
    async fn list(&self) -> Result<Vec<Candidate>> {
        // IDs are handed out in registration order.
        let by_id = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let candidates = self
            .candidates
            .find(None, by_id)
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    async fn find_by_id(&self, id: CandidateId) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(id_filter(id), None).await?)
    }

    async fn create(&self, candidate: NewCandidate) -> Result<Candidate> {
        let candidate = Candidate {
            id: self.next_id::<Candidate>().await?,
            candidate,
        };
        self.candidates.insert_one(&candidate, None).await?;
        Ok(candidate)
    }
}

#[rocket::async_trait]
impl SettingsStore for MongoStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let setting = self.settings.find_one(doc! { "_id": key }, None).await?;
        Ok(setting.map(|setting| setting.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let setting = Setting {
            key: key.to_string(),
            value: value.to_string(),
        };
        let upsert = ReplaceOptions::builder().upsert(true).build();
        self.settings
            .replace_one(doc! { "_id": key }, setting, upsert)
            .await?;
        Ok(())
    }
}

#[rocket::async_trait]
impl VoteLedger for MongoStore {
    async fn append(
        &self,
        candidate_id: CandidateId,
        voter_id: VoterId,
        timestamp: DateTime<Utc>,
    ) -> Result<VoteRecord> {
        let record = VoteRecord {
            id: self.next_id::<VoteRecord>().await?,
            vote: NewVote {
                candidate_id,
                voter_id,
                timestamp,
            },
        };
        match self.votes.insert_one(&record, None).await {
            Ok(_) => Ok(record),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::AlreadyVoted),
            Err(e) => Err(e.into()),
        }
    }

    async fn all(&self) -> Result<Vec<VoteRecord>> {
        let mut votes: Vec<VoteRecord> = self.votes.find(None, None).await?.try_collect().await?;
        newest_first(&mut votes);
        Ok(votes)
    }

    async fn counts_by_candidate(&self) -> Result<HashMap<CandidateId, u32>> {
        let pipeline = [doc! {
            "$group": {
                "_id": "$candidate_id",
                "count": { "$sum": 1 },
            }
        }];
        let mut counts = HashMap::new();
        let mut cursor = self.votes.aggregate(pipeline, None).await?;
        while let Some(row) = cursor.try_next().await? {
            let row: CandidateCount = from_document(row).map_err(DbError::from)?;
            counts.insert(row.candidate_id, row.count);
        }
        Ok(counts)
    }
}
