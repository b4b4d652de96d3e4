use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

use super::collection::{CANDIDATES, VOTERS, VOTES};

/// A counter object used to implement auto-increment fields.
/// Each counter is named after the collection whose IDs it hands out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| Error::not_found(format!("Counter with ID '{id}'")))?;
        Ok(counter.next)
    }
}

/// Ensure a counter exists for every collection with auto-increment IDs.
/// IDs start at 1. Existing counters are left untouched.
///
/// This operation is idempotent.
pub async fn ensure_counters_exist(counters: &Coll<Counter>) -> Result<()> {
    let upsert = UpdateOptions::builder().upsert(true).build();
    for id in [VOTERS, CANDIDATES, VOTES] {
        counters
            .update_one(
                doc! { "_id": id },
                doc! { "$setOnInsert": { "next": 1_i64 } },
                upsert.clone(),
            )
            .await?;
    }
    Ok(())
}
