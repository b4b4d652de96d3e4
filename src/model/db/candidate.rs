use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::common::CandidateId;

/// Core candidate data. Candidates never change once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    /// Year and course, e.g. "Senior, Engineering".
    pub grade: String,
    pub platform: String,
    pub image_url: String,
}

impl CandidateCore {
    pub fn new(
        name: impl Into<String>,
        grade: impl Into<String>,
        platform: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            grade: grade.into(),
            platform: platform.into(),
            image_url: image_url.into(),
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

/// The ballot registered on first boot when the registry is empty.
pub fn default_roster() -> Vec<NewCandidate> {
    const PHOTO: &str = "ixlib=rb-4.0.3&auto=format&fit=crop&w=300&h=300";
    vec![
        NewCandidate::new(
            "Ashvith",
            "Senior, Computer Science",
            "Focused on improving campus technology and student resources",
            format!("https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?{PHOTO}"),
        ),
        NewCandidate::new(
            "Vaishnavi",
            "Junior, Business Administration",
            "Dedicated to enhancing student life and campus activities",
            format!("https://images.unsplash.com/photo-1494790108755-2616b332e234?{PHOTO}"),
        ),
        NewCandidate::new(
            "Sandeep",
            "Senior, Environmental Science",
            "Committed to sustainability and environmental initiatives",
            format!("https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?{PHOTO}"),
        ),
        NewCandidate::new(
            "Sujasree",
            "Junior, Psychology",
            "Advocating for mental health resources and student support",
            format!("https://images.unsplash.com/photo-1438761681033-6461ffad8d80?{PHOTO}"),
        ),
        NewCandidate::new(
            "Shashank",
            "Senior, Engineering",
            "Promoting diversity, inclusion, and academic excellence",
            format!("https://images.unsplash.com/photo-1534528741775-53994a69daeb?{PHOTO}"),
        ),
    ]
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateCore {
        /// A bare candidate with just a name, for tally tests.
        pub fn named(name: &str) -> Self {
            Self::new(name, "Sophomore, Mathematics", "Vote for me", "")
        }
    }
}
