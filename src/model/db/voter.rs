use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::common::{Email, VoterId};

/// Core voter account data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Unique, normalised login address.
    pub email: Email,
    /// Argon2 encoded hash; the plaintext password is never stored.
    pub password_hash: String,
    pub name: String,
    /// Admins manage the election but may not vote in it.
    pub is_admin: bool,
    /// Set exactly once, when the voter's ballot reaches the ledger.
    pub has_voted: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl VoterCore {
    /// Create a new account that has not voted, hashing the password.
    pub fn new(
        email: Email,
        password: &str,
        name: String,
        is_admin: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            email,
            password_hash: hash_password(password)?,
            name,
            is_admin,
            has_voted: false,
            created_at,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // A hash we cannot parse can never match.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter account from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Hash a password with a fresh random salt.
fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    let hash = argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())?;
    Ok(hash)
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    pub const EXAMPLE_PASSWORD: &str = "correct-horse-battery";

    impl VoterCore {
        pub fn example() -> Self {
            Self::new(
                Email::normalise("ada@students.riverside.edu"),
                EXAMPLE_PASSWORD,
                "Ada Lovelace".to_string(),
                false,
                Utc::now(),
            )
            .unwrap()
        }

        pub fn example2() -> Self {
            Self::new(
                Email::normalise("grace@students.riverside.edu"),
                EXAMPLE_PASSWORD,
                "Grace Hopper".to_string(),
                false,
                Utc::now(),
            )
            .unwrap()
        }

        pub fn example_admin() -> Self {
            Self::new(
                Email::normalise("returning.officer@students.riverside.edu"),
                EXAMPLE_PASSWORD,
                "Returning Officer".to_string(),
                true,
                Utc::now(),
            )
            .unwrap()
        }

        /// A student with a placeholder hash, for tests that never log in.
        pub fn unhashed(n: u32) -> Self {
            Self {
                email: Email::normalise(&format!("student{n}@students.riverside.edu")),
                password_hash: String::new(),
                name: format!("Student {n}"),
                is_admin: false,
                has_voted: false,
                created_at: Utc::now(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::examples::EXAMPLE_PASSWORD;
    use super::*;

    #[test]
    fn password_verification() {
        let voter = VoterCore::example();
        assert_ne!(voter.password_hash, EXAMPLE_PASSWORD);
        assert!(voter.verify_password(EXAMPLE_PASSWORD));
        assert!(!voter.verify_password("wrong password"));
        assert!(!voter.has_voted);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let voter = VoterCore::unhashed(1);
        assert!(!voter.verify_password(""));
    }
}
