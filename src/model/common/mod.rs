//! Types shared between the DB and API representations.

mod email;
pub use email::Email;

/// Unique ID of a voter account (students and admins alike).
pub type VoterId = u32;

/// Unique ID of a candidate, assigned in registration order.
pub type CandidateId = u32;

/// Unique ID of a ledger entry.
pub type VoteId = u32;
