use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::db::voter::Voter;

/// A kind of user that an [`AuthToken`](super::AuthToken) can stand for.
pub trait User {
    /// Whether a token with the given rights represents this kind of user.
    fn permits(rights: Rights) -> bool;
}

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Voter = 0,
    Admin = 1,
}

impl Rights {
    /// The rights an account currently holds.
    pub fn of(voter: &Voter) -> Self {
        if voter.is_admin {
            Self::Admin
        } else {
            Self::Voter
        }
    }
}

/// An admin account.
pub struct Admin;

impl User for Admin {
    fn permits(rights: Rights) -> bool {
        rights == Rights::Admin
    }
}

/// Any logged-in account.
pub struct Account;

impl User for Account {
    fn permits(_rights: Rights) -> bool {
        true
    }
}
