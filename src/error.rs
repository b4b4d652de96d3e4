use argon2::Error as Argon2Error;
use chrono::{DateTime, Utc};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request, Response,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::common::CandidateId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("You have already voted")]
    AlreadyVoted,
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(CandidateId),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error("Email must belong to the {0} domain")]
    InvalidEmailDomain(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Results are not yet available")]
    ResultsNotYetAvailable { visible_at: Option<DateTime<Utc>> },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// A vote reached the ledger but the voter could not be marked as having voted.
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

/// Stable, machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    AlreadyVoted,
    InvalidCandidate,
    Forbidden,
    DuplicateEmail,
    InvalidEmailDomain,
    InvalidCredentials,
    ResultsNotYetAvailable,
    NotFound,
    BadRequest,
    Inconsistent,
    Database,
    PasswordHash,
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyVoted => ErrorKind::AlreadyVoted,
            Self::InvalidCandidate(_) => ErrorKind::InvalidCandidate,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::DuplicateEmail(_) => ErrorKind::DuplicateEmail,
            Self::InvalidEmailDomain(_) => ErrorKind::InvalidEmailDomain,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::ResultsNotYetAvailable { .. } => ErrorKind::ResultsNotYetAvailable,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Inconsistent(_) => ErrorKind::Inconsistent,
            Self::Db(_) => ErrorKind::Database,
            Self::Argon2(_) => ErrorKind::PasswordHash,
        }
    }

    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::AlreadyVoted | ErrorKind::DuplicateEmail => Status::Conflict,
            ErrorKind::InvalidCandidate
            | ErrorKind::InvalidEmailDomain
            | ErrorKind::BadRequest => Status::BadRequest,
            ErrorKind::InvalidCredentials => Status::Unauthorized,
            ErrorKind::Forbidden | ErrorKind::ResultsNotYetAvailable => Status::Forbidden,
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::Inconsistent | ErrorKind::Database | ErrorKind::PasswordHash => {
                Status::InternalServerError
            }
        }
    }
}

/// JSON body sent alongside every error status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    visible_at: Option<DateTime<Utc>>,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        match self.kind() {
            ErrorKind::Inconsistent => error!("ALERT vote integrity violated: {self}"),
            _ if status.code >= 500 => error!("{self}"),
            _ => debug!("Rejected request: {self}"),
        }

        let kind = self.kind();
        let message = self.to_string();
        let visible_at = match self {
            Self::ResultsNotYetAvailable { visible_at } => visible_at,
            _ => None,
        };
        let body = ErrorBody {
            kind,
            message,
            visible_at,
        };
        Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
