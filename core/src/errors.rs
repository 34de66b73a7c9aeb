use serde::{Deserialize, Serialize};
use songboard_storage::errors::Error;
use thiserror::Error;

/// Errors that can occur with finding the config or data directories.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Unable to find the config directory for songboard.")]
    Config,
    #[error("Unable to find the data directory for songboard.")]
    Data,
}

/// Errors that cross the RPC boundary.
///
/// Every failure is terminal at the failed call: the daemon reports it, the
/// client shows the message, and re-invoking the action is up to the user.
#[derive(Error, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum SerializableError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Item not found.")]
    NotFound,
    #[error("Only the catalog owner may do that.")]
    NotOwner,
    #[error("Sign in to send a request.")]
    SignInRequired,
    #[error("Requests are closed right now.")]
    RequestsDisabled,
    #[error("The gacha is switched off right now.")]
    GachaDisabled,
    #[error("Request limit reached: {0} requests are already waiting.")]
    RequestLimitReached(u64),
    #[error("That message cannot be sent.")]
    NgKeyword,
    #[error("You cannot send requests to this streamer.")]
    Blocked,
    #[error("A request cannot move from {0} to {1}.")]
    IllegalTransition(String, String),
}

impl From<Error> for SerializableError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound => Self::NotFound,
            Error::IllegalTransition(from, to) => {
                Self::IllegalTransition(from.to_string(), to.to_string())
            }
            Error::EmptyTitle | Error::RatingOutOfRange(_) | Error::PracticeRateOutOfRange(_) => {
                Self::Validation(e.to_string())
            }
            Error::Db(_) | Error::NoId => Self::Database(e.to_string()),
        }
    }
}

/// Errors that can occur while exporting or importing catalog backups.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] Error),
    #[error("The backup is not valid UTF-8.")]
    NotUtf8,
}

impl From<BackupError> for SerializableError {
    fn from(e: BackupError) -> Self {
        match e {
            BackupError::Database(inner) => inner.into(),
            BackupError::IO(_) | BackupError::Csv(_) | BackupError::Json(_)
            | BackupError::NotUtf8 => Self::Validation(e.to_string()),
        }
    }
}
