use thiserror::Error;

use crate::db::schemas::request::RequestStatus;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SurrealDB error: {0}")]
    Db(#[from] surrealdb::Error),
    #[error("Item is missing an Id.")]
    NoId,
    #[error("Item not found.")]
    NotFound,
    #[error("Title must not be empty.")]
    EmptyTitle,
    #[error("Rating must be between 0 and 5, got {0}.")]
    RatingOutOfRange(u8),
    #[error("Practice rate must be between 0 and 100, got {0}.")]
    PracticeRateOutOfRange(u8),
    #[error("A request cannot move from {0} to {1}.")]
    IllegalTransition(RequestStatus, RequestStatus),
}
