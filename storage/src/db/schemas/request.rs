#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use surrealdb::sql::{Id, Thing};

use super::song::SongId;

pub type RequestId = Thing;

pub const TABLE_NAME: &str = "request";

/// Where a [`Request`] sits in its lifecycle.
///
/// `Completed` and `Rejected` are terminal; nothing moves a request out of
/// them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Hold,
    Completed,
    Rejected,
}

impl RequestStatus {
    /// Whether the owner may move a request from `self` to `to` in one step.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Accepted | Self::Rejected | Self::Hold)
                | (Self::Hold, Self::Pending | Self::Accepted | Self::Rejected)
                | (Self::Accepted, Self::Completed | Self::Pending | Self::Rejected)
        )
    }

    /// Terminal states admit no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

/// A single audience song request.
///
/// Created write-once by the viewer who submitted it; only the catalog owner
/// mutates the status afterwards. `song_title` is denormalized at submission
/// time so the request stays readable even if the song is later deleted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Request {
    pub id: RequestId,
    /// Uid of the streamer whose catalog the request targets.
    pub owner: String,
    pub song_id: SongId,
    pub song_title: String,
    pub requester_name: String,
    pub requester_uid: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub completed_at: Option<i64>,
}

impl Request {
    #[must_use]
    pub fn generate_id() -> RequestId {
        Thing::from((TABLE_NAME, Id::ulid()))
    }
}
