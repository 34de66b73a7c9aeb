#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Id, Thing};

use super::song::SongBrief;

pub type SetlistLogId = Thing;

pub const TABLE_NAME: &str = "setlist_log";

/// An immutable snapshot of a finished stream's setlist.
///
/// Appended when the owner finalizes the working setlist; never edited
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SetlistLog {
    pub id: SetlistLogId,
    /// Uid of the streamer this log belongs to.
    pub owner: String,
    /// When the setlist was finalized, unix millis.
    pub date: i64,
    /// The songs as they were at finalization time, in setlist order.
    #[serde(default)]
    pub songs: Vec<SongBrief>,
}

impl SetlistLog {
    #[must_use]
    pub fn generate_id() -> SetlistLogId {
        Thing::from((TABLE_NAME, Id::ulid()))
    }
}
