use serde::{Deserialize, Serialize};
use songboard_storage::db::schemas::{
    profile::Profile,
    request::{Request, RequestStatus},
    setlist::SetlistLog,
    settings::Settings,
    song::{Song, SongId},
};
use surrealdb::{Connection, Surreal};

use songboard_storage::errors::Error;

/// A full materialized view of one owner's catalog scope.
///
/// This is what the observable catalog publishes and what consumers hold;
/// everything derived (stats, queues, the working setlist) is recomputed
/// from it rather than stored.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogFull {
    pub owner: String,
    pub songs: Vec<Song>,
    pub requests: Vec<Request>,
    pub setlist_history: Vec<SetlistLog>,
    pub profile: Profile,
    pub settings: Settings,
}

/// The fold-derived counters shown on the dashboard header.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogBrief {
    pub songs: usize,
    pub likes: u64,
    pub pending_requests: usize,
}

impl CatalogFull {
    /// Read the whole scope from the store in one go.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the reads fail.
    pub async fn load<C: Connection>(db: &Surreal<C>, owner: &str) -> Result<Self, Error> {
        Ok(Self {
            owner: owner.to_string(),
            songs: Song::read_all(db, owner).await?,
            requests: Request::read_all(db, owner).await?,
            setlist_history: SetlistLog::read_all(db, owner).await?,
            profile: Profile::read(db, owner).await?,
            settings: Settings::read(db, owner).await?,
        })
    }

    /// Recompute the dashboard counters from the current collections.
    #[must_use]
    pub fn brief(&self) -> CatalogBrief {
        CatalogBrief {
            songs: self.songs.len(),
            likes: self.songs.iter().map(|song| u64::from(song.likes)).sum(),
            pending_requests: self
                .requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count(),
        }
    }

    /// Look up a song; a request pointing at a deleted song comes back
    /// `None` and readers treat it as unknown.
    #[must_use]
    pub fn song(&self, id: &SongId) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == *id)
    }

    /// The working setlist, ordered by `setlist_order` then title.
    #[must_use]
    pub fn working_setlist(&self) -> Vec<&Song> {
        let mut setlist: Vec<&Song> = self.songs.iter().filter(|s| s.is_setlist).collect();
        setlist.sort_by(|a, b| {
            a.setlist_order
                .cmp(&b.setlist_order)
                .then_with(|| a.title.cmp(&b.title))
        });
        setlist
    }

    /// The public request queue: pending requests, oldest first.
    #[must_use]
    pub fn pending_queue(&self) -> Vec<&Request> {
        let mut queue: Vec<&Request> = self
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect();
        queue.sort_by_key(|r| r.created_at);
        queue
    }

    /// Completed requests, newest completion first, for the history tab.
    #[must_use]
    pub fn completed_history(&self) -> Vec<&Request> {
        let mut history: Vec<&Request> = self
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Completed)
            .collect();
        history.sort_by_key(|r| std::cmp::Reverse(r.completed_at.unwrap_or_default()));
        history
    }
}
