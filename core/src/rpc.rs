//! This module contains the service definitions.

#![allow(clippy::future_not_send)]

use serde::{Deserialize, Serialize};

use songboard_storage::db::schemas::{
    profile::Profile,
    request::{Request, RequestId, RequestStatus},
    setlist::SetlistLog,
    settings::Settings,
    song::{Song, SongChangeSet, SongDraft, SongId},
};

use crate::{
    errors::SerializableError,
    import::ImportReport,
    search::SongQuery,
    state::{CatalogBrief, CatalogFull},
};

/// The identity the federated auth boundary hands us for a connected client.
///
/// Opaque input: the daemon trusts it as-is and only compares `uid` against
/// the owner uid of the scope being touched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Caller {
    pub uid: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl Caller {
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.uid.is_empty()
    }

    #[must_use]
    pub fn owns(&self, owner: &str) -> bool {
        !self.is_anonymous() && self.uid == owner
    }
}

#[tarpc::service]
pub trait SongCatalog {
    // misc
    async fn ping() -> String;

    // Catalog reads (open to any viewer).
    /// Fold-derived counters for the owner's dashboard header.
    async fn catalog_brief(owner: String) -> Result<CatalogBrief, SerializableError>;
    /// The whole materialized scope in one read.
    async fn catalog_full(owner: String) -> Result<CatalogFull, SerializableError>;
    /// Every song in the owner's catalog.
    async fn songs_list(owner: String) -> Result<Box<[Song]>, SerializableError>;
    /// Get a song by its ID; `None` reads as unknown/deleted.
    async fn song_get(id: SongId) -> Option<Song>;
    /// Filter and sort the owner's catalog server-side.
    async fn songs_search(owner: String, query: SongQuery)
        -> Result<Box<[Song]>, SerializableError>;
    /// The owner's finalized setlist snapshots.
    async fn setlist_history(owner: String) -> Result<Box<[SetlistLog]>, SerializableError>;
    /// Every request in the owner's scope.
    async fn requests_list(owner: String) -> Result<Box<[Request]>, SerializableError>;
    /// The owner's public profile (defaults if never saved).
    async fn profile_get(owner: String) -> Result<Profile, SerializableError>;
    /// The owner's catalog settings (defaults if never saved).
    async fn settings_get(owner: String) -> Result<Settings, SerializableError>;

    // Owner-only catalog mutation.
    async fn song_create(
        caller: Caller,
        owner: String,
        draft: SongDraft,
    ) -> Result<Song, SerializableError>;
    async fn song_update(
        caller: Caller,
        owner: String,
        id: SongId,
        changes: SongChangeSet,
    ) -> Result<Song, SerializableError>;
    async fn song_delete(caller: Caller, owner: String, id: SongId)
        -> Result<(), SerializableError>;
    /// Flip a song's working-setlist flag.
    async fn setlist_toggle(
        caller: Caller,
        owner: String,
        id: SongId,
        on: bool,
    ) -> Result<Song, SerializableError>;
    /// Take every song off the working setlist.
    async fn setlist_clear(caller: Caller, owner: String) -> Result<(), SerializableError>;
    /// Snapshot the working setlist into history and bump each song's
    /// counters; `None` when the working setlist is empty.
    async fn setlist_finalize(
        caller: Caller,
        owner: String,
    ) -> Result<Option<SetlistLog>, SerializableError>;
    /// Save the current working setlist under a preset name.
    async fn setlist_preset_save(
        caller: Caller,
        owner: String,
        name: String,
    ) -> Result<Settings, SerializableError>;
    /// Overwrite the working setlist flags from a saved preset.
    async fn setlist_preset_load(
        caller: Caller,
        owner: String,
        name: String,
    ) -> Result<(), SerializableError>;
    async fn setlist_preset_delete(
        caller: Caller,
        owner: String,
        name: String,
    ) -> Result<Settings, SerializableError>;
    async fn profile_set(
        caller: Caller,
        owner: String,
        profile: Profile,
    ) -> Result<Profile, SerializableError>;
    async fn settings_set(
        caller: Caller,
        owner: String,
        settings: Settings,
    ) -> Result<Settings, SerializableError>;

    // Owner-only request lifecycle.
    /// Move a request through its lifecycle, with the song-side effects
    /// (reserved tag, counters) applied per transition.
    async fn request_set_status(
        caller: Caller,
        owner: String,
        id: RequestId,
        to: RequestStatus,
    ) -> Result<Request, SerializableError>;
    /// Block a requester and force-reject everything they have in flight.
    async fn requester_block(
        caller: Caller,
        owner: String,
        uid: String,
        label: String,
    ) -> Result<(), SerializableError>;

    // Owner-only import/export.
    /// Freeform multi-line import (see the import planner for the format).
    async fn import_bulk(
        caller: Caller,
        owner: String,
        text: String,
    ) -> Result<ImportReport, SerializableError>;
    /// CSV import with the same duplicate-merge semantics as the bulk path.
    async fn import_csv(
        caller: Caller,
        owner: String,
        text: String,
    ) -> Result<ImportReport, SerializableError>;
    /// The catalog as CSV, UTF-8 with a BOM so spreadsheet apps behave.
    async fn export_csv(caller: Caller, owner: String) -> Result<String, SerializableError>;
    /// The whole scope as a JSON backup.
    async fn export_json(caller: Caller, owner: String) -> Result<String, SerializableError>;

    // Viewer ops.
    /// Submit a song request. Gated by the owner's request toggle, the
    /// pending-request cap, and the NG keyword/user screens.
    async fn request_submit(
        caller: Caller,
        owner: String,
        song_id: SongId,
        requester_name: String,
        comment: String,
    ) -> Result<Request, SerializableError>;
    /// Like a song; returns the new count. Open to anonymous viewers.
    async fn song_like(owner: String, id: SongId) -> Result<u32, SerializableError>;
    /// Gacha: up to `count` uniformly drawn songs from the filtered catalog.
    async fn gacha(
        owner: String,
        query: SongQuery,
        count: usize,
    ) -> Result<Box<[Song]>, SerializableError>;

    // Daemon control.
    /// tells the daemon to shutdown.
    async fn daemon_shutdown() -> ();
}
