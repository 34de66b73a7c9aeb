//----------------------------------------------------------------------------------------- std lib
use std::sync::Arc;
//--------------------------------------------------------------------------------- other libraries
use ::tarpc::context::Context;
use log::{info, warn};
use surrealdb::{Surreal, engine::local::Db};
use tracing::instrument;
//----------------------------------------------------------------------------- SONGBOARD libraries
use songboard_core::{
    errors::SerializableError,
    rpc::{Caller, SongCatalog},
    search::{self, SongQuery},
    state::{CatalogBrief, CatalogFull},
};
use songboard_storage::db::schemas::{
    profile::Profile,
    request::{Request, RequestId, RequestStatus},
    setlist::SetlistLog,
    settings::Settings,
    song::{Song, SongChangeSet, SongDraft, SongId},
};

use crate::{
    services,
    termination::{Interrupted, Terminator},
};

/// How many songs one gacha pull may hand out.
const MAX_GACHA_DRAW: usize = 10;

#[derive(Clone, Debug)]
pub struct CatalogServer {
    db: Arc<Surreal<Db>>,
    terminator: Terminator,
}

impl CatalogServer {
    #[must_use]
    pub fn new(db: Arc<Surreal<Db>>, terminator: Terminator) -> Self {
        Self { db, terminator }
    }
}

/// Owner-only calls go through this gate; everything the caller doesn't own
/// is refused before any read or write happens.
fn ensure_owner(caller: &Caller, owner: &str) -> Result<(), SerializableError> {
    if caller.owns(owner) {
        Ok(())
    } else {
        warn!("caller {} is not the owner of scope {owner}", caller.uid);
        Err(SerializableError::NotOwner)
    }
}

impl SongCatalog for CatalogServer {
    #[instrument]
    async fn ping(self, _: Context) -> String {
        "pong".to_string()
    }

    #[instrument]
    async fn catalog_brief(
        self,
        _: Context,
        owner: String,
    ) -> Result<CatalogBrief, SerializableError> {
        Ok(CatalogFull::load(&self.db, &owner).await?.brief())
    }

    #[instrument]
    async fn catalog_full(
        self,
        _: Context,
        owner: String,
    ) -> Result<CatalogFull, SerializableError> {
        Ok(CatalogFull::load(&self.db, &owner).await?)
    }

    #[instrument]
    async fn songs_list(self, _: Context, owner: String) -> Result<Box<[Song]>, SerializableError> {
        Ok(Song::read_all(&self.db, &owner).await?.into())
    }

    #[instrument]
    async fn song_get(self, _: Context, id: SongId) -> Option<Song> {
        Song::read(&self.db, id).await.ok().flatten()
    }

    #[instrument]
    async fn songs_search(
        self,
        _: Context,
        owner: String,
        query: SongQuery,
    ) -> Result<Box<[Song]>, SerializableError> {
        let songs = Song::read_all(&self.db, &owner).await?;
        Ok(search::search(&songs, &query).into())
    }

    #[instrument]
    async fn setlist_history(
        self,
        _: Context,
        owner: String,
    ) -> Result<Box<[SetlistLog]>, SerializableError> {
        Ok(SetlistLog::read_all(&self.db, &owner).await?.into())
    }

    #[instrument]
    async fn requests_list(
        self,
        _: Context,
        owner: String,
    ) -> Result<Box<[Request]>, SerializableError> {
        Ok(Request::read_all(&self.db, &owner).await?.into())
    }

    #[instrument]
    async fn profile_get(self, _: Context, owner: String) -> Result<Profile, SerializableError> {
        Ok(Profile::read(&self.db, &owner).await?)
    }

    #[instrument]
    async fn settings_get(self, _: Context, owner: String) -> Result<Settings, SerializableError> {
        Ok(Settings::read(&self.db, &owner).await?)
    }

    #[instrument]
    async fn song_create(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        draft: SongDraft,
    ) -> Result<Song, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::create_song(&self.db, &owner, draft).await
    }

    #[instrument]
    async fn song_update(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        id: SongId,
        changes: SongChangeSet,
    ) -> Result<Song, SerializableError> {
        ensure_owner(&caller, &owner)?;
        Song::read(&self.db, id.clone())
            .await?
            .filter(|song| song.owner == owner)
            .ok_or(SerializableError::NotFound)?;
        Song::update(&self.db, id, changes)
            .await?
            .ok_or(SerializableError::NotFound)
    }

    #[instrument]
    async fn song_delete(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        id: SongId,
    ) -> Result<(), SerializableError> {
        ensure_owner(&caller, &owner)?;
        Song::read(&self.db, id.clone())
            .await?
            .filter(|song| song.owner == owner)
            .ok_or(SerializableError::NotFound)?;
        Song::delete(&self.db, id).await?;
        Ok(())
    }

    #[instrument]
    async fn setlist_toggle(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        id: SongId,
        on: bool,
    ) -> Result<Song, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::setlist_toggle(&self.db, &owner, id, on).await
    }

    #[instrument]
    async fn setlist_clear(
        self,
        _: Context,
        caller: Caller,
        owner: String,
    ) -> Result<(), SerializableError> {
        ensure_owner(&caller, &owner)?;
        Song::clear_setlist(&self.db, &owner).await?;
        Ok(())
    }

    #[instrument]
    async fn setlist_finalize(
        self,
        _: Context,
        caller: Caller,
        owner: String,
    ) -> Result<Option<SetlistLog>, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::setlist_finalize(&self.db, &owner).await
    }

    #[instrument]
    async fn setlist_preset_save(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        name: String,
    ) -> Result<Settings, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::preset_save(&self.db, &owner, &name).await
    }

    #[instrument]
    async fn setlist_preset_load(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        name: String,
    ) -> Result<(), SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::preset_load(&self.db, &owner, &name).await
    }

    #[instrument]
    async fn setlist_preset_delete(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        name: String,
    ) -> Result<Settings, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::preset_delete(&self.db, &owner, &name).await
    }

    #[instrument]
    async fn profile_set(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        profile: Profile,
    ) -> Result<Profile, SerializableError> {
        ensure_owner(&caller, &owner)?;
        Ok(Profile::write(&self.db, &owner, profile).await?)
    }

    #[instrument]
    async fn settings_set(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        settings: Settings,
    ) -> Result<Settings, SerializableError> {
        ensure_owner(&caller, &owner)?;
        Ok(Settings::write(&self.db, &owner, settings).await?)
    }

    #[instrument]
    async fn request_set_status(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        id: RequestId,
        to: RequestStatus,
    ) -> Result<Request, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::requests::set_status(&self.db, &owner, id, to).await
    }

    #[instrument]
    async fn requester_block(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        uid: String,
        label: String,
    ) -> Result<(), SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::requests::block(&self.db, &owner, &uid, &label).await
    }

    #[instrument(skip(text))]
    async fn import_bulk(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        text: String,
    ) -> Result<songboard_core::import::ImportReport, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::catalog::import_bulk(&self.db, &owner, &text).await
    }

    #[instrument(skip(text))]
    async fn import_csv(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        text: String,
    ) -> Result<songboard_core::import::ImportReport, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::backup::import_csv(&self.db, &owner, &text).await
    }

    #[instrument]
    async fn export_csv(
        self,
        _: Context,
        caller: Caller,
        owner: String,
    ) -> Result<String, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::backup::export_csv(&self.db, &owner)
            .await
            .map_err(SerializableError::from)
    }

    #[instrument]
    async fn export_json(
        self,
        _: Context,
        caller: Caller,
        owner: String,
    ) -> Result<String, SerializableError> {
        ensure_owner(&caller, &owner)?;
        services::backup::export_json(&self.db, &owner)
            .await
            .map_err(SerializableError::from)
    }

    #[instrument]
    async fn request_submit(
        self,
        _: Context,
        caller: Caller,
        owner: String,
        song_id: SongId,
        requester_name: String,
        comment: String,
    ) -> Result<Request, SerializableError> {
        services::requests::submit(
            &self.db,
            &owner,
            &caller,
            song_id,
            &requester_name,
            &comment,
        )
        .await
    }

    #[instrument]
    async fn song_like(
        self,
        _: Context,
        owner: String,
        id: SongId,
    ) -> Result<u32, SerializableError> {
        Song::read(&self.db, id.clone())
            .await?
            .filter(|song| song.owner == owner)
            .ok_or(SerializableError::NotFound)?;
        let song = Song::add_like(&self.db, id)
            .await?
            .ok_or(SerializableError::NotFound)?;
        Ok(song.likes)
    }

    #[instrument]
    async fn gacha(
        self,
        _: Context,
        owner: String,
        query: SongQuery,
        count: usize,
    ) -> Result<Box<[Song]>, SerializableError> {
        let profile = Profile::read(&self.db, &owner).await?;
        if !profile.is_gacha_enabled {
            return Err(SerializableError::GachaDisabled);
        }

        let songs = Song::read_all(&self.db, &owner).await?;
        let pool = search::search(&songs, &query);
        let drawn: Vec<Song> = {
            let mut rng = rand::thread_rng();
            search::draw_many(&pool, count.clamp(1, MAX_GACHA_DRAW), &mut rng)
                .into_iter()
                .cloned()
                .collect()
        };
        Ok(drawn.into())
    }

    #[instrument]
    async fn daemon_shutdown(self, _: Context) {
        info!("Shutting down daemon per RPC request");
        if let Err(e) = self.terminator.terminate(Interrupted::UserInt) {
            warn!("failed to send shutdown signal: {e}");
        }
    }
}
