//! The observable catalog: one source of truth per owner scope.
//!
//! [`ObservableCatalog::spawn`] materializes a [`CatalogFull`] snapshot and
//! keeps it fresh from the store's live queries, publishing every revision
//! through a watch channel. Consumers call [`ObservableCatalog::subscribe`]
//! on mount and simply drop the receiver on teardown; dropping the
//! observable itself aborts the feeder task and ends the live queries.
//!
//! Consumers diff or replace against each snapshot. There is no
//! read-after-write promise: a mutation becomes visible when its change
//! notification has been folded in.

use log::warn;
use surrealdb::{Connection, Surreal};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use futures::{StreamExt, pin_mut};
use songboard_storage::db::live::{
    Change, subscribe_profile, subscribe_requests, subscribe_setlists, subscribe_settings,
    subscribe_songs,
};
use songboard_storage::db::schemas::{
    profile::Profile, request::Request, setlist::SetlistLog, settings::Settings, song::Song,
};
use songboard_storage::errors::Error;

use crate::state::CatalogFull;

/// A live-updated materialized view of one owner's catalog.
#[derive(Debug)]
pub struct ObservableCatalog {
    rx: watch::Receiver<CatalogFull>,
    feeder: tokio::task::JoinHandle<()>,
}

impl ObservableCatalog {
    /// Load the initial snapshot and start the feeder task.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read fails. Live-query failures after
    /// that are logged and end the feed; the last published snapshot stays
    /// readable.
    pub async fn spawn<C: Connection>(db: &Surreal<C>, owner: &str) -> Result<Self, Error> {
        let initial = CatalogFull::load(db, owner).await?;
        let (tx, rx) = watch::channel(initial);

        let db = db.clone();
        let owner = owner.to_string();
        let feeder = tokio::spawn(async move {
            if let Err(e) = feed(&db, &owner, &tx).await {
                warn!("catalog feed for {owner} stopped: {e}");
            }
        });

        Ok(Self { rx, feeder })
    }

    /// A receiver of snapshot revisions. Cheap; hand one to every consumer.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogFull> {
        self.rx.clone()
    }

    /// The snapshot revisions as a plain `Stream`, starting from the current
    /// one, for consumers that fold rather than poll.
    #[must_use]
    pub fn stream(&self) -> WatchStream<CatalogFull> {
        WatchStream::new(self.rx.clone())
    }

    /// The current snapshot, cloned out of the channel.
    #[must_use]
    pub fn snapshot(&self) -> CatalogFull {
        self.rx.borrow().clone()
    }
}

impl Drop for ObservableCatalog {
    fn drop(&mut self) {
        self.feeder.abort();
    }
}

async fn feed<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    tx: &watch::Sender<CatalogFull>,
) -> Result<(), Error> {
    let songs = subscribe_songs(db, owner).await?;
    let requests = subscribe_requests(db, owner).await?;
    let setlists = subscribe_setlists(db, owner).await?;
    let profiles = subscribe_profile(db, owner).await?;
    let settings = subscribe_settings(db, owner).await?;
    pin_mut!(songs, requests, setlists, profiles, settings);

    // reload once the live queries are open, so nothing written between the
    // initial load and now can fall through the gap; replaying a change we
    // already have is harmless because folding is keyed by id
    tx.send_replace(CatalogFull::load(db, owner).await?);

    loop {
        tokio::select! {
            Some(change) = songs.next() => tx.send_modify(|snap| apply_song(snap, change)),
            Some(change) = requests.next() => tx.send_modify(|snap| apply_request(snap, change)),
            Some(change) = setlists.next() => tx.send_modify(|snap| apply_setlist(snap, change)),
            Some(change) = profiles.next() => tx.send_modify(|snap| snap.profile = change.into_record()),
            Some(change) = settings.next() => tx.send_modify(|snap| snap.settings = change.into_record()),
            else => break,
        }
    }
    Ok(())
}

fn apply_song(snapshot: &mut CatalogFull, change: Change<Song>) {
    match change {
        Change::Created(song) | Change::Updated(song) => {
            if let Some(slot) = snapshot.songs.iter_mut().find(|s| s.id == song.id) {
                *slot = song;
            } else {
                snapshot.songs.push(song);
            }
        }
        Change::Deleted(song) => snapshot.songs.retain(|s| s.id != song.id),
    }
}

fn apply_request(snapshot: &mut CatalogFull, change: Change<Request>) {
    match change {
        Change::Created(request) | Change::Updated(request) => {
            if let Some(slot) = snapshot.requests.iter_mut().find(|r| r.id == request.id) {
                *slot = request;
            } else {
                snapshot.requests.push(request);
            }
        }
        Change::Deleted(request) => snapshot.requests.retain(|r| r.id != request.id),
    }
}

fn apply_setlist(snapshot: &mut CatalogFull, change: Change<SetlistLog>) {
    match change {
        Change::Created(log) | Change::Updated(log) => {
            if let Some(slot) = snapshot.setlist_history.iter_mut().find(|l| l.id == log.id) {
                *slot = log;
            } else {
                snapshot.setlist_history.push(log);
            }
        }
        Change::Deleted(log) => snapshot.setlist_history.retain(|l| l.id != log.id),
    }
}
