//! Live-query subscriptions over the catalog tables.
//!
//! This is the push-based update primitive: `subscribe` turns a table into a
//! stream of per-record [`Change`]s scoped to one owner. The engine delivers
//! changes to a single client in per-table order; nothing is promised across
//! clients. Dropping the stream ends the underlying live query.

use futures::{Stream, StreamExt};
use log::warn;
use serde::de::DeserializeOwned;
use surrealdb::{Action, Connection, Notification, Surreal};

use crate::db::schemas::{
    profile, profile::Profile, request, request::Request, setlist, setlist::SetlistLog, settings,
    settings::Settings, song, song::Song,
};
use crate::errors::Error;

/// One push-delivered change to a catalog record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change<T> {
    Created(T),
    Updated(T),
    Deleted(T),
}

impl<T> Change<T> {
    pub fn record(&self) -> &T {
        match self {
            Self::Created(record) | Self::Updated(record) | Self::Deleted(record) => record,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            Self::Created(record) | Self::Updated(record) | Self::Deleted(record) => record,
        }
    }

    fn from_notification(notification: Notification<T>) -> Self {
        match notification.action {
            Action::Create => Self::Created(notification.data),
            Action::Delete => Self::Deleted(notification.data),
            // `Action` is non-exhaustive; anything unknown reads best as an
            // update to the record we were handed
            _ => Self::Updated(notification.data),
        }
    }
}

/// Records that belong to exactly one owner's catalog scope.
pub trait OwnerScoped {
    fn owner(&self) -> &str;
}

impl OwnerScoped for Song {
    fn owner(&self) -> &str {
        &self.owner
    }
}

impl OwnerScoped for Request {
    fn owner(&self) -> &str {
        &self.owner
    }
}

impl OwnerScoped for SetlistLog {
    fn owner(&self) -> &str {
        &self.owner
    }
}

impl OwnerScoped for Profile {
    fn owner(&self) -> &str {
        &self.owner
    }
}

impl OwnerScoped for Settings {
    fn owner(&self) -> &str {
        &self.owner
    }
}

/// Subscribe to every change of `table`, filtered to one owner's records.
///
/// # Errors
///
/// Returns an error if the live query cannot be started.
pub async fn subscribe<C, T>(
    db: &Surreal<C>,
    table: &'static str,
    owner: &str,
) -> Result<impl Stream<Item = Change<T>> + Send, Error>
where
    C: Connection,
    T: OwnerScoped + DeserializeOwned + Unpin + Send + Sync + 'static,
{
    let owner = owner.to_string();
    let stream: surrealdb::method::Stream<Vec<T>> = db.select(table).live().await?;
    Ok(
        stream.filter_map(move |result: surrealdb::Result<Notification<T>>| {
            let keep = match result {
                Ok(notification) => {
                    let change = Change::from_notification(notification);
                    (change.record().owner() == owner).then_some(change)
                }
                Err(e) => {
                    warn!("live query error on {table}: {e}");
                    None
                }
            };
            futures::future::ready(keep)
        }),
    )
}

/// Changes to the owner's songs.
///
/// # Errors
///
/// Returns an error if the live query cannot be started.
pub async fn subscribe_songs<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<impl Stream<Item = Change<Song>> + Send, Error> {
    subscribe(db, song::TABLE_NAME, owner).await
}

/// Changes to the owner's requests.
///
/// # Errors
///
/// Returns an error if the live query cannot be started.
pub async fn subscribe_requests<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<impl Stream<Item = Change<Request>> + Send, Error> {
    subscribe(db, request::TABLE_NAME, owner).await
}

/// Changes to the owner's setlist history.
///
/// # Errors
///
/// Returns an error if the live query cannot be started.
pub async fn subscribe_setlists<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<impl Stream<Item = Change<SetlistLog>> + Send, Error> {
    subscribe(db, setlist::TABLE_NAME, owner).await
}

/// Changes to the owner's profile.
///
/// # Errors
///
/// Returns an error if the live query cannot be started.
pub async fn subscribe_profile<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<impl Stream<Item = Change<Profile>> + Send, Error> {
    subscribe(db, profile::TABLE_NAME, owner).await
}

/// Changes to the owner's settings.
///
/// # Errors
///
/// Returns an error if the live query cannot be started.
pub async fn subscribe_settings<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<impl Stream<Item = Change<Settings>> + Send, Error> {
    subscribe(db, settings::TABLE_NAME, owner).await
}
