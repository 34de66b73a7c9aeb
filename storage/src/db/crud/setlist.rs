//! CRUD operations for the setlist history table

use surrealdb::{Connection, RecordId, Surreal};
use tracing::instrument;

use crate::{
    db::{
        queries,
        schemas::{
            setlist::{SetlistLog, TABLE_NAME},
            song::{Song, SongBrief},
        },
    },
    errors::Error,
};

impl SetlistLog {
    #[instrument()]
    pub async fn create<C: Connection>(db: &Surreal<C>, log: Self) -> Result<Option<Self>, Error> {
        Ok(db
            .create(RecordId::from_inner(log.id.clone()))
            .content(log)
            .await?)
    }

    #[instrument()]
    pub async fn read_all<C: Connection>(db: &Surreal<C>, owner: &str) -> Result<Vec<Self>, Error> {
        Ok(db
            .query(queries::read_all_for_owner(TABLE_NAME))
            .bind(("owner", owner.to_string()))
            .await?
            .take(0)?)
    }

    /// Finalize the owner's working setlist.
    ///
    /// Appends an immutable snapshot of the flagged songs and, in the same
    /// transaction, bumps each song's `sung_count`, stamps `last_sung_at`,
    /// and clears the working flags. Returns `None` when the working setlist
    /// is empty (nothing is written in that case).
    #[instrument()]
    pub async fn finalize<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        now: i64,
    ) -> Result<Option<Self>, Error> {
        let mut working: Vec<Song> = Song::read_all(db, owner)
            .await?
            .into_iter()
            .filter(|song| song.is_setlist)
            .collect();
        if working.is_empty() {
            return Ok(None);
        }
        working.sort_by(|a, b| {
            a.setlist_order
                .cmp(&b.setlist_order)
                .then_with(|| a.title.cmp(&b.title))
        });

        let songs: Vec<SongBrief> = working.iter().map(SongBrief::from).collect();
        let log_id = Self::generate_id();

        let mut response = db
            .query(queries::finalize_setlist())
            .bind(("log_id", log_id))
            .bind(("owner", owner.to_string()))
            .bind(("now", now))
            .bind(("songs", songs))
            .await?;
        let created: Vec<Self> = response.take(0)?;
        Ok(created.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_database;
    use crate::test_utils::{song_case, ulid};

    use anyhow::{Result, anyhow};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_finalize_empty_setlist_writes_nothing(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        Song::create(&db, song_case("owner-1", &ulid)).await?;

        assert_eq!(SetlistLog::finalize(&db, "owner-1", 1_000).await?, None);
        assert!(SetlistLog::read_all(&db, "owner-1").await?.is_empty());
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_finalize_snapshots_in_order_and_updates_songs(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut second = song_case("owner-1", &format!("{ulid}-b"));
        second.is_setlist = true;
        second.setlist_order = Some(2);
        let mut first = song_case("owner-1", &format!("{ulid}-a"));
        first.is_setlist = true;
        first.setlist_order = Some(1);
        let bystander = song_case("owner-1", &format!("{ulid}-c"));
        Song::create(&db, second.clone()).await?;
        Song::create(&db, first.clone()).await?;
        Song::create(&db, bystander.clone()).await?;

        let log = SetlistLog::finalize(&db, "owner-1", 5_000)
            .await?
            .ok_or_else(|| anyhow!("expected a log"))?;
        assert_eq!(log.date, 5_000);
        assert_eq!(
            log.songs,
            vec![SongBrief::from(&first), SongBrief::from(&second)]
        );

        let read = Song::read(&db, first.id).await?.unwrap();
        assert_eq!(read.sung_count, 1);
        assert_eq!(read.last_sung_at, Some(5_000));
        assert!(!read.is_setlist);
        assert_eq!(read.setlist_order, None);

        let read = Song::read(&db, bystander.id).await?.unwrap();
        assert_eq!(read.sung_count, 0);

        let history = SetlistLog::read_all(&db, "owner-1").await?;
        assert_eq!(history, vec![log]);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_finalize_twice_keeps_counting_up(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut song = song_case("owner-1", &ulid);
        song.is_setlist = true;
        Song::create(&db, song.clone()).await?;

        SetlistLog::finalize(&db, "owner-1", 1_000).await?;
        // flag it again for the next stream
        Song::update(
            &db,
            song.id.clone(),
            crate::db::schemas::song::SongChangeSet {
                is_setlist: Some(true),
                ..Default::default()
            },
        )
        .await?;
        SetlistLog::finalize(&db, "owner-1", 2_000).await?;

        let read = Song::read(&db, song.id).await?.unwrap();
        assert_eq!(read.sung_count, 2);
        assert_eq!(read.last_sung_at, Some(2_000));
        assert_eq!(SetlistLog::read_all(&db, "owner-1").await?.len(), 2);
        Ok(())
    }
}
