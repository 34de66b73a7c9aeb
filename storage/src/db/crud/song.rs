//! CRUD operations for the song table

use surrealdb::{Connection, RecordId, Surreal};
use tracing::instrument;

use crate::{
    db::{
        queries,
        schemas::song::{Song, SongChangeSet, SongId, TABLE_NAME},
    },
    errors::Error,
};

impl Song {
    #[instrument()]
    pub async fn create<C: Connection>(db: &Surreal<C>, song: Self) -> Result<Option<Self>, Error> {
        song.validate()?;
        Ok(db
            .create(RecordId::from_inner(song.id.clone()))
            .content(song)
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

    #[instrument()]
    pub async fn read<C: Connection>(db: &Surreal<C>, id: SongId) -> Result<Option<Self>, Error> {
        Ok(db.select(RecordId::from_inner(id)).await?)
    }

    #[instrument()]
    pub async fn update<C: Connection>(
        db: &Surreal<C>,
        id: SongId,
        changes: SongChangeSet,
    ) -> Result<Option<Self>, Error> {
        if let Some(title) = &changes.title {
            if title.trim().is_empty() {
                return Err(Error::EmptyTitle);
            }
        }
        if let Some(rating) = changes.rating {
            if rating > 5 {
                return Err(Error::RatingOutOfRange(rating));
            }
        }
        if let Some(practice_rate) = changes.practice_rate {
            if practice_rate > 100 {
                return Err(Error::PracticeRateOutOfRange(practice_rate));
            }
        }
        Ok(db.update(RecordId::from_inner(id)).merge(changes).await?)
    }

    #[instrument()]
    pub async fn delete<C: Connection>(db: &Surreal<C>, id: SongId) -> Result<Option<Self>, Error> {
        Ok(db.delete(RecordId::from_inner(id)).await?)
    }

    /// Bump the like counter by one.
    ///
    /// An atomic transform on the record, so concurrent likes from separate
    /// viewers all land.
    #[instrument()]
    pub async fn add_like<C: Connection>(
        db: &Surreal<C>,
        id: SongId,
    ) -> Result<Option<Self>, Error> {
        let updated: Vec<Self> = db
            .query(queries::add_like())
            .bind(("song", id))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Record one performance: `sung_count += 1`, `last_sung_at = now`.
    #[instrument()]
    pub async fn mark_sung<C: Connection>(
        db: &Surreal<C>,
        id: SongId,
        now: i64,
    ) -> Result<Option<Self>, Error> {
        let updated: Vec<Self> = db
            .query(queries::mark_sung())
            .bind(("song", id))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Add `tag` to the song's tag list if it isn't already there.
    #[instrument()]
    pub async fn add_tag<C: Connection>(
        db: &Surreal<C>,
        id: SongId,
        tag: &str,
    ) -> Result<Option<Self>, Error> {
        let updated: Vec<Self> = db
            .query(queries::add_tag())
            .bind(("song", id))
            .bind(("tag", tag.to_string()))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Remove every occurrence of `tag` from the song's tag list.
    #[instrument()]
    pub async fn remove_tag<C: Connection>(
        db: &Surreal<C>,
        id: SongId,
        tag: &str,
    ) -> Result<Option<Self>, Error> {
        let updated: Vec<Self> = db
            .query(queries::remove_tag())
            .bind(("song", id))
            .bind(("tag", tag.to_string()))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Take every one of the owner's songs off the working setlist.
    ///
    /// One batch write over the whole catalog, applied as a set.
    #[instrument()]
    pub async fn clear_setlist<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
    ) -> Result<Vec<Self>, Error> {
        Ok(db
            .query(queries::clear_setlist())
            .bind(("owner", owner.to_string()))
            .await?
            .take(0)?)
    }

    /// Overwrite the working setlist with the given songs.
    ///
    /// Clears every flag, then raises `is_setlist` on the listed ids, as one
    /// batch transaction. Ids that no longer resolve are skipped by the
    /// engine, so a stale preset loads whatever subset still exists.
    #[instrument()]
    pub async fn apply_setlist<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        song_ids: Vec<SongId>,
    ) -> Result<Vec<Self>, Error> {
        Ok(db
            .query(queries::apply_setlist_preset())
            .bind(("owner", owner.to_string()))
            .bind(("ids", song_ids))
            .await?
            .take(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_database;
    use crate::db::schemas::song::RESERVED_REQUEST_TAG;
    use crate::test_utils::{song_case, ulid};

    use anyhow::{Result, anyhow};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_create(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        let result = Song::create(&db, song.clone()).await?;
        assert_eq!(result, Some(song));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_rejects_invalid_song(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut song = song_case("owner-1", &ulid);
        song.rating = 9;
        assert!(Song::create(&db, song).await.is_err());
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_read_all_is_scoped_to_owner(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mine = song_case("owner-1", &ulid);
        let theirs = song_case("owner-2", &ulid);
        Song::create(&db, mine.clone()).await?;
        Song::create(&db, theirs).await?;

        let result = Song::read_all(&db, "owner-1").await?;
        assert_eq!(result, vec![mine]);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_update(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let changes = SongChangeSet {
            key: Some("+2".to_string()),
            is_pinned: Some(true),
            ..SongChangeSet::default()
        };
        let updated = Song::update(&db, song.id.clone(), changes).await?;
        let read = Song::read(&db, song.id.clone())
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;

        assert_eq!(read.key, "+2");
        assert!(read.is_pinned);
        // untouched fields survive the merge
        assert_eq!(read.title, song.title);
        assert_eq!(Some(read), updated);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let result = Song::delete(&db, song.id.clone()).await?;
        assert_eq!(result, Some(song.clone()));
        assert_eq!(Song::read(&db, song.id).await?, None);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_concurrent_likes_both_land(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let (a, b) = tokio::join!(
            Song::add_like(&db, song.id.clone()),
            Song::add_like(&db, song.id.clone()),
        );
        a?;
        b?;

        let read = Song::read(&db, song.id)
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;
        assert_eq!(read.likes, 2);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_mark_sung_moves_counters_forward(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let updated = Song::mark_sung(&db, song.id.clone(), 1_000)
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;
        assert_eq!(updated.sung_count, 1);
        assert_eq!(updated.last_sung_at, Some(1_000));

        let updated = Song::mark_sung(&db, song.id, 2_000)
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;
        assert_eq!(updated.sung_count, 2);
        assert_eq!(updated.last_sung_at, Some(2_000));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_add_tag_is_idempotent(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        Song::add_tag(&db, song.id.clone(), RESERVED_REQUEST_TAG).await?;
        let updated = Song::add_tag(&db, song.id.clone(), RESERVED_REQUEST_TAG)
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;
        assert_eq!(
            updated
                .tags
                .iter()
                .filter(|t| *t == RESERVED_REQUEST_TAG)
                .count(),
            1
        );

        let updated = Song::remove_tag(&db, song.id, RESERVED_REQUEST_TAG)
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;
        assert!(!updated.tags.contains(&RESERVED_REQUEST_TAG.to_string()));
        // the tag the song already had is untouched
        assert!(updated.tags.contains(&"Ballad".to_string()));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_apply_setlist_overwrites_working_flags(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut old = song_case("owner-1", &format!("{ulid}-a"));
        old.is_setlist = true;
        let new = song_case("owner-1", &format!("{ulid}-b"));
        Song::create(&db, old.clone()).await?;
        Song::create(&db, new.clone()).await?;

        let applied = Song::apply_setlist(&db, "owner-1", vec![new.id.clone()]).await?;
        assert_eq!(applied.len(), 1);

        assert!(!Song::read(&db, old.id).await?.unwrap().is_setlist);
        assert!(Song::read(&db, new.id).await?.unwrap().is_setlist);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_clear_setlist_only_touches_flagged_songs(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut on = song_case("owner-1", &format!("{ulid}-a"));
        on.is_setlist = true;
        on.setlist_order = Some(1);
        let off = song_case("owner-1", &format!("{ulid}-b"));
        Song::create(&db, on.clone()).await?;
        Song::create(&db, off.clone()).await?;

        let cleared = Song::clear_setlist(&db, "owner-1").await?;
        assert_eq!(cleared.len(), 1);

        let read = Song::read(&db, on.id)
            .await?
            .ok_or_else(|| anyhow!("Song not found"))?;
        assert!(!read.is_setlist);
        assert_eq!(read.setlist_order, None);
        // counters are not part of a setlist toggle
        assert_eq!(read.sung_count, 0);
        assert_eq!(read.last_sung_at, None);
        Ok(())
    }
}
