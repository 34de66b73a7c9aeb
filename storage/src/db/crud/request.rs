//! CRUD operations for the request table

use serde::{Deserialize, Serialize};
use surrealdb::{Connection, RecordId, Surreal};
use tracing::instrument;

use crate::{
    db::{
        queries,
        schemas::request::{Request, RequestId, RequestStatus, TABLE_NAME},
    },
    errors::Error,
};

/// Merge patch applied when a request changes status.
#[derive(Debug, Serialize)]
struct StatusPatch {
    status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<i64>,
}

/// Row shape of the `count() … GROUP ALL` queries.
#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

impl Request {
    #[instrument()]
    pub async fn create<C: Connection>(
        db: &Surreal<C>,
        request: Self,
    ) -> Result<Option<Self>, Error> {
        Ok(db
            .create(RecordId::from_inner(request.id.clone()))
            .content(request)
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
    pub async fn read<C: Connection>(
        db: &Surreal<C>,
        id: RequestId,
    ) -> Result<Option<Self>, Error> {
        Ok(db.select(RecordId::from_inner(id)).await?)
    }

    /// Move a request to a new lifecycle state.
    ///
    /// The transition is validated against the current state first; illegal
    /// moves (anything out of `completed`/`rejected`, skipping `accepted` on
    /// the way to `completed`, …) fail without touching the record.
    /// `completed_at` is stamped when the new state is `Completed`.
    ///
    /// Song-side effects (reserved tag, counters) are not handled here; see
    /// the request service in the daemon.
    #[instrument()]
    pub async fn set_status<C: Connection>(
        db: &Surreal<C>,
        id: RequestId,
        to: RequestStatus,
        now: i64,
    ) -> Result<Self, Error> {
        let request = Self::read(db, id.clone()).await?.ok_or(Error::NotFound)?;
        if !request.status.can_transition(to) {
            return Err(Error::IllegalTransition(request.status, to));
        }

        let patch = StatusPatch {
            status: to,
            completed_at: (to == RequestStatus::Completed).then_some(now),
        };
        db.update(RecordId::from_inner(id))
            .merge(patch)
            .await?
            .ok_or(Error::NotFound)
    }

    /// How many requests from `uid` are still pending against this owner.
    #[instrument()]
    pub async fn count_pending_for<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        uid: &str,
    ) -> Result<u64, Error> {
        let rows: Vec<CountRow> = db
            .query(queries::count_pending_for_requester())
            .bind(("owner", owner.to_string()))
            .bind(("uid", uid.to_string()))
            .await?
            .take(0)?;
        Ok(rows.first().map_or(0, |row| row.count))
    }

    /// Every not-yet-terminal request from `uid` against this owner.
    #[instrument()]
    pub async fn read_active_for<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        uid: &str,
    ) -> Result<Vec<Self>, Error> {
        Ok(db
            .query(queries::read_active_for_requester())
            .bind(("owner", owner.to_string()))
            .bind(("uid", uid.to_string()))
            .await?
            .take(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_database;
    use crate::db::schemas::song::Song;
    use crate::test_utils::{request_case, song_case, ulid};

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_create_and_read_scoped_to_owner(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let request = request_case("owner-1", &song, "viewer-1");
        let other = request_case("owner-2", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;
        Request::create(&db, other).await?;

        assert_eq!(Request::read_all(&db, "owner-1").await?, vec![request]);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_accept_then_complete_stamps_completed_at(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;

        let accepted =
            Request::set_status(&db, request.id.clone(), RequestStatus::Accepted, 1_000).await?;
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert_eq!(accepted.completed_at, None);

        let completed =
            Request::set_status(&db, request.id.clone(), RequestStatus::Completed, 2_000).await?;
        assert_eq!(completed.status, RequestStatus::Completed);
        assert_eq!(completed.completed_at, Some(2_000));
        Ok(())
    }

    #[rstest]
    #[case(RequestStatus::Completed, RequestStatus::Pending)]
    #[case(RequestStatus::Rejected, RequestStatus::Accepted)]
    #[case(RequestStatus::Pending, RequestStatus::Completed)]
    #[tokio::test]
    async fn test_illegal_transitions_leave_the_record_alone(
        ulid: String,
        #[case] from: RequestStatus,
        #[case] to: RequestStatus,
    ) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let mut request = request_case("owner-1", &song, "viewer-1");
        request.status = from;
        Request::create(&db, request.clone()).await?;

        let result = Request::set_status(&db, request.id.clone(), to, 1_000).await;
        assert!(matches!(result, Err(Error::IllegalTransition(f, t)) if f == from && t == to));

        let read = Request::read(&db, request.id).await?.unwrap();
        assert_eq!(read.status, from);
        assert_eq!(read.completed_at, None);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_count_pending_only_counts_pending(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        for status in [
            RequestStatus::Pending,
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            let mut request = request_case("owner-1", &song, "viewer-1");
            request.status = status;
            Request::create(&db, request).await?;
        }
        // a different requester does not count against viewer-1
        Request::create(&db, request_case("owner-1", &song, "viewer-2")).await?;

        assert_eq!(
            Request::count_pending_for(&db, "owner-1", "viewer-1").await?,
            2
        );
        assert_eq!(
            Request::count_pending_for(&db, "owner-1", "viewer-3").await?,
            0
        );

        let active = Request::read_active_for(&db, "owner-1", "viewer-1").await?;
        assert_eq!(active.len(), 3);
        Ok(())
    }
}
