//! The request lifecycle service: submission gates, status transitions with
//! their song-side effects, and requester blocking.

use log::{info, warn};
use surrealdb::{Connection, Surreal};
use tracing::instrument;

use songboard_core::{errors::SerializableError, rpc::Caller};
use songboard_storage::{
    db::schemas::{
        profile::Profile,
        request::{Request, RequestId, RequestStatus},
        settings::Settings,
        song::{RESERVED_REQUEST_TAG, Song, SongId},
    },
    util::unix_millis,
};

/// How many requests one viewer may have pending against one owner.
pub const MAX_PENDING_PER_REQUESTER: u64 = 3;

/// Shown when a requester leaves the name field empty.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Submit a new request against an owner's catalog.
///
/// All gates are checked here, before anything is written: sign-in, the
/// owner's request toggle, the block list, the NG keyword screen, and the
/// pending cap. A refusal has no partial effect.
///
/// The cap is a check-then-write: two submissions racing each other can both
/// pass it. That matches the trust boundary of the original clients; see
/// DESIGN.md.
#[instrument(skip(db))]
pub async fn submit<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    caller: &Caller,
    song_id: SongId,
    requester_name: &str,
    comment: &str,
) -> Result<Request, SerializableError> {
    if caller.is_anonymous() {
        return Err(SerializableError::SignInRequired);
    }

    let profile = Profile::read(db, owner).await?;
    if !profile.is_request_enabled {
        return Err(SerializableError::RequestsDisabled);
    }

    let settings = Settings::read(db, owner).await?;
    if settings.is_blocked(&caller.uid) {
        warn!("blocked requester {} tried to submit", caller.uid);
        return Err(SerializableError::Blocked);
    }
    if hits_ng_keyword(&settings, &[requester_name, comment]) {
        return Err(SerializableError::NgKeyword);
    }

    let pending = Request::count_pending_for(db, owner, &caller.uid).await?;
    if pending >= MAX_PENDING_PER_REQUESTER {
        return Err(SerializableError::RequestLimitReached(pending));
    }

    let song = Song::read(db, song_id)
        .await?
        .filter(|song| song.owner == owner)
        .ok_or(SerializableError::NotFound)?;

    let requester_name = match requester_name.trim() {
        "" => ANONYMOUS_NAME.to_string(),
        name => name.to_string(),
    };
    let request = Request {
        id: Request::generate_id(),
        owner: owner.to_string(),
        song_id: song.id,
        song_title: song.title,
        requester_name,
        requester_uid: caller.uid.clone(),
        comment: comment.to_string(),
        status: RequestStatus::Pending,
        created_at: unix_millis(),
        completed_at: None,
    };

    info!("new request for \"{}\" from {}", request.song_title, caller.uid);
    Request::create(db, request)
        .await?
        .ok_or(SerializableError::NotFound)
}

fn hits_ng_keyword(settings: &Settings, texts: &[&str]) -> bool {
    settings
        .ng_keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| texts.iter().any(|text| text.contains(keyword)))
}

/// Move a request through its lifecycle and apply the song-side effects.
///
/// The request update and the song transform are two separate writes, each
/// atomic on its own record; they are not coordinated with each other.
#[instrument(skip(db))]
pub async fn set_status<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    id: RequestId,
    to: RequestStatus,
) -> Result<Request, SerializableError> {
    let request = Request::read(db, id.clone())
        .await?
        .filter(|request| request.owner == owner)
        .ok_or(SerializableError::NotFound)?;

    let from = request.status;
    let now = unix_millis();
    let updated = Request::set_status(db, id, to, now).await?;
    apply_song_effects(db, &updated.song_id, from, to, now).await?;

    info!("request {} moved {from} -> {to}", updated.id);
    Ok(updated)
}

/// The denormalized song-side effects of a transition.
///
/// A missing song (deleted since the request was made) is not an error; the
/// transforms simply touch nothing.
async fn apply_song_effects<C: Connection>(
    db: &Surreal<C>,
    song_id: &SongId,
    from: RequestStatus,
    to: RequestStatus,
    now: i64,
) -> Result<(), SerializableError> {
    match to {
        RequestStatus::Accepted => {
            Song::add_tag(db, song_id.clone(), RESERVED_REQUEST_TAG).await?;
        }
        RequestStatus::Completed => {
            Song::remove_tag(db, song_id.clone(), RESERVED_REQUEST_TAG).await?;
            Song::mark_sung(db, song_id.clone(), now).await?;
        }
        RequestStatus::Rejected => {
            Song::remove_tag(db, song_id.clone(), RESERVED_REQUEST_TAG).await?;
        }
        // reverting an accepted request takes the tag back off
        RequestStatus::Pending if from == RequestStatus::Accepted => {
            Song::remove_tag(db, song_id.clone(), RESERVED_REQUEST_TAG).await?;
        }
        // hold <-> pending never touches the song
        RequestStatus::Pending | RequestStatus::Hold => {}
    }
    Ok(())
}

/// Block a requester: add them to the owner's block list, then force-reject
/// everything they still have in flight.
#[instrument(skip(db))]
pub async fn block<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    uid: &str,
    label: &str,
) -> Result<(), SerializableError> {
    Settings::block_user(db, owner, uid, label).await?;

    for request in Request::read_active_for(db, owner, uid).await? {
        let from = request.status;
        let now = unix_millis();
        let updated = Request::set_status(db, request.id, RequestStatus::Rejected, now).await?;
        apply_song_effects(db, &updated.song_id, from, RequestStatus::Rejected, now).await?;
    }

    info!("blocked requester {uid}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use songboard_storage::db::init_test_database;
    use songboard_storage::test_utils::{request_case, song_case, ulid};

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn viewer(uid: &str) -> Caller {
        Caller {
            uid: uid.to_string(),
            display_name: format!("viewer {uid}"),
            avatar_url: String::new(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_creates_a_pending_request(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let request = submit(
            &db,
            "owner-1",
            &viewer("viewer-1"),
            song.id.clone(),
            "Taro",
            "one of my favorites!",
        )
        .await
        .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.song_title, song.title);
        assert_eq!(request.requester_uid, "viewer-1");
        assert_eq!(Request::read_all(&db, "owner-1").await?.len(), 1);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_requires_sign_in(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let result = submit(&db, "owner-1", &Caller::default(), song.id, "", "").await;
        assert_eq!(result.unwrap_err(), SerializableError::SignInRequired);
        assert!(Request::read_all(&db, "owner-1").await?.is_empty());
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_blank_name_becomes_anonymous(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let request = submit(&db, "owner-1", &viewer("viewer-1"), song.id, "  ", "")
            .await
            .unwrap();
        assert_eq!(request.requester_name, ANONYMOUS_NAME);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_fourth_pending_request_is_refused_without_a_record(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        for _ in 0..3 {
            submit(&db, "owner-1", &viewer("viewer-1"), song.id.clone(), "T", "")
                .await
                .unwrap();
        }
        let result = submit(&db, "owner-1", &viewer("viewer-1"), song.id.clone(), "T", "").await;
        assert_eq!(
            result.unwrap_err(),
            SerializableError::RequestLimitReached(3)
        );
        assert_eq!(Request::read_all(&db, "owner-1").await?.len(), 3);

        // a different viewer is unaffected by viewer-1's cap
        submit(&db, "owner-1", &viewer("viewer-2"), song.id.clone(), "J", "")
            .await
            .unwrap();
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_honors_owner_gates(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        // requests switched off
        let mut profile = Profile::default();
        profile.is_request_enabled = false;
        Profile::write(&db, "owner-1", profile.clone()).await?;
        let result = submit(&db, "owner-1", &viewer("viewer-1"), song.id.clone(), "T", "").await;
        assert_eq!(result.unwrap_err(), SerializableError::RequestsDisabled);

        profile.is_request_enabled = true;
        Profile::write(&db, "owner-1", profile).await?;

        // NG keyword in the comment
        let mut settings = Settings::read(&db, "owner-1").await?;
        settings.ng_keywords = vec!["spoiler".to_string()];
        Settings::write(&db, "owner-1", settings).await?;
        let result = submit(
            &db,
            "owner-1",
            &viewer("viewer-1"),
            song.id.clone(),
            "T",
            "spoiler: it's great",
        )
        .await;
        assert_eq!(result.unwrap_err(), SerializableError::NgKeyword);

        // blocked uid
        Settings::block_user(&db, "owner-1", "viewer-1", "spammer").await?;
        let result = submit(&db, "owner-1", &viewer("viewer-1"), song.id.clone(), "T", "ok").await;
        assert_eq!(result.unwrap_err(), SerializableError::Blocked);

        assert!(Request::read_all(&db, "owner-1").await?.is_empty());
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_accept_tags_the_song_exactly_once(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;

        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Accepted)
            .await
            .unwrap();

        let tagged = Song::read(&db, song.id.clone()).await?.unwrap();
        assert_eq!(
            tagged
                .tags
                .iter()
                .filter(|t| *t == RESERVED_REQUEST_TAG)
                .count(),
            1
        );
        // counters untouched by an accept
        assert_eq!(tagged.sung_count, 0);
        assert_eq!(tagged.last_sung_at, None);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_complete_untags_and_bumps_counters(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;

        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Accepted)
            .await
            .unwrap();
        let completed = set_status(&db, "owner-1", request.id.clone(), RequestStatus::Completed)
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());

        let sung = Song::read(&db, song.id).await?.unwrap();
        assert!(!sung.tags.contains(&RESERVED_REQUEST_TAG.to_string()));
        assert_eq!(sung.sung_count, 1);
        assert!(sung.last_sung_at.is_some());
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_reject_untags_without_counters(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;

        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Accepted)
            .await
            .unwrap();
        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Rejected)
            .await
            .unwrap();

        let song = Song::read(&db, song.id).await?.unwrap();
        assert!(!song.tags.contains(&RESERVED_REQUEST_TAG.to_string()));
        assert_eq!(song.sung_count, 0);
        assert_eq!(song.last_sung_at, None);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_revert_accept_takes_the_tag_back(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;

        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Accepted)
            .await
            .unwrap();
        let reverted = set_status(&db, "owner-1", request.id.clone(), RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(reverted.status, RequestStatus::Pending);

        let song = Song::read(&db, song.id).await?.unwrap();
        assert!(!song.tags.contains(&RESERVED_REQUEST_TAG.to_string()));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_hold_and_back_leaves_the_song_alone(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;

        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Hold)
            .await
            .unwrap();
        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Pending)
            .await
            .unwrap();

        let untouched = Song::read(&db, song.id).await?.unwrap();
        assert_eq!(untouched.tags, song.tags);
        assert_eq!(untouched.sung_count, 0);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_completing_a_request_for_a_deleted_song_still_completes(
        ulid: String,
    ) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;
        let request = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, request.clone()).await?;
        set_status(&db, "owner-1", request.id.clone(), RequestStatus::Accepted)
            .await
            .unwrap();

        Song::delete(&db, song.id).await?;

        // the dangling song reference reads as unknown/deleted, not an error
        let completed = set_status(&db, "owner-1", request.id, RequestStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_block_rejects_everything_in_flight(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let pending = request_case("owner-1", &song, "viewer-1");
        Request::create(&db, pending.clone()).await?;
        let mut accepted = request_case("owner-1", &song, "viewer-1");
        accepted.status = RequestStatus::Accepted;
        Request::create(&db, accepted.clone()).await?;
        let mut done = request_case("owner-1", &song, "viewer-1");
        done.status = RequestStatus::Completed;
        Request::create(&db, done.clone()).await?;

        block(&db, "owner-1", "viewer-1", "spammer").await.unwrap();

        assert!(Settings::read(&db, "owner-1").await?.is_blocked("viewer-1"));
        let requests = Request::read_all(&db, "owner-1").await?;
        for request in &requests {
            let expected = if request.id == done.id {
                RequestStatus::Completed
            } else {
                RequestStatus::Rejected
            };
            assert_eq!(request.status, expected);
        }
        // and their requests count for nothing anymore
        assert_eq!(
            Request::count_pending_for(&db, "owner-1", "viewer-1").await?,
            0
        );
        Ok(())
    }
}
