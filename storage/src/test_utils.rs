//! utilities used for testing
//!
//! record factories and the rstest fixtures shared by the crud, service, and
//! sync tests.

use rstest::fixture;

use crate::db::schemas::{
    request::{Request, RequestStatus},
    song::{Song, SongDraft},
};
use crate::util::unix_millis;

#[fixture]
pub fn ulid() -> String {
    ulid::Ulid::new().to_string()
}

/// A catalog song with unique title/artist derived from `ulid`.
#[must_use]
pub fn song_case(owner: &str, ulid: &str) -> Song {
    let mut song = Song::from_draft(
        owner,
        SongDraft {
            title: format!("Song {ulid}"),
            artist: format!("Artist {ulid}"),
            category: "J-POP".to_string(),
            reading: format!("reading {ulid}"),
            ..SongDraft::default()
        },
        unix_millis(),
    );
    song.tags = vec!["Ballad".to_string()];
    song
}

/// A pending request from `uid` against the given song.
#[must_use]
pub fn request_case(owner: &str, song: &Song, uid: &str) -> Request {
    Request {
        id: Request::generate_id(),
        owner: owner.to_string(),
        song_id: song.id.clone(),
        song_title: song.title.clone(),
        requester_name: format!("viewer {uid}"),
        requester_uid: uid.to_string(),
        comment: "please!".to_string(),
        status: RequestStatus::Pending,
        created_at: unix_millis(),
        completed_at: None,
    }
}
