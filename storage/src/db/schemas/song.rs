#![allow(clippy::module_name_repetitions)]
//----------------------------------------------------------------------------------------- std lib
//--------------------------------------------------------------------------------- other libraries
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Id, Thing};

pub type SongId = Thing;

pub const TABLE_NAME: &str = "song";

/// Tag a song wears while it has an accepted, not-yet-sung request.
///
/// Managed by the request lifecycle, never entered by hand.
pub const RESERVED_REQUEST_TAG: &str = "Requested";

/// Tag that marks a song as still being practiced; drives the "Practicing"
/// filter facet on the public page.
pub const PRACTICE_TAG: &str = "Practicing";

/// This struct holds all the catalog data about a particular [`Song`].
///
/// Every optional field defaults at deserialization time, so records written
/// by older clients (or sparse imports) materialize as fully-populated values
/// here rather than being guarded at every call site.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Song {
    /// The unique identifier for this [`Song`].
    pub id: SongId,
    /// Uid of the streamer whose catalog this song belongs to.
    pub owner: String,
    /// Title of the [`Song`].
    pub title: String,
    /// Artist of the [`Song`].
    #[serde(default)]
    pub artist: String,
    /// Category the owner filed this song under (e.g. "J-POP").
    #[serde(default)]
    pub category: String,
    /// Free-form tags, including the reserved request tag while a request is
    /// in flight.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Key adjustment, as the owner writes it (e.g. "+2", "original").
    #[serde(default)]
    pub key: String,
    /// Public performance memo.
    #[serde(default)]
    pub memo: String,
    /// Owner-only memo, never shown on the public page.
    #[serde(default)]
    pub private_memo: String,
    /// Phonetic reading of the title, for kana search.
    #[serde(default)]
    pub reading: String,
    /// Link to the lyrics.
    #[serde(default)]
    pub lyrics_url: String,
    /// Link to a reference recording.
    #[serde(default)]
    pub youtube_url: String,
    /// Beats per minute, if the owner bothered to note it.
    #[serde(default)]
    pub bpm: Option<u16>,
    /// Vocal range, as the owner writes it (e.g. "lowG-hiC").
    #[serde(default)]
    pub note_range: Option<String>,
    /// Owner's own rating of the song, 0-5.
    #[serde(default)]
    pub rating: u8,
    /// How far along practice is, 0-100.
    #[serde(default)]
    pub practice_rate: u8,
    /// Whether the song is on the working setlist.
    #[serde(default)]
    pub is_setlist: bool,
    /// Position within the working setlist.
    #[serde(default)]
    pub setlist_order: Option<u32>,
    /// Pinned songs sort ahead of everything else.
    #[serde(default)]
    pub is_pinned: bool,
    /// When the song was last performed, unix millis.
    #[serde(default)]
    pub last_sung_at: Option<i64>,
    /// How many times the song has been performed. Only ever increases.
    #[serde(default)]
    pub sung_count: u32,
    /// Audience like counter. Incremented atomically, never overwritten.
    #[serde(default)]
    pub likes: u32,
    /// When the record was created, unix millis.
    #[serde(default)]
    pub created_at: i64,
}

impl Song {
    #[must_use]
    pub fn generate_id() -> SongId {
        Thing::from((TABLE_NAME, Id::ulid()))
    }

    /// Build a new [`Song`] record from a draft, with counters zeroed.
    #[must_use]
    pub fn from_draft(owner: &str, draft: SongDraft, now: i64) -> Self {
        Self {
            id: Self::generate_id(),
            owner: owner.to_string(),
            title: draft.title,
            artist: draft.artist,
            category: draft.category,
            tags: draft.tags,
            key: draft.key,
            memo: draft.memo,
            private_memo: draft.private_memo,
            reading: draft.reading,
            lyrics_url: draft.lyrics_url,
            youtube_url: draft.youtube_url,
            bpm: draft.bpm,
            note_range: draft.note_range,
            rating: draft.rating,
            practice_rate: draft.practice_rate,
            is_setlist: false,
            setlist_order: None,
            is_pinned: false,
            last_sung_at: None,
            sung_count: 0,
            likes: 0,
            created_at: now,
        }
    }

    /// Check the field invariants that creation and edits must uphold.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is empty, the rating exceeds 5, or the
    /// practice rate exceeds 100.
    pub fn validate(&self) -> Result<(), crate::errors::Error> {
        validate_fields(&self.title, self.rating, self.practice_rate)
    }
}

pub(crate) fn validate_fields(
    title: &str,
    rating: u8,
    practice_rate: u8,
) -> Result<(), crate::errors::Error> {
    if title.trim().is_empty() {
        return Err(crate::errors::Error::EmptyTitle);
    }
    if rating > 5 {
        return Err(crate::errors::Error::RatingOutOfRange(rating));
    }
    if practice_rate > 100 {
        return Err(crate::errors::Error::PracticeRateOutOfRange(practice_rate));
    }
    Ok(())
}

/// The owner-supplied fields of a new [`Song`], before ids and counters are
/// attached. This is what manual entry and the import paths produce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SongDraft {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub private_memo: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub lyrics_url: String,
    #[serde(default)]
    pub youtube_url: String,
    #[serde(default)]
    pub bpm: Option<u16>,
    #[serde(default)]
    pub note_range: Option<String>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub practice_rate: u8,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SongChangeSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<Option<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_range: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_rate: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_setlist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setlist_order: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

/// The id/title/artist triple used by setlist snapshots and anywhere else a
/// full [`Song`] would be overkill.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SongBrief {
    pub id: SongId,
    pub title: String,
    pub artist: String,
}

impl From<Song> for SongBrief {
    fn from(song: Song) -> Self {
        Self {
            id: song.id,
            title: song.title,
            artist: song.artist,
        }
    }
}

impl From<&Song> for SongBrief {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id.clone(),
            title: song.title.clone(),
            artist: song.artist.clone(),
        }
    }
}
