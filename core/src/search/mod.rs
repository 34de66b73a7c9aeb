//! Pure, synchronous search over the materialized song list.
//!
//! Everything here takes `&[Song]` and returns fresh values; it is meant to
//! be re-run on every keystroke or filter change against whatever snapshot
//! the caller currently holds. Nothing is persisted.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use songboard_storage::db::schemas::song::{PRACTICE_TAG, RESERVED_REQUEST_TAG, Song};

/// A song that hasn't been performed in this long gets the "long time no
/// see" treatment on the public page.
pub const LONG_UNSUNG_MILLIS: i64 = 90 * 24 * 60 * 60 * 1000;

/// Canonical form used for matching: trimmed, lowercased, fullwidth ASCII
/// folded to halfwidth, and all whitespace (interior included) stripped.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            // fullwidth ASCII block, at a fixed offset from the halfwidth one
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// [`normalize`], plus hiragana folded to katakana so "まりーごーるど"
/// finds "マリーゴールド". Also idempotent.
#[must_use]
pub fn normalize_kana(text: &str) -> String {
    normalize(text)
        .chars()
        .map(|c| match c {
            // hiragana block, at a fixed offset below katakana
            '\u{3041}'..='\u{3096}' => char::from_u32(c as u32 + 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Substring containment across title, artist, category, reading, and every
/// tag, after normalization. An empty keyword matches everything.
#[must_use]
pub fn matches_keyword(song: &Song, keyword: &str) -> bool {
    let term = normalize_kana(keyword);
    if term.is_empty() {
        return true;
    }
    [&song.title, &song.artist, &song.category, &song.reading]
        .into_iter()
        .any(|field| normalize_kana(field).contains(&term))
        || song.tags.iter().any(|tag| normalize_kana(tag).contains(&term))
}

/// The category/mood filter facets offered alongside keyword search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SongFacet {
    /// No facet filtering.
    #[default]
    All,
    /// Songs currently wearing the reserved request tag.
    Requested,
    /// Songs tagged as still in practice.
    Practicing,
    /// Exact match on the category field.
    Category(String),
    /// Membership in an owner-defined tag group; the resolved tag set is
    /// carried here so the facet stays a pure predicate.
    Mood(Vec<String>),
}

impl SongFacet {
    #[must_use]
    pub fn matches(&self, song: &Song) -> bool {
        match self {
            Self::All => true,
            Self::Requested => song.tags.iter().any(|t| t == RESERVED_REQUEST_TAG),
            Self::Practicing => song.tags.iter().any(|t| t == PRACTICE_TAG),
            Self::Category(category) => song.category == *category,
            Self::Mood(tags) => song.tags.iter().any(|t| tags.contains(t)),
        }
    }
}

/// Sort orders for the song list. Pinned songs always come first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SongSort {
    /// Most recently added first.
    #[default]
    Newest,
    /// Most liked first, newest as the tiebreak.
    MostLiked,
    /// Title, case-folded lexicographic.
    Title,
    /// Artist, case-folded lexicographic.
    Artist,
    /// Most performed first.
    MostSung,
}

/// Sort in place: pinned first, then by the chosen key.
pub fn sort_songs(songs: &mut [Song], sort: SongSort) {
    songs.sort_by(|a, b| {
        b.is_pinned.cmp(&a.is_pinned).then_with(|| match sort {
            SongSort::Newest => b.created_at.cmp(&a.created_at),
            SongSort::MostLiked => b
                .likes
                .cmp(&a.likes)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            SongSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SongSort::Artist => a.artist.to_lowercase().cmp(&b.artist.to_lowercase()),
            SongSort::MostSung => b
                .sung_count
                .cmp(&a.sung_count)
                .then_with(|| b.created_at.cmp(&a.created_at)),
        })
    });
}

/// One keyword + facet + sort, the whole search state of a page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SongQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub facet: SongFacet,
    #[serde(default)]
    pub sort: SongSort,
}

/// Filter and sort a snapshot of the catalog.
#[must_use]
pub fn search(songs: &[Song], query: &SongQuery) -> Vec<Song> {
    let mut hits: Vec<Song> = songs
        .iter()
        .filter(|song| query.facet.matches(song) && matches_keyword(song, &query.keyword))
        .cloned()
        .collect();
    sort_songs(&mut hits, query.sort);
    hits
}

/// Gacha: pick one song uniformly from the (already filtered) list.
pub fn draw<'a, R: Rng + ?Sized>(songs: &'a [Song], rng: &mut R) -> Option<&'a Song> {
    songs.choose(rng)
}

/// Gacha: pick up to `count` distinct songs uniformly.
pub fn draw_many<'a, R: Rng + ?Sized>(
    songs: &'a [Song],
    count: usize,
    rng: &mut R,
) -> Vec<&'a Song> {
    songs.choose_multiple(rng, count).collect()
}

/// Whether a song hasn't been performed for [`LONG_UNSUNG_MILLIS`].
///
/// Never-performed songs don't count; they get their own empty-state
/// treatment instead.
#[must_use]
pub fn is_long_unsung(last_sung_at: Option<i64>, now: i64) -> bool {
    last_sung_at.is_some_and(|at| at < now - LONG_UNSUNG_MILLIS)
}
