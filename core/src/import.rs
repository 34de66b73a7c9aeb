//! The bulk import parser and planner.
//!
//! Owners paste freeform setlists — bulleted, numbered, comma/slash/pipe
//! delimited, straight out of a stream description or a memo app — and this
//! module turns them into per-line actions against the catalog. Parsing and
//! planning are pure; the daemon's catalog service executes the plan.

use serde::{Deserialize, Serialize};
use songboard_storage::db::schemas::song::{Song, SongId};

use crate::search::normalize;

/// One usable line of pasted text: `title[, artist[, category]]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParsedLine {
    pub title: String,
    pub artist: String,
    pub category: Option<String>,
}

/// What the import will do for one parsed line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportAction {
    /// No catalog match: create a new song from the line.
    Create(ParsedLine),
    /// Matched an existing song: bump `sung_count` and stamp `last_sung_at`
    /// instead of creating a duplicate.
    MarkSung(SongId),
}

/// Tally of an executed import, shown back to the owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
}

/// Parse a single pasted line. Returns `None` for lines with no title left
/// after cleanup; those drop silently.
#[must_use]
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let cleaned = strip_markers(line.trim());
    if cleaned.is_empty() {
        return None;
    }

    // unify the delimiter zoo down to a comma
    let normalized: String = cleaned
        .chars()
        .map(|c| match c {
            '，' | '、' | '\t' | '|' | '｜' | '/' | '／' => ',',
            _ => c,
        })
        .collect();

    let parts: Vec<&str> = if normalized.contains(',') {
        normalized.split(',').collect()
    } else if cleaned.contains(" - ") {
        cleaned.splitn(3, " - ").collect()
    } else {
        vec![normalized.as_str()]
    };

    let title = parts.first().map_or("", |p| p.trim());
    if title.is_empty() {
        return None;
    }
    let artist = parts.get(1).map_or("", |p| p.trim());
    let category = parts
        .get(2)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(String::from);

    Some(ParsedLine {
        title: title.to_string(),
        artist: artist.to_string(),
        category,
    })
}

/// Strip a leading bullet (`・`, `-`, `*`, `●`) or numbering (`1.`, `2)`,
/// `3 `) marker.
fn strip_markers(line: &str) -> &str {
    let rest = line
        .strip_prefix(['・', '-', '*', '●'])
        .map_or(line, str::trim_start);

    let digit_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digit_end > 0 && digit_end < rest.len() {
        let tail = &rest[digit_end..];
        let stripped = tail.trim_start_matches(['.', ')']).trim_start();
        // only treat the digits as numbering if a separator followed them
        if stripped.len() < tail.len() {
            return stripped;
        }
    }
    rest
}

/// Parse a whole pasted block, dropping unusable lines.
#[must_use]
pub fn parse_bulk(text: &str) -> Vec<ParsedLine> {
    text.lines().filter_map(parse_line).collect()
}

/// Whether a parsed line refers to an already-cataloged song.
///
/// Titles compare normalized; a line with no artist matches on title alone.
#[must_use]
pub fn find_existing<'a>(line: &ParsedLine, existing: &'a [Song]) -> Option<&'a Song> {
    let title = normalize(&line.title);
    let artist = normalize(&line.artist);
    existing.iter().find(|song| {
        normalize(&song.title) == title && (artist.is_empty() || normalize(&song.artist) == artist)
    })
}

/// Turn parsed lines into actions against a snapshot of the catalog.
///
/// Duplicate detection runs against the catalog as it stood when the batch
/// started: two identical lines in one batch each plan a `Create`, exactly
/// as the sequential-await import behaves against a list captured up front.
#[must_use]
pub fn plan(lines: &[ParsedLine], existing: &[Song]) -> Vec<ImportAction> {
    lines
        .iter()
        .map(|line| {
            find_existing(line, existing).map_or_else(
                || ImportAction::Create(line.clone()),
                |song| ImportAction::MarkSung(song.id.clone()),
            )
        })
        .collect()
}
