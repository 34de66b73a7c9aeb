//! This module contains functions for:
//! - exporting the catalog to .csv (UTF-8 with BOM, for spreadsheet apps)
//! - exporting the whole scope to a .json backup
//! - importing songs back from .csv with the bulk-import merge semantics

use csv::{Reader, ReaderBuilder, Writer};
use surrealdb::{Connection, Surreal};
use tracing::instrument;

use songboard_core::{
    errors::{BackupError, SerializableError},
    import::{ImportReport, ParsedLine},
    state::CatalogFull,
};
use songboard_storage::db::schemas::song::Song;

use super::catalog::import_lines;

/// Byte-order mark prepended to CSV exports so spreadsheet apps pick the
/// right encoding.
pub const UTF8_BOM: &str = "\u{feff}";

const CSV_HEADERS: [&str; 10] = [
    "title",
    "artist",
    "category",
    "tags",
    "key",
    "reading",
    "memo",
    "likes",
    "sung_count",
    "last_sung_at",
];

/// Serialize the owner's songs as CSV with the given writer.
pub(crate) fn write_songs_csv<W: std::io::Write>(
    songs: &[Song],
    mut writer: Writer<W>,
) -> Result<(), BackupError> {
    writer.write_record(CSV_HEADERS)?;
    for song in songs {
        writer.write_record(&[
            song.title.clone(),
            song.artist.clone(),
            song.category.clone(),
            song.tags.join(" "),
            song.key.clone(),
            song.reading.clone(),
            song.memo.clone(),
            song.likes.to_string(),
            song.sung_count.to_string(),
            song.last_sung_at.map_or_else(String::new, |at| at.to_string()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse song rows out of a CSV backup.
///
/// Only the `title`/`artist`/`category` columns matter for re-import; rows
/// without a title drop silently, like the bulk parser's lines.
pub(crate) fn read_songs_csv<R: std::io::Read>(
    mut reader: Reader<R>,
) -> Result<Vec<ParsedLine>, BackupError> {
    let mut lines = Vec::new();
    for result in reader.records() {
        let record = result?;
        let title = record.get(0).unwrap_or_default().trim();
        if title.is_empty() {
            continue;
        }
        lines.push(ParsedLine {
            title: title.to_string(),
            artist: record.get(1).unwrap_or_default().trim().to_string(),
            category: record
                .get(2)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        });
    }
    Ok(lines)
}

/// The owner's catalog as a CSV string, BOM included.
#[instrument(skip(db))]
pub async fn export_csv<C: Connection>(db: &Surreal<C>, owner: &str) -> Result<String, BackupError> {
    let songs = Song::read_all(db, owner).await?;
    let mut buffer = Vec::new();
    write_songs_csv(&songs, Writer::from_writer(&mut buffer))?;
    let csv = String::from_utf8(buffer).map_err(|_| BackupError::NotUtf8)?;
    Ok(format!("{UTF8_BOM}{csv}"))
}

/// The owner's whole scope as a pretty-printed JSON backup.
#[instrument(skip(db))]
pub async fn export_json<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<String, BackupError> {
    let catalog = CatalogFull::load(db, owner).await?;
    Ok(serde_json::to_string_pretty(&catalog)?)
}

/// Import songs from CSV text, with the same duplicate-merge semantics as
/// the bulk path.
#[instrument(skip(db, text))]
pub async fn import_csv<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    text: &str,
) -> Result<ImportReport, SerializableError> {
    let body = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());
    let lines = read_songs_csv(reader).map_err(SerializableError::from)?;
    import_lines(db, owner, &lines).await
}
