//! Raw SurrealQL used by the crud layer.
//!
//! Two kinds of statements live here and stay deliberately distinct:
//! single-record **atomic transforms** (one `UPDATE` the engine applies as a
//! read-modify-write, retried against the latest value) and **batch
//! mutations** (multi-statement `BEGIN`/`COMMIT` blocks applied atomically as
//! a set).

use crate::db::schemas;

/// The table and index definitions applied on connect.
#[must_use]
pub fn define_tables() -> String {
    let song = schemas::song::TABLE_NAME;
    let request = schemas::request::TABLE_NAME;
    let setlist = schemas::setlist::TABLE_NAME;
    let profile = schemas::profile::TABLE_NAME;
    let settings = schemas::settings::TABLE_NAME;
    format!(
        "DEFINE TABLE OVERWRITE {song} SCHEMALESS;\n\
         DEFINE INDEX OVERWRITE {song}_owner ON {song} FIELDS owner;\n\
         DEFINE TABLE OVERWRITE {request} SCHEMALESS;\n\
         DEFINE INDEX OVERWRITE {request}_owner ON {request} FIELDS owner;\n\
         DEFINE INDEX OVERWRITE {request}_requester ON {request} FIELDS owner, requester_uid;\n\
         DEFINE TABLE OVERWRITE {setlist} SCHEMALESS;\n\
         DEFINE INDEX OVERWRITE {setlist}_owner ON {setlist} FIELDS owner;\n\
         DEFINE TABLE OVERWRITE {profile} SCHEMALESS;\n\
         DEFINE TABLE OVERWRITE {settings} SCHEMALESS;"
    )
}

/// Query to read every record of a table belonging to one owner.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT * FROM song WHERE owner = $owner
/// ```
#[must_use]
#[inline]
pub fn read_all_for_owner(table: &str) -> String {
    format!("SELECT * FROM {table} WHERE owner = $owner")
}

/// Atomic transform: bump the like counter.
///
/// Compiles to:
/// ```sql, ignore
/// UPDATE $song SET likes += 1
/// ```
#[must_use]
#[inline]
pub fn add_like() -> String {
    "UPDATE $song SET likes += 1".to_string()
}

/// Atomic transform: record one performance of the song.
///
/// Compiles to:
/// ```sql, ignore
/// UPDATE $song SET sung_count += 1, last_sung_at = $now
/// ```
#[must_use]
#[inline]
pub fn mark_sung() -> String {
    "UPDATE $song SET sung_count += 1, last_sung_at = $now".to_string()
}

/// Atomic transform: add a tag to the song's tag list if absent.
///
/// Compiles to:
/// ```sql, ignore
/// UPDATE $song SET tags = array::union(tags, [$tag])
/// ```
#[must_use]
#[inline]
pub fn add_tag() -> String {
    "UPDATE $song SET tags = array::union(tags, [$tag])".to_string()
}

/// Atomic transform: remove every occurrence of a tag from the song.
///
/// Compiles to:
/// ```sql, ignore
/// UPDATE $song SET tags -= $tag
/// ```
#[must_use]
#[inline]
pub fn remove_tag() -> String {
    "UPDATE $song SET tags -= $tag".to_string()
}

/// Batch mutation: take every song off the working setlist.
///
/// Compiles to:
/// ```sql, ignore
/// UPDATE song SET is_setlist = false, setlist_order = NONE
///     WHERE owner = $owner AND is_setlist = true
/// ```
#[must_use]
#[inline]
pub fn clear_setlist() -> String {
    format!(
        "UPDATE {} SET is_setlist = false, setlist_order = NONE \
         WHERE owner = $owner AND is_setlist = true",
        schemas::song::TABLE_NAME
    )
}

/// Batch mutation: append the setlist snapshot and update every member song,
/// as one transaction.
///
/// Compiles to:
/// ```sql, ignore
/// BEGIN TRANSACTION;
/// CREATE $log_id SET owner = $owner, date = $now, songs = $songs;
/// UPDATE song SET sung_count += 1, last_sung_at = $now,
///     is_setlist = false, setlist_order = NONE
///     WHERE owner = $owner AND is_setlist = true;
/// COMMIT TRANSACTION;
/// ```
#[must_use]
#[inline]
pub fn finalize_setlist() -> String {
    format!(
        "BEGIN TRANSACTION; \
         CREATE $log_id SET owner = $owner, date = $now, songs = $songs; \
         UPDATE {} SET sung_count += 1, last_sung_at = $now, \
         is_setlist = false, setlist_order = NONE \
         WHERE owner = $owner AND is_setlist = true; \
         COMMIT TRANSACTION;",
        schemas::song::TABLE_NAME
    )
}

/// Batch mutation: overwrite the working setlist flags from a preset.
///
/// Compiles to:
/// ```sql, ignore
/// BEGIN TRANSACTION;
/// UPDATE song SET is_setlist = false, setlist_order = NONE
///     WHERE owner = $owner AND is_setlist = true;
/// UPDATE $ids SET is_setlist = true WHERE owner = $owner;
/// COMMIT TRANSACTION;
/// ```
#[must_use]
#[inline]
pub fn apply_setlist_preset() -> String {
    format!(
        "BEGIN TRANSACTION; \
         UPDATE {table} SET is_setlist = false, setlist_order = NONE \
         WHERE owner = $owner AND is_setlist = true; \
         UPDATE $ids SET is_setlist = true WHERE owner = $owner; \
         COMMIT TRANSACTION;",
        table = schemas::song::TABLE_NAME
    )
}

/// Query to count a requester's pending requests against one owner.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT count() AS count FROM request
///     WHERE owner = $owner AND requester_uid = $uid AND status = 'pending'
///     GROUP ALL
/// ```
#[must_use]
#[inline]
pub fn count_pending_for_requester() -> String {
    format!(
        "SELECT count() AS count FROM {} \
         WHERE owner = $owner AND requester_uid = $uid AND status = 'pending' \
         GROUP ALL",
        schemas::request::TABLE_NAME
    )
}

/// Query to read a requester's not-yet-terminal requests against one owner.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT * FROM request
///     WHERE owner = $owner AND requester_uid = $uid
///     AND status NOT IN ['completed', 'rejected']
/// ```
#[must_use]
#[inline]
pub fn read_active_for_requester() -> String {
    format!(
        "SELECT * FROM {} \
         WHERE owner = $owner AND requester_uid = $uid \
         AND status NOT IN ['completed', 'rejected']",
        schemas::request::TABLE_NAME
    )
}
