//! The owner-side catalog service: song creation with settings-aware
//! defaults, setlist workflow, presets, and import execution.

use log::info;
use surrealdb::{Connection, Surreal};
use tracing::instrument;

use songboard_core::{
    errors::SerializableError,
    import::{ImportAction, ImportReport, ParsedLine, parse_bulk, plan},
};
use songboard_storage::{
    db::schemas::{
        setlist::SetlistLog,
        settings::{SetlistPreset, Settings},
        song::{Song, SongChangeSet, SongDraft, SongId},
    },
    util::unix_millis,
};

/// Create a song from an owner-supplied draft. An empty category falls back
/// to the owner's first configured category.
#[instrument(skip(db))]
pub async fn create_song<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    mut draft: SongDraft,
) -> Result<Song, SerializableError> {
    if draft.category.is_empty() {
        draft.category = default_category(db, owner).await?;
    }
    let song = Song::from_draft(owner, draft, unix_millis());
    Song::create(db, song)
        .await?
        .ok_or(SerializableError::NotFound)
}

async fn default_category<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<String, SerializableError> {
    Ok(Settings::read(db, owner)
        .await?
        .categories
        .first()
        .cloned()
        .unwrap_or_else(|| "Other".to_string()))
}

/// Flip one song's working-setlist flag.
#[instrument(skip(db))]
pub async fn setlist_toggle<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    id: SongId,
    on: bool,
) -> Result<Song, SerializableError> {
    Song::read(db, id.clone())
        .await?
        .filter(|song| song.owner == owner)
        .ok_or(SerializableError::NotFound)?;

    let changes = SongChangeSet {
        is_setlist: Some(on),
        // coming off the setlist also clears the slot in the running order
        setlist_order: if on { None } else { Some(None) },
        ..SongChangeSet::default()
    };
    Song::update(db, id, changes)
        .await?
        .ok_or(SerializableError::NotFound)
}

/// Finalize the working setlist into a history snapshot.
#[instrument(skip(db))]
pub async fn setlist_finalize<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
) -> Result<Option<SetlistLog>, SerializableError> {
    let log = SetlistLog::finalize(db, owner, unix_millis()).await?;
    if let Some(log) = &log {
        info!("finalized a setlist of {} songs for {owner}", log.songs.len());
    }
    Ok(log)
}

/// Save the current working setlist as a named preset (replacing a preset of
/// the same name).
#[instrument(skip(db))]
pub async fn preset_save<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    name: &str,
) -> Result<Settings, SerializableError> {
    let song_ids: Vec<SongId> = Song::read_all(db, owner)
        .await?
        .into_iter()
        .filter(|song| song.is_setlist)
        .map(|song| song.id)
        .collect();

    let mut settings = Settings::read(db, owner).await?;
    settings.setlist_presets.retain(|p| p.name != name);
    settings.setlist_presets.push(SetlistPreset {
        name: name.to_string(),
        song_ids,
    });
    Ok(Settings::write(db, owner, settings).await?)
}

/// Overwrite the working setlist flags from a named preset.
#[instrument(skip(db))]
pub async fn preset_load<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    name: &str,
) -> Result<(), SerializableError> {
    let settings = Settings::read(db, owner).await?;
    let preset = settings
        .setlist_preset(name)
        .ok_or(SerializableError::NotFound)?;
    Song::apply_setlist(db, owner, preset.song_ids.clone()).await?;
    Ok(())
}

/// Delete a named preset.
#[instrument(skip(db))]
pub async fn preset_delete<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    name: &str,
) -> Result<Settings, SerializableError> {
    let mut settings = Settings::read(db, owner).await?;
    let before = settings.setlist_presets.len();
    settings.setlist_presets.retain(|p| p.name != name);
    if settings.setlist_presets.len() == before {
        return Err(SerializableError::NotFound);
    }
    Ok(Settings::write(db, owner, settings).await?)
}

/// Run a bulk import of freeform pasted text.
#[instrument(skip(db, text))]
pub async fn import_bulk<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    text: &str,
) -> Result<ImportReport, SerializableError> {
    import_lines(db, owner, &parse_bulk(text)).await
}

/// Execute parsed import lines sequentially, awaiting each write.
///
/// The duplicate-detection list is captured once, up front: lines that
/// duplicate each other inside one batch are each treated as new. See
/// DESIGN.md for why this is kept rather than fixed.
#[instrument(skip(db, lines))]
pub async fn import_lines<C: Connection>(
    db: &Surreal<C>,
    owner: &str,
    lines: &[ParsedLine],
) -> Result<ImportReport, SerializableError> {
    let existing = Song::read_all(db, owner).await?;
    let actions = plan(lines, &existing);
    let fallback_category = default_category(db, owner).await?;

    let mut report = ImportReport::default();
    for action in actions {
        let now = unix_millis();
        match action {
            ImportAction::Create(line) => {
                let draft = SongDraft {
                    title: line.title,
                    artist: line.artist,
                    category: line.category.unwrap_or_else(|| fallback_category.clone()),
                    ..SongDraft::default()
                };
                let mut song = Song::from_draft(owner, draft, now);
                // an imported line is a song that was actually performed
                song.sung_count = 1;
                song.last_sung_at = Some(now);
                Song::create(db, song).await?;
                report.added += 1;
            }
            ImportAction::MarkSung(id) => {
                Song::mark_sung(db, id, now).await?;
                report.updated += 1;
            }
        }
    }

    info!(
        "import for {owner}: {} added, {} updated",
        report.added, report.updated
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use songboard_storage::db::init_test_database;
    use songboard_storage::test_utils::{song_case, ulid};

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_create_song_fills_default_category(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = create_song(
            &db,
            "owner-1",
            SongDraft {
                title: format!("Song {ulid}"),
                artist: "Artist".to_string(),
                ..SongDraft::default()
            },
        )
        .await
        .unwrap();

        // first of the stock categories
        assert_eq!(song.category, "J-POP");
        assert_eq!(song.sung_count, 0);
        assert_eq!(song.likes, 0);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_setlist_toggle_round_trip_leaves_counters_alone(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-1", &ulid);
        Song::create(&db, song.clone()).await?;

        let on = setlist_toggle(&db, "owner-1", song.id.clone(), true)
            .await
            .unwrap();
        assert!(on.is_setlist);

        let off = setlist_toggle(&db, "owner-1", song.id.clone(), false)
            .await
            .unwrap();
        assert!(!off.is_setlist);
        assert_eq!(off.sung_count, 0);
        assert_eq!(off.last_sung_at, None);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_setlist_toggle_rejects_foreign_songs(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let song = song_case("owner-2", &ulid);
        Song::create(&db, song.clone()).await?;

        let result = setlist_toggle(&db, "owner-1", song.id, true).await;
        assert_eq!(result.unwrap_err(), SerializableError::NotFound);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_import_creates_and_merges(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut known = song_case("owner-1", &ulid);
        known.title = "Marigold".to_string();
        known.artist = "Aimyon".to_string();
        Song::create(&db, known.clone()).await?;

        let report = import_bulk(
            &db,
            "owner-1",
            "Marigold, Aimyon\nKaiju no Hanauta, Vaundy, Rock\n\n",
        )
        .await
        .unwrap();
        assert_eq!(report, ImportReport { added: 1, updated: 1 });

        let songs = Song::read_all(&db, "owner-1").await?;
        assert_eq!(songs.len(), 2);

        let merged = songs.iter().find(|s| s.title == "Marigold").unwrap();
        assert_eq!(merged.sung_count, 1);
        assert!(merged.last_sung_at.is_some());

        let created = songs.iter().find(|s| s.title == "Kaiju no Hanauta").unwrap();
        assert_eq!(created.category, "Rock");
        assert_eq!(created.sung_count, 1);
        assert_eq!(created.likes, 0);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_import_keeps_sung_count_monotonic(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut known = song_case("owner-1", &ulid);
        known.title = "Marigold".to_string();
        known.artist = "Aimyon".to_string();
        known.sung_count = 4;
        Song::create(&db, known.clone()).await?;

        import_bulk(&db, "owner-1", "Marigold / Aimyon").await.unwrap();
        let song = Song::read(&db, known.id).await?.unwrap();
        assert_eq!(song.sung_count, 5);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_duplicate_lines_in_one_batch_create_two_songs(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let _ = ulid;

        // detection ran against the catalog captured at batch start (empty),
        // so the repeated line lands twice instead of merging into one song
        // with sung_count = 2
        let report = import_bulk(&db, "owner-1", "Song A, Artist X\nSong A, Artist X")
            .await
            .unwrap();
        assert_eq!(report, ImportReport { added: 2, updated: 0 });

        let songs = Song::read_all(&db, "owner-1").await?;
        assert_eq!(songs.len(), 2);
        assert!(songs.iter().all(|s| s.sung_count == 1));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_presets_save_load_delete(ulid: String) -> Result<()> {
        let db = init_test_database().await?;
        let mut flagged = song_case("owner-1", &format!("{ulid}-a"));
        flagged.is_setlist = true;
        let other = song_case("owner-1", &format!("{ulid}-b"));
        Song::create(&db, flagged.clone()).await?;
        Song::create(&db, other.clone()).await?;

        let settings = preset_save(&db, "owner-1", "friday set").await.unwrap();
        assert_eq!(settings.setlist_presets.len(), 1);
        assert_eq!(settings.setlist_presets[0].song_ids, vec![flagged.id.clone()]);

        // move the working setlist somewhere else, then load the preset back
        setlist_toggle(&db, "owner-1", flagged.id.clone(), false).await?;
        setlist_toggle(&db, "owner-1", other.id.clone(), true).await?;
        preset_load(&db, "owner-1", "friday set").await.unwrap();

        assert!(Song::read(&db, flagged.id).await?.unwrap().is_setlist);
        assert!(!Song::read(&db, other.id).await?.unwrap().is_setlist);

        let settings = preset_delete(&db, "owner-1", "friday set").await.unwrap();
        assert!(settings.setlist_presets.is_empty());
        assert_eq!(
            preset_load(&db, "owner-1", "friday set").await.unwrap_err(),
            SerializableError::NotFound
        );
        Ok(())
    }
}
