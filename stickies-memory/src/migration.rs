//! Database migration utilities
//!
//! Version 1 stored notes and vectors as JSON text. Version 2 stores notes as
//! bincode and vectors as raw little-endian f32.

use crate::error::{NoteError, Result};
use crate::note::Note;
use crate::storage::codec::{decode_legacy_vector, decode_vector, encode_vector, VECTOR_ENCODING_VERSION};
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

/// Database version stored in metadata
pub const DB_VERSION_KEY: &[u8] = b"_db_version";
pub const CURRENT_VERSION: u32 = VECTOR_ENCODING_VERSION;

/// Read the stored version; stores without the key predate versioning
pub fn stored_version(db: &DB) -> Result<u32> {
    match db.get(DB_VERSION_KEY)? {
        Some(bytes) => {
            let version_bytes: [u8; 4] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| NoteError::store("Invalid version format"))?;
            Ok(u32::from_le_bytes(version_bytes))
        }
        None => Ok(1),
    }
}

/// Check if database needs migration and perform if needed
pub fn migrate_if_needed(db_path: impl AsRef<Path>) -> Result<()> {
    let path = db_path.as_ref();

    if !path.join("CURRENT").exists() {
        log::debug!("No existing database found at {}, skipping migration", path.display());
        return Ok(());
    }

    let mut opts = Options::default();
    opts.create_if_missing(false);
    let db = DB::open(&opts, path).map_err(|e| {
        NoteError::invalid_path(format!("Failed to open database for migration: {}", e))
    })?;

    let current_version = stored_version(&db)?;
    log::debug!("Database version: {} (current: {})", current_version, CURRENT_VERSION);

    if current_version > CURRENT_VERSION {
        return Err(NoteError::store(format!(
            "Database version {} is newer than supported version {}",
            current_version, CURRENT_VERSION
        )));
    }

    if current_version < CURRENT_VERSION {
        log::warn!(
            "Database needs migration from v{} to v{}",
            current_version,
            CURRENT_VERSION
        );
        perform_migration(&db, current_version)?;

        db.put(DB_VERSION_KEY, CURRENT_VERSION.to_le_bytes())?;
        db.flush()?;

        log::info!("Migration completed successfully");
    }

    Ok(())
}

fn perform_migration(db: &DB, from_version: u32) -> Result<()> {
    match from_version {
        1 => migrate_v1_to_v2(db),
        _ => Err(NoteError::store(format!("Unknown database version: {}", from_version))),
    }
}

/// Rewrite JSON notes as bincode and JSON vectors as raw f32
fn migrate_v1_to_v2(db: &DB) -> Result<()> {
    log::info!("Migrating database from v1 to v2...");

    let mut batch = WriteBatch::default();
    let mut notes = 0;
    let mut vectors = 0;

    for item in db.iterator(IteratorMode::Start) {
        let (key, value) = item?;
        let key_str = String::from_utf8_lossy(&key);

        if key_str.starts_with("note:") {
            match serde_json::from_slice::<Note>(&value) {
                Ok(note) => {
                    batch.put(&key, bincode::serialize(&note)?);
                    notes += 1;
                }
                Err(json_err) => {
                    // Partially migrated stores may already hold bincode
                    if bincode::deserialize::<Note>(&value).is_err() {
                        log::error!("Failed to read note {}: {}. Skipping.", key_str, json_err);
                    }
                }
            }
        } else if key_str.starts_with("vec:") {
            match decode_legacy_vector(&value) {
                Ok(vector) => {
                    batch.put(&key, encode_vector(&vector));
                    vectors += 1;
                }
                Err(e) => {
                    if decode_vector(&value).is_err() {
                        log::warn!("Failed to read vector {}: {}. Skipping.", key_str, e);
                    }
                }
            }
        }
    }

    log::info!("Migrating {} notes and {} vectors", notes, vectors);
    db.write(batch)?;
    db.flush()?;

    Ok(())
}
