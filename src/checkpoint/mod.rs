//! Session checkpoint store.
//!
//! A single JSON file at the destination root (`.wnb-import-session.json`)
//! holding the live [`Session`], rewritten periodically and deleted on clean
//! completion. Resume reads this file and restores the session.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};
use crate::model::Session;

pub const CHECKPOINT_FILENAME: &str = ".wnb-import-session.json";

/// Schema version embedded alongside the session so a future incompatible
/// format can refuse to resume rather than silently misinterpret old state.
const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

#[derive(serde::Serialize, serde::Deserialize)]
struct CheckpointFile {
    schema_version: u32,
    session: Session,
}

pub fn checkpoint_path(destination: &Path) -> PathBuf {
    destination.join(CHECKPOINT_FILENAME)
}

/// Periodicity triggers for checkpoint writes, applied by the pipeline driver.
pub struct CheckpointPolicy {
    pub every_hashed: u64,
    pub every_copied: u64,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            every_hashed: 100,
            every_copied: 50,
        }
    }
}

/// Overwrite the checkpoint file with the current session state.
pub fn write(session: &Session) -> Result<()> {
    let path = checkpoint_path(&session.destination);
    let file = CheckpointFile {
        schema_version: CHECKPOINT_SCHEMA_VERSION,
        session: session.clone(),
    };
    let json = serde_json::to_vec_pretty(&file).map_err(|e| IngestError::Other(e.to_string()))?;

    // Write-then-rename: a reader never observes a half-written checkpoint.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|source| IngestError::CheckpointWrite {
        path: path.clone(),
        source,
    })?;
    std::fs::rename(&tmp, &path).map_err(|source| IngestError::CheckpointWrite {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Read the checkpoint at `destination`, if one exists.
pub fn read(destination: &Path) -> Result<Option<Session>> {
    let path = checkpoint_path(destination);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|source| IngestError::Read {
        path: path.clone(),
        source,
    })?;
    let file: CheckpointFile =
        serde_json::from_str(&content).map_err(|e| IngestError::SchemaValidation {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    if file.schema_version > CHECKPOINT_SCHEMA_VERSION {
        return Err(IngestError::SchemaValidation {
            path,
            reason: format!(
                "checkpoint schema version {} is newer than supported {}",
                file.schema_version, CHECKPOINT_SCHEMA_VERSION
            ),
        });
    }
    Ok(Some(file.session))
}

/// Remove the checkpoint after a clean completion.
pub fn clear(destination: &Path) -> Result<()> {
    let path = checkpoint_path(destination);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(IngestError::Write { path, source }),
    }
}
