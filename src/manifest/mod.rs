//! Directory manifest emitter.
//!
//! One JSON document per destination tree, enumerating every preserved file
//! with its hash, size, and mtime, sorted by path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub hash: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub generated: DateTime<Utc>,
    pub algorithm: String,
    pub hash_length: u32,
    pub root: PathBuf,
    pub file_count: u64,
    pub total_bytes: u64,
    pub files: Vec<ManifestEntry>,
}

/// A single ingested file feeding the manifest, decoupled from [`crate::model::FileState`]
/// so the manifest emitter does not depend on pipeline-internal status.
pub struct ManifestInput {
    pub relative_path: PathBuf,
    pub hash: String,
    pub size: u64,
    pub mtime: Option<DateTime<Utc>>,
}

/// Build a manifest from the given inputs. `hash_length` should be 16 when
/// entries carry a truncated BLAKE3 short hash, 64 for the full digest.
pub fn build(root: &Path, inputs: &[ManifestInput], hash_length: u32, generated: DateTime<Utc>) -> Manifest {
    let mut files: Vec<ManifestEntry> = inputs
        .iter()
        .map(|i| ManifestEntry {
            path: i.relative_path.to_string_lossy().replace('\\', "/"),
            hash: i.hash.clone(),
            size: i.size,
            mtime: i.mtime,
        })
        .collect();
    files.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));

    let total_bytes = files.iter().map(|f| f.size).sum();
    Manifest {
        version: 1,
        generated,
        algorithm: "blake3".to_string(),
        hash_length,
        root: root.to_path_buf(),
        file_count: files.len() as u64,
        total_bytes,
        files,
    }
}

pub fn write(manifest: &Manifest, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(manifest).map_err(|e| IngestError::Other(e.to_string()))?;
    std::fs::write(path, json).map_err(|source| IngestError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| IngestError::Other(e.to_string()))
}

#[cfg(test)]
mod tests;
