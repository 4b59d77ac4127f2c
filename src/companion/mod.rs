//! Companion-sidecar resolver.
//!
//! For a primary media file, finds co-located companion files (telemetry,
//! proxy video, thumbnails) that must be preserved alongside it. A batch run
//! over K files across D directories costs D `readdir` calls total: each
//! directory's listing is cached the first time it is needed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64_simd::STANDARD;

use crate::model::CopiedCompanion;

/// Maximum size, in bytes, for a companion's content to be inlined as base64
/// into the primary's record rather than merely referenced.
const EMBED_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// Extensions that are never embedded even under the size limit: binary
/// proxies whose bulk adds no forensic value to the record.
const EMBED_DENYLIST: &[&str] = &["lrv", "mov", "mp4", "thm"];

/// Caches one `readdir` per directory so repeated lookups across a batch of
/// primaries in the same directory do not re-list it.
#[derive(Default)]
pub struct CompanionResolver {
    dir_cache: HashMap<PathBuf, Vec<PathBuf>>,
}

/// A discovered companion, independent of whether it will be embedded.
#[derive(Debug, Clone)]
pub struct Companion {
    pub path: PathBuf,
    pub extension: String,
    pub size: u64,
}

impl CompanionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find companions for `primary`, matching by stem (case-insensitive) and
    /// a small set of manufacturer-style suffix patterns (e.g. `X.MP4` pairs
    /// with `XM01.XML`).
    pub fn find(&mut self, primary: &Path) -> Vec<Companion> {
        let dir = primary.parent().unwrap_or(Path::new(".")).to_path_buf();
        let listing = self.listing(&dir);

        let stem = primary
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let primary_ext = primary
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        listing
            .iter()
            .filter(|p| p.as_path() != primary)
            .filter_map(|p| {
                let candidate_stem = p
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                let matches = candidate_stem == stem
                    || (candidate_stem.starts_with(&stem) && candidate_stem.len() <= stem.len() + 4);
                if !matches {
                    return None;
                }
                let ext = p
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                if ext == primary_ext {
                    return None;
                }
                let size = std::fs::metadata(p).map(|m| m.len()).unwrap_or(0);
                Some(Companion {
                    path: p.clone(),
                    extension: ext,
                    size,
                })
            })
            .collect()
    }

    fn listing(&mut self, dir: &Path) -> &[PathBuf] {
        self.dir_cache.entry(dir.to_path_buf()).or_insert_with(|| {
            std::fs::read_dir(dir)
                .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
                .unwrap_or_default()
        })
    }
}

/// Whether a companion's content should be base64-inlined into the primary's
/// record: small enough and not a binary proxy format.
pub fn should_embed(companion: &Companion) -> bool {
    companion.size <= EMBED_SIZE_LIMIT && !EMBED_DENYLIST.contains(&companion.extension.as_str())
}

/// Build the record entry for a companion that has already been copied to
/// `dest_path`, inlining its content when [`should_embed`] allows it.
pub fn to_copied_companion(
    companion: &Companion,
    dest_path: PathBuf,
    hash: String,
) -> std::io::Result<CopiedCompanion> {
    let content_base64 = if should_embed(companion) {
        let bytes = std::fs::read(&companion.path)?;
        Some(STANDARD.encode_to_string(&bytes))
    } else {
        None
    };
    Ok(CopiedCompanion {
        source_path: companion.path.clone(),
        dest_path,
        extension: companion.extension.clone(),
        hash,
        size: companion.size,
        content_base64,
    })
}

#[cfg(test)]
mod tests;
