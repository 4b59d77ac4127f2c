//! Deterministic directory scanner.
//!
//! Produces a lexicographically sorted sequence of regular files reachable
//! from a root, skipping OS metadata artifacts and symlinks, honoring
//! caller-supplied include/exclude globs.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{IngestError, Result};

/// Names the scanner always skips regardless of glob options — OS metadata
/// artifacts that have no archival value and would otherwise pollute every
/// manifest.
const SKIP_NAMES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    ".Spotlight-V100",
    ".Trashes",
    ".fseventsd",
];

/// Scan options controlling traversal.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub skip_hidden: bool,
}

/// A single scanned entry.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
}

/// Walk `root` depth-first, sorting entries within each directory before
/// recursing, so the overall output order is deterministic across platforms
/// and filesystem iteration orders.
pub fn scan(root: &Path, opts: &ScanOptions) -> Result<Vec<ScannedFile>> {
    let include: Vec<Pattern> = opts
        .include
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();
    let exclude: Vec<Pattern> = opts
        .exclude
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut out = Vec::new();
    walk(root, root, opts, &include, &exclude, &mut out)?;
    out.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(out)
}

fn walk(
    root: &Path,
    dir: &Path,
    opts: &ScanOptions,
    include: &[Pattern],
    exclude: &[Pattern],
    out: &mut Vec<ScannedFile>,
) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| IngestError::Read {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if SKIP_NAMES.contains(&name.as_str()) {
            continue;
        }
        if opts.skip_hidden && name.starts_with('.') {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        // Never follow symlinks: a symlink to a regular file is skipped
        // rather than dereferenced, so the scanner output reflects only
        // content this process actually owns a copy of.
        if file_type.is_symlink() {
            continue;
        }

        if file_type.is_dir() {
            walk(root, &path, opts, include, exclude, out)?;
            continue;
        }

        if !file_type.is_file() {
            continue;
        }

        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let rel_str = relative_path.to_string_lossy();

        if !include.is_empty() && !include.iter().any(|p| p.matches(&rel_str)) {
            continue;
        }
        if exclude.iter().any(|p| p.matches(&rel_str)) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        out.push(ScannedFile {
            path,
            relative_path,
            size,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests;
