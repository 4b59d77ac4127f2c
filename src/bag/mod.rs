//! RFC 8493 ("BagIt") package emitter and verifier.
//!
//! ```text
//! <bag>/
//!   bagit.txt
//!   bag-info.txt        (includes Payload-Oxum)
//!   manifest-<alg>.txt
//!   tagmanifest-<alg>.txt
//!   data/
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};
use crate::model::HashAlgorithm;

const BAGIT_DECLARATION: &str = "BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n";

/// How the bag's payload directory is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagMode {
    /// Move the contents of the source directory under `data/` in place.
    InPlace,
    /// Copy every file into a freshly created bag tree elsewhere.
    CopyOut,
}

/// Summary returned after creating a bag.
#[derive(Debug, Clone)]
pub struct BagInfo {
    pub payload_bytes: u64,
    pub payload_count: u64,
    pub algorithm: HashAlgorithm,
}

/// Result of comparing a bag's recorded manifest against its actual payload.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub valid: bool,
    pub verified_files: u64,
    pub missing: Vec<String>,
    pub invalid: Vec<Invalid>,
    pub extra: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Invalid {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

/// The manifest/tagmanifest filename tag for `alg`. This must always match
/// the algorithm the digests in that file were actually computed with —
/// `HashAlgorithm::name()` is a 1:1 mapping, so the tag and the digest
/// algorithm can never drift apart.
fn algorithm_tag(alg: HashAlgorithm) -> &'static str {
    alg.name()
}

/// Create a bag at `bag_dir`. In [`BagMode::InPlace`], `source` IS `bag_dir`
/// and its current contents are moved under `data/`; in [`BagMode::CopyOut`],
/// `source` is copied into a new tree rooted at `bag_dir`.
pub fn create_bag(source: &Path, bag_dir: &Path, algorithm: HashAlgorithm, mode: BagMode) -> Result<BagInfo> {
    let data_dir = bag_dir.join("data");

    match mode {
        BagMode::InPlace => {
            std::fs::create_dir_all(&data_dir).map_err(|source| IngestError::Write {
                path: data_dir.clone(),
                source,
            })?;
            for entry in walk_files(source)? {
                if entry.starts_with(&data_dir) || entry == bag_dir.join("bagit.txt") {
                    continue;
                }
                let rel = entry.strip_prefix(source).unwrap_or(&entry);
                let dest = data_dir.join(rel);
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| IngestError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::rename(&entry, &dest).map_err(|source| IngestError::Rename {
                    from: entry.clone(),
                    to: dest.clone(),
                    source,
                })?;
            }
        }
        BagMode::CopyOut => {
            for entry in walk_files(source)? {
                let rel = entry.strip_prefix(source).unwrap_or(&entry);
                let dest = data_dir.join(rel);
                crate::copier::copy(
                    &entry,
                    &dest,
                    &crate::copier::CopyOptions {
                        algorithm: HashAlgorithm::Blake3,
                        verify: true,
                        overwrite: true,
                        ..Default::default()
                    },
                )?;
            }
        }
    }

    write_tag_files(bag_dir, &data_dir, algorithm)
}

fn write_tag_files(bag_dir: &Path, data_dir: &Path, algorithm: HashAlgorithm) -> Result<BagInfo> {
    let tag = algorithm_tag(algorithm);
    let payload_files = walk_files(data_dir)?;

    let mut manifest_lines = Vec::new();
    let mut payload_bytes: u64 = 0;
    for file in &payload_files {
        let rel = file.strip_prefix(data_dir).unwrap_or(file);
        let rel_str = format!("data/{}", rel.to_string_lossy().replace('\\', "/"));
        let hash = crate::hasher::hash_file(algorithm, file)?;
        let size = std::fs::metadata(file)
            .map_err(|source| IngestError::Stat {
                path: file.clone(),
                source,
            })?
            .len();
        payload_bytes += size;
        manifest_lines.push((rel_str, hash));
    }
    manifest_lines.sort();

    let bagit_path = bag_dir.join("bagit.txt");
    write_file(&bagit_path, BAGIT_DECLARATION.as_bytes())?;

    let bag_info_path = bag_dir.join("bag-info.txt");
    let payload_oxum = format!("{}.{}", payload_bytes, payload_files.len());
    let bag_size = human_size(payload_bytes);
    let bag_info = format!(
        "Payload-Oxum: {payload_oxum}\nBag-Size: {bag_size}\nBagging-Date: {date}\n",
        date = crate::common::env::now().format("%Y-%m-%d")
    );
    write_file(&bag_info_path, bag_info.as_bytes())?;

    let manifest_path = bag_dir.join(format!("manifest-{tag}.txt"));
    let manifest_content = manifest_lines
        .iter()
        .map(|(path, hash)| format!("{hash}  {path}\n"))
        .collect::<String>();
    write_file(&manifest_path, manifest_content.as_bytes())?;

    // Tagmanifest covers the three tag files written so far, in the same
    // algorithm, computed from what's now on disk.
    let mut tag_lines = Vec::new();
    for tag_file in [&bagit_path, &bag_info_path, &manifest_path] {
        let hash = crate::hasher::hash_file(algorithm, tag_file)?;
        let name = tag_file.file_name().unwrap().to_string_lossy().into_owned();
        tag_lines.push((name, hash));
    }
    tag_lines.sort();
    let tagmanifest_path = bag_dir.join(format!("tagmanifest-{tag}.txt"));
    let tagmanifest_content = tag_lines
        .iter()
        .map(|(name, hash)| format!("{hash}  {name}\n"))
        .collect::<String>();
    write_file(&tagmanifest_path, tagmanifest_content.as_bytes())?;

    Ok(BagInfo {
        payload_bytes,
        payload_count: payload_files.len() as u64,
        algorithm,
    })
}

/// Recompute both manifests from the bag's current contents and diff against
/// the recorded values, separating corruption (invalid) from tampering
/// (missing/extra).
pub fn verify_bag(bag_dir: &Path, algorithm: HashAlgorithm) -> Result<VerifyReport> {
    let tag = algorithm_tag(algorithm);
    let manifest_path = bag_dir.join(format!("manifest-{tag}.txt"));
    let recorded = parse_manifest(&manifest_path)?;

    let data_dir = bag_dir.join("data");
    let actual_files = walk_files(&data_dir)?;
    let mut actual: BTreeMap<String, PathBuf> = BTreeMap::new();
    for f in actual_files {
        let rel = f.strip_prefix(&data_dir).unwrap_or(&f);
        let key = format!("data/{}", rel.to_string_lossy().replace('\\', "/"));
        actual.insert(key, f);
    }

    let mut report = VerifyReport::default();
    for (path, expected_hash) in &recorded {
        match actual.get(path) {
            Some(file) => {
                let computed = crate::hasher::hash_file(algorithm, file)?;
                if computed.eq_ignore_ascii_case(expected_hash) {
                    report.verified_files += 1;
                } else {
                    report.invalid.push(Invalid {
                        path: path.clone(),
                        expected: expected_hash.clone(),
                        actual: computed,
                    });
                }
            }
            None => report.missing.push(path.clone()),
        }
    }
    for path in actual.keys() {
        if !recorded.iter().any(|(p, _)| p == path) {
            report.extra.push(path.clone());
        }
    }

    let oxum_ok = verify_payload_oxum(bag_dir, &actual)?;

    report.valid = report.missing.is_empty() && report.invalid.is_empty() && report.extra.is_empty() && oxum_ok;
    Ok(report)
}

fn verify_payload_oxum(bag_dir: &Path, actual: &BTreeMap<String, PathBuf>) -> Result<bool> {
    let bag_info_path = bag_dir.join("bag-info.txt");
    let content = std::fs::read_to_string(&bag_info_path).map_err(|source| IngestError::Read {
        path: bag_info_path.clone(),
        source,
    })?;
    let recorded_oxum = content
        .lines()
        .find_map(|l| l.strip_prefix("Payload-Oxum: "))
        .map(|s| s.trim().to_string());

    let total_bytes: u64 = actual
        .values()
        .map(|f| std::fs::metadata(f).map(|m| m.len()).unwrap_or(0))
        .sum();
    let actual_oxum = format!("{}.{}", total_bytes, actual.len());

    Ok(recorded_oxum.as_deref() == Some(actual_oxum.as_str()))
}

fn parse_manifest(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .filter_map(|line| {
            let idx = line.find("  ")?;
            let hash = &line[..idx];
            let path = &line[idx + 2..];
            Some((path.to_string(), hash.to_string()))
        })
        .collect())
}

fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|source| IngestError::Read {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| IngestError::Read {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| IngestError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| IngestError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests;
