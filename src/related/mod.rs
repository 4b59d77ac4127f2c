//! Related-files resolver.
//!
//! Groups co-located files that represent the same capture (RAW+JPEG,
//! Live-Photo HEIC+MOV pairs, AVCHD `.MTS`/`.MOI` clip pairs) and picks one
//! primary per group, by a fixed precedence table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A group of related files sharing one primary.
#[derive(Debug, Clone)]
pub struct RelatedGroup {
    pub primary: PathBuf,
    pub members: Vec<PathBuf>,
}

/// Extensions that are never an alternate-format sibling of a primary media
/// file — generic companion sidecars (telemetry, subtitle, thumbnail)
/// handled entirely by [`crate::companion`]. These never enter a related
/// group even when they share a stem with a media file; `clip.SRT` next to
/// `clip.MP4` is a companion of `clip.MP4`, not a related file grouped
/// alongside it. AVCHD's `.MOI`/`.TOD` clip pair is intentionally excluded
/// from this list: unlike a subtitle or thumbnail, it is itself an
/// alternate-format sibling of the same capture, the same relationship
/// RAW+JPEG and Live-Photo pairs have.
const COMPANION_ONLY_EXTENSIONS: &[&str] = &["thm", "lrv", "xml", "srt", "aae", "xmp"];

/// Whether `ext` is always a standalone companion sidecar, never a member of
/// a related group.
pub fn is_companion_only_extension(ext: &str) -> bool {
    COMPANION_ONLY_EXTENSIONS.contains(&ext)
}

/// Precedence rank for picking a primary within a group; lower wins. Unlisted
/// extensions rank last, in original order.
fn precedence(ext: &str) -> u32 {
    match ext {
        // RAW beats JPEG.
        "cr2" | "cr3" | "nef" | "arw" | "raf" | "dng" | "orf" | "rw2" => 0,
        // Video container beats thumbnail/proxy/telemetry.
        "mov" | "mp4" | "mts" | "m2ts" | "avi" | "mkv" => 1,
        "jpg" | "jpeg" | "heic" | "heif" => 2,
        // Editable document beats sidecar.
        "doc" | "docx" | "odt" | "psd" => 3,
        // AVCHD clip-info pair: the payload clip still beats its sidecar index.
        "moi" | "tod" => 9,
        _ => 5,
    }
}

/// Group `paths` by (parent directory, lowercased stem), matching files that
/// differ only in extension, and pick the highest-precedence member of each
/// group as primary. Paths with a [`is_companion_only_extension`] extension
/// are never folded into another file's group — they always come back as
/// their own singleton group, leaving companion-sidecar resolution to
/// [`crate::companion`].
pub fn resolve_related(paths: &[PathBuf]) -> Vec<RelatedGroup> {
    let mut groups: BTreeMap<(PathBuf, String), Vec<PathBuf>> = BTreeMap::new();
    let mut out = Vec::new();

    for path in paths {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if is_companion_only_extension(&ext) {
            out.push(RelatedGroup {
                primary: path.clone(),
                members: vec![path.clone()],
            });
            continue;
        }
        let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        groups.entry((parent, stem)).or_default().push(path.clone());
    }

    for (_, mut members) in groups {
        members.sort();
        let primary = members
            .iter()
            .min_by_key(|p| {
                let ext = p
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                precedence(&ext)
            })
            .cloned()
            .unwrap_or_else(|| members[0].clone());
        out.push(RelatedGroup { primary, members });
    }
    out.sort_by(|a, b| a.primary.cmp(&b.primary));
    out
}

#[cfg(test)]
mod tests;
