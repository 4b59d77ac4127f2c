//! File-type classifier: magic-byte detection with extension fallback.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::model::FileCategory;

/// Classification result for a single file.
#[derive(Debug, Clone)]
pub struct Classification {
    pub category: FileCategory,
    pub mime_type: String,
    pub detected_extension: Option<String>,
    pub declared_extension: Option<String>,
    pub extension_mismatch: bool,
}

/// Magic-byte signature table: (offset, bytes, category, mime, extension).
const MAGIC_TABLE: &[(usize, &[u8], FileCategory, &str, &str)] = &[
    (0, b"\xFF\xD8\xFF", FileCategory::Image, "image/jpeg", "jpg"),
    (0, b"\x89PNG\r\n\x1a\n", FileCategory::Image, "image/png", "png"),
    (0, b"GIF87a", FileCategory::Image, "image/gif", "gif"),
    (0, b"GIF89a", FileCategory::Image, "image/gif", "gif"),
    (0, b"BM", FileCategory::Image, "image/bmp", "bmp"),
    (0, b"II*\0", FileCategory::Image, "image/tiff", "tif"),
    (0, b"MM\0*", FileCategory::Image, "image/tiff", "tif"),
    (4, b"ftypqt", FileCategory::Video, "video/quicktime", "mov"),
    (4, b"ftypisom", FileCategory::Video, "video/mp4", "mp4"),
    (4, b"ftypmp42", FileCategory::Video, "video/mp4", "mp4"),
    (0, b"\x1aE\xdf\xa3", FileCategory::Video, "video/x-matroska", "mkv"),
    (0, b"RIFF", FileCategory::Video, "video/avi", "avi"),
    (0, b"fLaC", FileCategory::Audio, "audio/flac", "flac"),
    (0, b"ID3", FileCategory::Audio, "audio/mpeg", "mp3"),
    (0, b"%PDF-", FileCategory::Document, "application/pdf", "pdf"),
    (0, b"PK\x03\x04", FileCategory::Archive, "application/zip", "zip"),
    (0, b"Rar!\x1a\x07", FileCategory::Archive, "application/x-rar", "rar"),
    (0, b"\x1f\x8b", FileCategory::Archive, "application/gzip", "gz"),
    (0, b"7z\xbc\xaf\x27\x1c", FileCategory::Archive, "application/x-7z-compressed", "7z"),
    (0, b"\x7fELF", FileCategory::Executable, "application/x-elf", ""),
    (0, b"MZ", FileCategory::Executable, "application/x-msdownload", "exe"),
];

/// Extensions classified purely by name — sidecar/companion formats whose
/// content has no stable magic bytes worth matching on.
const EXTENSION_ONLY: &[(&str, FileCategory, &str)] = &[
    ("xmp", FileCategory::Sidecar, "application/rdf+xml"),
    ("aae", FileCategory::Sidecar, "application/xml"),
    ("srt", FileCategory::Sidecar, "application/x-subrip"),
    ("thm", FileCategory::Sidecar, "image/jpeg"),
    ("lrv", FileCategory::Sidecar, "video/mp4"),
    ("epub", FileCategory::Ebook, "application/epub+zip"),
    ("mobi", FileCategory::Ebook, "application/x-mobipocket-ebook"),
];

const MAGIC_READ_LEN: usize = 32;

/// Classify a file by reading its leading bytes, falling back to its
/// extension when no magic signature matches.
pub fn classify(path: &Path) -> Result<Classification> {
    let declared_extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    let mut header = [0u8; MAGIC_READ_LEN];
    let read_len = {
        let mut file = File::open(path).map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        read_header(&mut file, &mut header, path)?
    };
    let bytes = &header[..read_len];

    if let Some((category, mime, detected_extension)) = match_magic(bytes) {
        let extension_mismatch = match (&declared_extension, &detected_extension) {
            (Some(d), Some(e)) if !e.is_empty() => d != e,
            _ => false,
        };
        return Ok(Classification {
            category,
            mime_type: mime.to_string(),
            detected_extension,
            declared_extension,
            extension_mismatch,
        });
    }

    if let Some(ext) = &declared_extension {
        if let Some((_, category, mime)) = EXTENSION_ONLY.iter().find(|(e, _, _)| e == ext) {
            return Ok(Classification {
                category: *category,
                mime_type: mime.to_string(),
                detected_extension: Some(ext.clone()),
                declared_extension: declared_extension.clone(),
                extension_mismatch: false,
            });
        }
    }

    Ok(Classification {
        category: FileCategory::Other,
        mime_type: "application/octet-stream".to_string(),
        detected_extension: None,
        declared_extension,
        extension_mismatch: false,
    })
}

fn match_magic(bytes: &[u8]) -> Option<(FileCategory, &'static str, Option<String>)> {
    for (offset, signature, category, mime, ext) in MAGIC_TABLE {
        if bytes.len() >= offset + signature.len() && &bytes[*offset..*offset + signature.len()] == *signature {
            let ext = if ext.is_empty() { None } else { Some(ext.to_string()) };
            return Some((*category, mime, ext));
        }
    }
    None
}

fn read_header(file: &mut File, buf: &mut [u8], path: &Path) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(IngestError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests;
