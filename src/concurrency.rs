//! Storage-class concurrency table and detection heuristics.
//!
//! Each pipeline stage that touches I/O sizes its worker pool and block size
//! from this table rather than the process-wide Rayon default, so a
//! network-storage job does not contend with a local-SSD job running
//! concurrently in the same process.

use std::path::Path;
use std::time::Duration;

use crate::model::StorageClass;

#[derive(Debug, Clone, Copy)]
pub struct StorageProfile {
    pub hash_concurrency: usize,
    pub copy_concurrency: usize,
    pub block_size: usize,
    pub inter_op_delay: Duration,
}

pub fn profile_for(class: StorageClass) -> StorageProfile {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    match class {
        StorageClass::LocalSsd => StorageProfile {
            hash_concurrency: cpus.saturating_sub(1).max(1),
            copy_concurrency: cpus.saturating_sub(1).max(1),
            block_size: 1024 * 1024,
            inter_op_delay: Duration::ZERO,
        },
        StorageClass::CameraMedia => StorageProfile {
            hash_concurrency: 2,
            copy_concurrency: 2,
            block_size: 256 * 1024,
            inter_op_delay: Duration::from_millis(10),
        },
        StorageClass::Network => StorageProfile {
            hash_concurrency: 1,
            copy_concurrency: 1,
            block_size: 1024 * 1024,
            inter_op_delay: Duration::from_millis(50),
        },
        StorageClass::Unknown => StorageProfile {
            hash_concurrency: 2,
            copy_concurrency: 2,
            block_size: 128 * 1024,
            inter_op_delay: Duration::from_millis(10),
        },
    }
}

/// Network path prefixes recognized without a platform-specific mount table.
const NETWORK_PREFIXES: &[&str] = &["//", "\\\\", "smb://", "nfs://", "afp://"];

/// Path fragments conventionally used for removable camera media mount points.
const CAMERA_MOUNT_HINTS: &[&str] = &["dcim", "eos_digital", "private/avchd", "card"];

/// Decide a path's storage class from prefix and mount-point heuristics. This
/// is a best-effort classification used to pick a concurrency profile, not an
/// authoritative filesystem query.
pub fn detect_storage_class(path: &Path) -> StorageClass {
    let s = path.to_string_lossy().to_lowercase();

    if NETWORK_PREFIXES.iter().any(|p| s.starts_with(p)) {
        return StorageClass::Network;
    }
    if CAMERA_MOUNT_HINTS.iter().any(|hint| s.contains(hint)) {
        return StorageClass::CameraMedia;
    }
    if s.starts_with('/') || s.get(1..2) == Some(":") {
        return StorageClass::LocalSsd;
    }
    StorageClass::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_network_paths() {
        assert_eq!(
            detect_storage_class(&PathBuf::from("//server/share/clip.mp4")),
            StorageClass::Network
        );
    }

    #[test]
    fn detects_camera_media_by_mount_hint() {
        assert_eq!(
            detect_storage_class(&PathBuf::from("/media/sdcard/DCIM/100CANON")),
            StorageClass::CameraMedia
        );
    }

    #[test]
    fn local_absolute_path_defaults_to_local_ssd() {
        assert_eq!(
            detect_storage_class(&PathBuf::from("/home/alice/photos")),
            StorageClass::LocalSsd
        );
    }

    #[test]
    fn profile_table_matches_documented_values() {
        let p = profile_for(StorageClass::Network);
        assert_eq!(p.hash_concurrency, 1);
        assert_eq!(p.block_size, 1024 * 1024);
        assert_eq!(p.inter_op_delay, Duration::from_millis(50));
    }
}
