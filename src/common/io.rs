use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::Mmap;

/// Threshold above which we use mmap instead of buffered read.
/// mmap has overhead from page table setup; for small files buffered read wins.
pub const MMAP_THRESHOLD: u64 = 64 * 1024; // 64KB

/// Read a file, choosing mmap for large files and buffered read for small ones.
pub fn read_file_bytes(path: &Path) -> io::Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)?;

    if metadata.len() >= MMAP_THRESHOLD {
        let file = File::open(path)?;
        // SAFETY: read-only mapping, converted to an owned Vec immediately;
        // the file is not modified while the mapping is alive.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(mmap.to_vec())
    } else {
        std::fs::read(path)
    }
}

/// Memory-map a file for zero-copy access.
///
/// Caller must ensure the file is not modified while the mapping is alive.
pub fn mmap_file(path: &Path) -> io::Result<Mmap> {
    let file = File::open(path)?;
    unsafe { Mmap::map(&file) }
}
