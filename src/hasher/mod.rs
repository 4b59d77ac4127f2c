//! Streaming multi-algorithm hasher.
//!
//! BLAKE3 is the primary content identifier; SHA-256 and SHA-512 are carried
//! alongside for RFC 8493 Bag compliance, which allows only a fixed set of
//! registry-approved digest algorithms. All three can be produced from a
//! single read pass via [`hash_all`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use digest::Digest;
use sha2::{Sha256, Sha512};

use crate::common::io::mmap_file;
use crate::error::{IngestError, Result};
use crate::model::HashAlgorithm;

/// Buffer size for streaming hash I/O. Large enough to amortize syscall
/// overhead and keep the number of hasher `update()` calls small.
const HASH_READ_BUF: usize = 4 * 1024 * 1024;

/// Result of hashing a file with every algorithm the engine tracks.
#[derive(Debug, Clone)]
pub struct AllHashes {
    pub blake3_full: String,
    pub blake3_short: String,
    pub sha256: String,
    pub sha512: String,
    pub size: u64,
}

/// Compile-time 2-byte hex pair lookup table, one lookup per input byte.
const fn generate_hex_table() -> [[u8; 2]; 256] {
    let hex = b"0123456789abcdef";
    let mut table = [[0u8; 2]; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = [hex[i >> 4], hex[i & 0xf]];
        i += 1;
    }
    table
}

const HEX_TABLE: [[u8; 2]; 256] = generate_hex_table();

pub fn hex_encode(bytes: &[u8]) -> String {
    let len = bytes.len() * 2;
    let mut hex = String::with_capacity(len);
    for &b in bytes {
        let pair = HEX_TABLE[b as usize];
        hex.push(pair[0] as char);
        hex.push(pair[1] as char);
    }
    hex
}

/// Truncate a full BLAKE3 hex digest to its 16-character short form.
pub fn short_hash(full_hex: &str) -> String {
    full_hex.chars().take(16).collect()
}

/// Hash a single file with one algorithm, choosing mmap for large files and
/// a streaming buffered read for small ones, matching the size-dependent I/O
/// strategy used throughout this engine.
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<String> {
    hash_file_with_block_size(algorithm, path, HASH_READ_BUF)
}

/// Same as [`hash_file`], reading in `block_size`-sized chunks on the
/// streaming path. The mmap fast path ignores `block_size` — it hashes the
/// whole mapped region in one call regardless of storage class.
pub fn hash_file_with_block_size(algorithm: HashAlgorithm, path: &Path, block_size: usize) -> Result<String> {
    let metadata = std::fs::metadata(path).map_err(|source| IngestError::Stat {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.len() == 0 {
        return Ok(hash_bytes(algorithm, &[]));
    }

    if metadata.len() >= crate::common::io::MMAP_THRESHOLD {
        if let Ok(mmap) = mmap_file(path) {
            return Ok(hash_bytes(algorithm, &mmap));
        }
    }

    let file = File::open(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    hash_reader(algorithm, file, block_size).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Hash every tracked algorithm over a single read pass of `path`.
pub fn hash_all(path: &Path) -> Result<AllHashes> {
    hash_all_with_block_size(path, HASH_READ_BUF)
}

/// Same as [`hash_all`], reading in `block_size`-sized chunks on the
/// streaming path.
pub fn hash_all_with_block_size(path: &Path, block_size: usize) -> Result<AllHashes> {
    let metadata = std::fs::metadata(path).map_err(|source| IngestError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    let size = metadata.len();

    if size >= crate::common::io::MMAP_THRESHOLD {
        if let Ok(mmap) = mmap_file(path) {
            let blake3_full = blake3::hash(&mmap).to_hex().to_string();
            let sha256 = hex_encode(&Sha256::digest(&mmap));
            let sha512 = hex_encode(&Sha512::digest(&mmap));
            return Ok(AllHashes {
                blake3_short: short_hash(&blake3_full),
                blake3_full,
                sha256,
                sha512,
                size,
            });
        }
    }

    let file = File::open(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    hash_all_reader(file, size, block_size).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Hash a reader with every tracked algorithm, returning sizes observed.
pub fn hash_all_reader(mut reader: impl Read, size_hint: u64, block_size: usize) -> std::io::Result<AllHashes> {
    let mut b3 = blake3::Hasher::new();
    let mut s256 = Sha256::new();
    let mut s512 = Sha512::new();
    let mut buf = vec![0u8; block_size];
    let mut total: u64 = 0;
    loop {
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        b3.update(&buf[..n]);
        s256.update(&buf[..n]);
        s512.update(&buf[..n]);
        total += n as u64;
    }
    let blake3_full = b3.finalize().to_hex().to_string();
    Ok(AllHashes {
        blake3_short: short_hash(&blake3_full),
        blake3_full,
        sha256: hex_encode(&s256.finalize()),
        sha512: hex_encode(&s512.finalize()),
        size: if total > 0 { total } else { size_hint },
    })
}

/// Compute a hash of an in-memory buffer directly (zero-copy fast path, used
/// by the mmap code path).
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
        HashAlgorithm::Blake3Short => short_hash(&blake3::hash(data).to_hex().to_string()),
        HashAlgorithm::Sha256 => hex_encode(&Sha256::digest(data)),
        HashAlgorithm::Sha512 => hex_encode(&Sha512::digest(data)),
    }
}

/// Compute a hash from a reader, streaming in `block_size`-sized blocks.
pub fn hash_reader<R: Read>(algorithm: HashAlgorithm, mut reader: R, block_size: usize) -> std::io::Result<String> {
    let mut buf = vec![0u8; block_size];
    match algorithm {
        HashAlgorithm::Blake3 | HashAlgorithm::Blake3Short => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = read_full(&mut reader, &mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            let full = hasher.finalize().to_hex().to_string();
            Ok(if matches!(algorithm, HashAlgorithm::Blake3Short) {
                short_hash(&full)
            } else {
                full
            })
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = read_full(&mut reader, &mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex_encode(&hasher.finalize()))
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            loop {
                let n = read_full(&mut reader, &mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex_encode(&hasher.finalize()))
        }
    }
}

/// Read as many bytes as possible into `buf`, retrying on partial reads, so
/// each hasher `update()` call gets a full buffer.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Whether hashing a batch of files in parallel is worth the dispatch
/// overhead. Rayon's pool is already warm, so two files is enough.
pub fn should_use_parallel(paths: &[&Path]) -> bool {
    paths.len() >= 2
}

#[cfg(test)]
mod tests;
