//! Atomic, hash-verified copy primitive.
//!
//! Every copy goes through a `<dst>.partial` temp file written alongside the
//! final destination, hashed in the same pass it is written, fsynced, then
//! renamed into place. A crash at any point before the rename leaves the
//! original destination (if any) untouched; a crash after the rename leaves a
//! complete, already-verified file. Retries only on errors classified
//! [`IngestError::transient`].

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{IngestError, Result};
use crate::model::HashAlgorithm;

const COPY_BUF: usize = 4 * 1024 * 1024;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Options controlling a single copy operation.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub algorithm: HashAlgorithm,
    pub verify: bool,
    pub overwrite: bool,
    /// Read/write block size, normally `concurrency::StorageProfile::block_size`
    /// for the destination's storage class.
    pub block_size: usize,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Blake3,
            verify: true,
            overwrite: false,
            block_size: COPY_BUF,
        }
    }
}

/// Outcome of a successful copy.
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    pub hash: String,
    pub size: u64,
    pub verified: bool,
    pub retries: u32,
}

/// Copy `src` to `dst`, hashing the source as it is read and the destination
/// as it is written. See module docs for the atomicity contract.
pub fn copy(src: &Path, dst: &Path, opts: &CopyOptions) -> Result<CopyOutcome> {
    if dst.exists() && !opts.overwrite {
        return Err(IngestError::Exists {
            path: dst.to_path_buf(),
        });
    }
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|source| IngestError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let partial = partial_path(dst);
    let mut retries = 0;
    loop {
        match copy_once(src, dst, &partial, opts) {
            Ok(outcome) => return Ok(CopyOutcome { retries, ..outcome }),
            Err(e) if e.transient() && retries < MAX_RETRIES => {
                let _ = std::fs::remove_file(&partial);
                std::thread::sleep(INITIAL_BACKOFF * 2u32.pow(retries));
                retries += 1;
            }
            Err(e) => {
                let _ = std::fs::remove_file(&partial);
                return Err(e);
            }
        }
    }
}

fn copy_once(src: &Path, dst: &Path, partial: &Path, opts: &CopyOptions) -> Result<CopyOutcome> {
    let mut reader = File::open(src).map_err(|source| IngestError::Read {
        path: src.to_path_buf(),
        source,
    })?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(partial)
        .map_err(|source| IngestError::Write {
            path: partial.to_path_buf(),
            source,
        })?;

    let (source_hash, size) = hash_while_copying(opts.algorithm, &mut reader, &mut writer, partial, opts.block_size)?;

    writer.sync_all().map_err(|source| IngestError::Write {
        path: partial.to_path_buf(),
        source,
    })?;
    drop(writer);

    let verified = if opts.verify {
        let dest_hash = crate::hasher::hash_file_with_block_size(opts.algorithm, partial, opts.block_size)?;
        if !dest_hash.eq_ignore_ascii_case(&source_hash) {
            return Err(IngestError::VerifyMismatch {
                path: dst.to_path_buf(),
                expected: source_hash,
                actual: dest_hash,
            });
        }
        true
    } else {
        false
    };

    std::fs::rename(partial, dst).map_err(|source| IngestError::Rename {
        from: partial.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    })?;

    Ok(CopyOutcome {
        hash: source_hash,
        size,
        verified,
        retries: 0,
    })
}

/// Read `reader` in fixed-size blocks, writing each block to `writer` and
/// updating a single hash state over the bytes read, so the source content
/// hash is produced in the same pass as the write.
fn hash_while_copying(
    algorithm: HashAlgorithm,
    reader: &mut impl Read,
    writer: &mut impl Write,
    dst_for_errors: &Path,
    block_size: usize,
) -> Result<(String, u64)> {
    let mut buf = vec![0u8; block_size];
    let mut size: u64 = 0;

    match algorithm {
        HashAlgorithm::Blake3 | HashAlgorithm::Blake3Short => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = read_block(reader, &mut buf, dst_for_errors)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                writer
                    .write_all(&buf[..n])
                    .map_err(|source| write_err(dst_for_errors, source))?;
                size += n as u64;
            }
            let full = hasher.finalize().to_hex().to_string();
            let value = if matches!(algorithm, HashAlgorithm::Blake3Short) {
                crate::hasher::short_hash(&full)
            } else {
                full
            };
            Ok((value, size))
        }
        HashAlgorithm::Sha256 => {
            use sha2::{Digest, Sha256};
            let mut hasher = Sha256::new();
            loop {
                let n = read_block(reader, &mut buf, dst_for_errors)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                writer
                    .write_all(&buf[..n])
                    .map_err(|source| write_err(dst_for_errors, source))?;
                size += n as u64;
            }
            Ok((crate::hasher::hex_encode(&hasher.finalize()), size))
        }
        HashAlgorithm::Sha512 => {
            use sha2::{Digest, Sha512};
            let mut hasher = Sha512::new();
            loop {
                let n = read_block(reader, &mut buf, dst_for_errors)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                writer
                    .write_all(&buf[..n])
                    .map_err(|source| write_err(dst_for_errors, source))?;
                size += n as u64;
            }
            Ok((crate::hasher::hex_encode(&hasher.finalize()), size))
        }
    }
}

fn read_block(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
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

fn write_err(path: &Path, source: std::io::Error) -> IngestError {
    IngestError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// `move = copy + verify + unlink(src)`, performed only after verification
/// succeeds.
pub fn move_after_verify(src: &Path, dst: &Path, opts: &CopyOptions) -> Result<CopyOutcome> {
    let mut verified_opts = opts.clone();
    verified_opts.verify = true;
    let outcome = copy(src, dst, &verified_opts)?;
    std::fs::remove_file(src).map_err(|source| IngestError::Write {
        path: src.to_path_buf(),
        source,
    })?;
    Ok(outcome)
}

fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dst.with_file_name(name)
}
