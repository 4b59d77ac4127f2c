//! Closed error taxonomy for the ingestion engine.
//!
//! Every fallible operation in this crate returns one of these kinds instead of
//! a bare `io::Error` or a boxed `dyn Error`, so callers can match on what went
//! wrong instead of grepping a message string.

use std::path::PathBuf;

use thiserror::Error;

/// A single error kind produced anywhere in the pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination {path} already exists")]
    Exists { path: PathBuf },

    #[error("hash mismatch for {path}: expected {expected}, got {actual}")]
    VerifyMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("hash algorithm {0} is not available")]
    AlgorithmUnavailable(String),

    #[error("failed to write checkpoint {path}: {source}")]
    CheckpointWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint {path} is not readable by this version: {reason}")]
    SchemaValidation { path: PathBuf, reason: String },

    #[error("metadata extractor {name} is unavailable: {reason}")]
    ExtractorUnavailable { name: String, reason: String },

    #[error("metadata extractor {name} timed out after {timeout_ms}ms on {path}")]
    ExtractorTimeout {
        name: String,
        path: PathBuf,
        timeout_ms: u64,
    },

    #[error("metadata extractor {name} crashed on {path}: {reason}")]
    ExtractorCrash {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl IngestError {
    /// Whether a retry of the same operation is likely to succeed.
    ///
    /// Used uniformly by the copier's retry loop and by the pipeline's
    /// fatal-vs-per-file classification, so the transient/fatal judgment
    /// lives in one place.
    pub fn transient(&self) -> bool {
        use std::io::ErrorKind;
        match self {
            IngestError::Read { source, .. }
            | IngestError::Write { source, .. }
            | IngestError::Rename { source, .. }
            | IngestError::Stat { source, .. } => matches!(
                source.kind(),
                ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
            ) || matches!(source.raw_os_error(), Some(libc::EAGAIN) | Some(libc::ENOMEM)),
            IngestError::VerifyMismatch { .. } => true,
            IngestError::ExtractorTimeout { .. } => true,
            _ => false,
        }
    }

    /// Whether this error kind should abort the whole session rather than
    /// being isolated to the one file that produced it.
    pub fn fatal(&self) -> bool {
        matches!(
            self,
            IngestError::AlgorithmUnavailable(_)
                | IngestError::CheckpointWrite { .. }
                | IngestError::SchemaValidation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
