//! Core data model: sessions, per-file state, and the hash/record types that
//! flow between the pipeline stages.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content hash with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHash {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

/// Hash algorithms this engine produces. `Blake3Short` is the first 16 hex
/// characters of the full BLAKE3 digest, used as the canonical short identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    Blake3,
    Blake3Short,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Blake3Short => "blake3-16",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

/// Coarse file-type classification emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Sidecar,
    Ebook,
    Executable,
    Data,
    Other,
}

/// Per-file lifecycle status within a session. Transitions are monotonic for
/// success (`Pending -> Hashed -> Copied -> Validated`); `Skipped` and `Error`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Hashed,
    Copied,
    Validated,
    Skipped,
    Error,
}

/// Session-level stage, mirroring the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Pending,
    Scanning,
    DetectingDevice,
    DetectingRelated,
    Hashing,
    Copying,
    Validating,
    Renaming,
    ExtractingMetadata,
    GeneratingSidecars,
    GeneratingManifest,
    Completed,
    Failed,
    Paused,
}

/// Storage class used to select concurrency, block size, and inter-op delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageClass {
    LocalSsd,
    CameraMedia,
    Network,
    Unknown,
}

/// A companion file copied alongside a primary media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopiedCompanion {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub extension: String,
    pub hash: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_base64: Option<String>,
}

/// An event in a file's chain of custody.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyEvent {
    pub event_id: String,
    pub event_timestamp: DateTime<Utc>,
    pub event_action: CustodyAction,
    pub event_outcome: CustodyOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    pub event_host: String,
    pub event_user: String,
    pub event_tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_hash_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyAction {
    Ingestion,
    MessageDigestCalculation,
    FixityCheck,
    Migration,
    MetadataModification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustodyOutcome {
    Success,
    Failure,
    Partial,
}

/// Mutable per-file record held in memory for the duration of a session and
/// checkpointed to disk. Owned exclusively by the pipeline driver thread;
/// workers return immutable results that the driver folds in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileState {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_hash_full: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_path: Option<PathBuf>,
    pub original_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FileCategory>,
    pub is_primary: bool,
    pub related_files: Vec<PathBuf>,
    pub copied_companions: Vec<CopiedCompanion>,

    pub metadata: BTreeMap<String, serde_json::Value>,

    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileState {
    pub fn new(source_path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        let original_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_path,
            relative_path,
            size,
            hash_full: None,
            hash_short: None,
            dest_hash_full: None,
            dest_path: None,
            original_name,
            final_name: None,
            category: None,
            is_primary: true,
            related_files: Vec::new(),
            copied_companions: Vec::new(),
            metadata: BTreeMap::new(),
            status: FileStatus::Pending,
            error: None,
        }
    }

    /// Whether `destHashFull == hashFull`, the condition under which a file
    /// may transition to `Validated`.
    pub fn hash_matches(&self) -> bool {
        match (&self.hash_full, &self.dest_hash_full) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

/// The live session: the single ownership root for a run of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    pub source: PathBuf,
    pub destination: PathBuf,

    pub total_files: u64,
    pub processed_files: u64,
    pub duplicate_files: u64,
    pub renamed_files: u64,
    pub sidecar_files: u64,
    pub error_files: u64,
    pub total_bytes: u64,
    pub processed_bytes: u64,

    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_volume_serial: Option<String>,

    pub files: Vec<FileState>,
}

impl Session {
    pub fn new(id: String, source: PathBuf, destination: PathBuf, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: SessionStatus::Pending,
            source,
            destination,
            total_files: 0,
            processed_files: 0,
            duplicate_files: 0,
            renamed_files: 0,
            sidecar_files: 0,
            error_files: 0,
            total_bytes: 0,
            processed_bytes: 0,
            started_at,
            completed_at: None,
            error: None,
            batch_id: None,
            batch_name: None,
            source_device: None,
            source_type: None,
            source_volume: None,
            source_volume_serial: None,
            files: Vec::new(),
        }
    }
}

/// Terminal outcome of a pipeline run, surfaced to the embedding application.
/// Translating this into a process exit code is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Success,
    CompletedWithErrors,
    Failed,
}

impl Session {
    pub fn outcome(&self) -> SessionOutcome {
        match self.status {
            SessionStatus::Completed if self.error_files == 0 => SessionOutcome::Success,
            SessionStatus::Completed => SessionOutcome::CompletedWithErrors,
            _ => SessionOutcome::Failed,
        }
    }
}
