//! The ingestion pipeline: the stage state machine that drives scanning,
//! hashing, copying, validation, renaming, metadata extraction, and
//! manifest/record emission over a single session.
//!
//! The [`Session`] is the sole mutable ownership root. Worker threads return
//! immutable per-file results; only the driving thread ever mutates
//! `session.files[i]` or the session counters, eliminating the
//! shared-mutable-state hazards a naive fan-out would otherwise invite.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use crate::checkpoint::CheckpointPolicy;
use crate::common::env;
use crate::companion::CompanionResolver;
use crate::concurrency::{detect_storage_class, profile_for};
use crate::copier::CopyOptions;
use crate::error::{IngestError, Result};
use crate::extractor::ExtractorPool;
use crate::model::{
    CustodyAction, CustodyEvent, CustodyOutcome, FileCategory, FileState, FileStatus, HashAlgorithm, Session,
    SessionStatus,
};
use crate::record::FileRecord;

const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the hashing stage draws its known-hash set from, in priority order:
/// a caller-supplied set, a full destination scan, or nothing at all.
#[derive(Debug, Clone, Default)]
pub enum DedupSource {
    #[default]
    None,
    DestinationScan,
    Known(HashSet<String>),
}

/// Options controlling a single pipeline run.
pub struct PipelineOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub verify: bool,
    pub rename: bool,
    pub generate_manifest: bool,
    pub dedup: DedupSource,
    pub scan: crate::scanner::ScanOptions,
    pub batch_id: Option<String>,
    pub batch_name: Option<String>,
    pub resume: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            verify: true,
            rename: false,
            generate_manifest: true,
            dedup: DedupSource::default(),
            scan: crate::scanner::ScanOptions::default(),
            batch_id: None,
            batch_name: None,
            resume: false,
        }
    }
}

/// Invoked after every stage transition and at each checkpoint write.
pub type ProgressCallback<'a> = dyn Fn(&Session) + Send + Sync + 'a;

/// Generate a ULID-shaped session identifier: a millisecond timestamp prefix
/// (sortable, matching ULID's monotonic property) followed by a random
/// suffix. Avoids pulling in a dedicated ULID crate for one identifier shape.
pub fn new_session_id(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("{:013x}-{}", now.timestamp_millis(), Uuid::new_v4().simple())
}

/// Run the pipeline end to end, optionally resuming from an existing
/// checkpoint at `options.destination`.
pub fn run(options: PipelineOptions, extractors: Option<&ExtractorPool>, progress: Option<&ProgressCallback>) -> Result<Session> {
    std::fs::create_dir_all(&options.destination).map_err(|source| IngestError::Write {
        path: options.destination.clone(),
        source,
    })?;

    let mut session = if options.resume {
        match crate::checkpoint::read(&options.destination)? {
            Some(s) => s,
            None => new_session(&options),
        }
    } else {
        new_session(&options)
    };

    let emit = |session: &Session| {
        if let Some(cb) = progress {
            cb(session);
        }
    };

    if let Err(e) = run_inner(&mut session, &options, extractors, &emit) {
        session.status = SessionStatus::Failed;
        session.error = Some(e.to_string());
        let _ = crate::checkpoint::write(&session);
        emit(&session);
        return Err(e);
    }

    session.status = SessionStatus::Completed;
    session.completed_at = Some(env::now());
    emit(&session);
    crate::checkpoint::clear(&options.destination)?;

    Ok(session)
}

fn new_session(options: &PipelineOptions) -> Session {
    let now = env::now();
    let mut session = Session::new(new_session_id(now), options.source.clone(), options.destination.clone(), now);
    session.batch_id = options.batch_id.clone();
    session.batch_name = options.batch_name.clone();
    session
}

fn run_inner(
    session: &mut Session,
    options: &PipelineOptions,
    extractors: Option<&ExtractorPool>,
    emit: &impl Fn(&Session),
) -> Result<()> {
    transition(session, SessionStatus::Scanning, emit)?;
    if session.files.is_empty() {
        scan_and_relate(session, options)?;
    }

    transition(session, SessionStatus::Hashing, emit)?;
    let known_hashes = resolve_dedup_set(options)?;
    hash_stage(session, options, &known_hashes, emit)?;

    transition(session, SessionStatus::Copying, emit)?;
    copy_stage(session, options, emit)?;
    companion_stage(session)?;

    if options.rename {
        transition(session, SessionStatus::Renaming, emit)?;
        rename_stage(session)?;
    }

    if let Some(pool) = extractors {
        transition(session, SessionStatus::ExtractingMetadata, emit)?;
        metadata_stage(session, pool);
    }

    transition(session, SessionStatus::GeneratingSidecars, emit)?;
    sidecar_stage(session, options)?;

    if options.generate_manifest {
        transition(session, SessionStatus::GeneratingManifest, emit)?;
        manifest_stage(session, options)?;
    }

    Ok(())
}

fn transition(session: &mut Session, status: SessionStatus, emit: &impl Fn(&Session)) -> Result<()> {
    session.status = status;
    crate::checkpoint::write(session)?;
    emit(session);
    Ok(())
}

fn scan_and_relate(session: &mut Session, options: &PipelineOptions) -> Result<()> {
    let scanned = crate::scanner::scan(&options.source, &options.scan)?;
    let paths: Vec<PathBuf> = scanned.iter().map(|f| f.path.clone()).collect();
    let groups = crate::related::resolve_related(&paths);

    let mut primary_of: std::collections::HashMap<PathBuf, PathBuf> = std::collections::HashMap::new();
    let mut members_of: std::collections::HashMap<PathBuf, Vec<PathBuf>> = std::collections::HashMap::new();
    for group in &groups {
        for member in &group.members {
            primary_of.insert(member.clone(), group.primary.clone());
        }
        members_of.insert(group.primary.clone(), group.members.clone());
    }

    // A file claimed as another primary's companion (telemetry, subtitle,
    // thumbnail — see `companion::CompanionResolver`) is never ingested as a
    // standalone file: it only ever appears embedded in its primary's
    // `copied_companions`. Claim in primary-path order so two candidate
    // primaries never both claim the same companion.
    let mut claimed_companions: HashSet<PathBuf> = HashSet::new();
    {
        let mut resolver = CompanionResolver::new();
        let mut primaries: Vec<&PathBuf> = members_of
            .keys()
            .filter(|p| {
                let ext = p
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                !crate::related::is_companion_only_extension(&ext)
            })
            .collect();
        primaries.sort();
        for primary in primaries {
            for companion in resolver.find(primary) {
                let already_related = primary_of
                    .get(&companion.path)
                    .and_then(|p| members_of.get(p))
                    .is_some_and(|members| members.len() > 1);
                if already_related {
                    // Already a related-group member (RAW+JPEG, AVCHD
                    // .MTS/.MOI) — those are siblings, not companions.
                    continue;
                }
                claimed_companions.insert(companion.path);
            }
        }
    }

    for file in scanned {
        if claimed_companions.contains(&file.path) {
            continue;
        }
        let relative_path = file.relative_path.clone();
        let mut state = FileState::new(file.path.clone(), relative_path, file.size);
        state.is_primary = primary_of.get(&file.path) == Some(&file.path);
        if state.is_primary {
            state.related_files = members_of
                .get(&file.path)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|p| p != &file.path)
                .collect();
        }
        if let Ok(classification) = crate::classifier::classify(&file.path) {
            state.category = Some(classification.category);
        }
        session.files.push(state);
    }
    session.total_files = session.files.len() as u64;
    session.total_bytes = session.files.iter().map(|f| f.size).sum();
    Ok(())
}

fn resolve_dedup_set(options: &PipelineOptions) -> Result<HashSet<String>> {
    match &options.dedup {
        DedupSource::None => Ok(HashSet::new()),
        DedupSource::Known(set) => Ok(set.clone()),
        DedupSource::DestinationScan => {
            let scanned = crate::scanner::scan(&options.destination, &crate::scanner::ScanOptions::default())?;
            let hashes: Result<Vec<String>> = scanned
                .iter()
                .map(|f| crate::hasher::hash_file(HashAlgorithm::Blake3, &f.path))
                .collect();
            Ok(hashes?.into_iter().collect())
        }
    }
}

fn hash_stage(
    session: &mut Session,
    options: &PipelineOptions,
    known_hashes: &HashSet<String>,
    emit: &impl Fn(&Session),
) -> Result<()> {
    let profile = profile_for(detect_storage_class(&options.source));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(profile.hash_concurrency)
        .build()
        .map_err(|e| IngestError::Other(e.to_string()))?;

    let results: Vec<(usize, Result<String>)> = pool.install(|| {
        use rayon::prelude::*;
        session
            .files
            .par_iter()
            .enumerate()
            .filter(|(_, f)| f.status == FileStatus::Pending)
            .map(|(i, f)| {
                (
                    i,
                    crate::hasher::hash_file_with_block_size(HashAlgorithm::Blake3, &f.source_path, profile.block_size),
                )
            })
            .collect()
    });

    let mut hashed_since_checkpoint = 0u64;
    for (i, result) in results {
        let file = &mut session.files[i];
        match result {
            Ok(hash) => {
                file.hash_short = Some(crate::hasher::short_hash(&hash));
                file.hash_full = Some(hash.clone());
                file.status = if known_hashes.contains(&hash) {
                    session.duplicate_files += 1;
                    FileStatus::Skipped
                } else {
                    FileStatus::Hashed
                };
                if !profile.inter_op_delay.is_zero() {
                    std::thread::sleep(profile.inter_op_delay);
                }
            }
            Err(e) => {
                let fatal = e.fatal();
                file.status = FileStatus::Error;
                file.error = Some(e.to_string());
                session.error_files += 1;
                if fatal {
                    return Err(e);
                }
            }
        }
        hashed_since_checkpoint += 1;
        if hashed_since_checkpoint >= CheckpointPolicy::default().every_hashed {
            crate::checkpoint::write(session)?;
            emit(session);
            hashed_since_checkpoint = 0;
        }
    }
    Ok(())
}

fn copy_stage(session: &mut Session, options: &PipelineOptions, emit: &impl Fn(&Session)) -> Result<()> {
    let profile = profile_for(detect_storage_class(&options.destination));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(profile.copy_concurrency)
        .build()
        .map_err(|e| IngestError::Other(e.to_string()))?;

    let copy_opts = CopyOptions {
        algorithm: HashAlgorithm::Blake3,
        verify: options.verify,
        overwrite: false,
        block_size: profile.block_size,
    };
    let destination = options.destination.clone();

    let indices: Vec<usize> = session
        .files
        .iter()
        .enumerate()
        .filter(|(_, f)| f.status == FileStatus::Hashed)
        .map(|(i, _)| i)
        .collect();

    let results: Vec<(usize, PathBuf, Result<crate::copier::CopyOutcome>)> = pool.install(|| {
        use rayon::prelude::*;
        indices
            .par_iter()
            .map(|&i| {
                let file = &session.files[i];
                let dest_path = destination.join(&file.relative_path);
                let outcome = crate::copier::copy(&file.source_path, &dest_path, &copy_opts);
                (i, dest_path, outcome)
            })
            .collect()
    });

    let mut copied_since_checkpoint = 0u64;
    for (i, dest_path, result) in results {
        let file = &mut session.files[i];
        match result {
            Ok(outcome) => {
                file.dest_path = Some(dest_path);
                file.dest_hash_full = Some(outcome.hash);
                file.status = if !options.verify || file.hash_matches() {
                    FileStatus::Validated
                } else {
                    FileStatus::Copied
                };
                session.processed_files += 1;
                session.processed_bytes += outcome.size;
            }
            Err(e) => {
                let fatal = e.fatal();
                file.status = FileStatus::Error;
                file.error = Some(e.to_string());
                session.error_files += 1;
                if fatal {
                    return Err(e);
                }
            }
        }
        copied_since_checkpoint += 1;
        if copied_since_checkpoint >= CheckpointPolicy::default().every_copied {
            crate::checkpoint::write(session)?;
            emit(session);
            copied_since_checkpoint = 0;
        }
    }
    Ok(())
}

/// Copy each primary's companion sidecars (telemetry, proxy, thumbnail files)
/// alongside it, distinct from the related-files group already captured by
/// the scan stage. Run sequentially: a directory's companions are few and the
/// resolver's per-directory cache only pays off without parallel contention.
fn companion_stage(session: &mut Session) -> Result<()> {
    let mut resolver = CompanionResolver::new();

    let primaries: Vec<usize> = session
        .files
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_primary && matches!(f.status, FileStatus::Validated | FileStatus::Copied))
        .map(|(i, _)| i)
        .collect();

    for i in primaries {
        let (source_path, dest_path, related) = {
            let file = &session.files[i];
            let Some(dest_path) = file.dest_path.clone() else {
                continue;
            };
            (file.source_path.clone(), dest_path, file.related_files.clone())
        };

        let companions: Vec<_> = resolver
            .find(&source_path)
            .into_iter()
            .filter(|c| !related.iter().any(|r| r == &c.path))
            .collect();

        let mut copied = Vec::new();
        for companion in companions {
            let companion_dest = dest_path
                .parent()
                .unwrap_or(Path::new("."))
                .join(companion.path.file_name().unwrap_or_default());
            let copy_opts = CopyOptions::default();
            let outcome = match crate::copier::copy(&companion.path, &companion_dest, &copy_opts) {
                Ok(outcome) => outcome,
                Err(_) => continue,
            };
            if let Ok(record) = crate::companion::to_copied_companion(&companion, companion_dest, outcome.hash) {
                copied.push(record);
            }
        }
        session.files[i].copied_companions = copied;
    }
    Ok(())
}

fn rename_stage(session: &mut Session) -> Result<()> {
    for file in &mut session.files {
        if file.status != FileStatus::Validated && file.status != FileStatus::Copied {
            continue;
        }
        let (Some(dest_path), Some(short)) = (file.dest_path.clone(), file.hash_short.clone()) else {
            continue;
        };
        let ext = Path::new(&file.original_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let final_name = format!("{short}{ext}");
        let new_path = dest_path.with_file_name(&final_name);
        if new_path != dest_path {
            std::fs::rename(&dest_path, &new_path).map_err(|source| IngestError::Rename {
                from: dest_path.clone(),
                to: new_path.clone(),
                source,
            })?;
            file.dest_path = Some(new_path);
        }
        file.final_name = Some(final_name);
        session.renamed_files += 1;
    }
    Ok(())
}

fn metadata_stage(session: &mut Session, pool: &ExtractorPool) {
    let indices: Vec<usize> = session
        .files
        .iter()
        .enumerate()
        .filter(|(_, f)| matches!(f.status, FileStatus::Validated | FileStatus::Copied))
        .map(|(i, _)| i)
        .collect();

    let results: Vec<(usize, crate::extractor::MetadataMap)> = indices
        .iter()
        .map(|&i| (i, pool.extract_all(&session.files[i].source_path)))
        .collect();

    for (i, map) in results {
        session.files[i].metadata = map;
    }
}

fn sidecar_stage(session: &mut Session, options: &PipelineOptions) -> Result<()> {
    let host = env::hostname();
    let user = env::username();
    let platform = env::platform().to_string();
    let now = env::now();

    for file in &mut session.files {
        if !matches!(file.status, FileStatus::Validated | FileStatus::Copied) {
            continue;
        }
        let Some(dest_path) = file.dest_path.clone() else {
            continue;
        };

        let hash_full = file.hash_full.clone().unwrap_or_default();
        let hash_short = file.hash_short.clone().unwrap_or_default();
        let dest_hash = file.dest_hash_full.clone();
        let hash_match = dest_hash.as_ref().map(|_| file.hash_matches());

        let source_meta = std::fs::metadata(&file.source_path).ok();
        let original_mtime = source_meta
            .as_ref()
            .and_then(|m| m.modified().ok())
            .map(chrono::DateTime::<chrono::Utc>::from)
            .unwrap_or(now);

        let mut record = FileRecord {
            schema_version: 1,
            sidecar_created: now,
            sidecar_updated: now,
            content_hash: hash_short,
            content_hash_full: hash_full,
            hash_algorithm: "blake3".to_string(),
            file_size: file.size,
            verified: options.verify && file.status == FileStatus::Validated,
            source_hash: file.hash_full.clone(),
            dest_hash,
            hash_match,
            file_category: file.category.unwrap_or(FileCategory::Other),
            detected_mime_type: "application/octet-stream".to_string(),
            declared_extension: Path::new(&file.original_name)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase()),
            source_path: file.source_path.clone(),
            source_filename: file.original_name.clone(),
            source_host: host.clone(),
            source_volume: None,
            source_volume_serial: None,
            source_type: "local".to_string(),
            source_device: None,
            original_mtime,
            original_ctime: None,
            original_btime: None,
            original_atime: None,
            import_timestamp: now,
            session_id: session.id.clone(),
            tool_version: TOOL_VERSION.to_string(),
            import_user: user.clone(),
            import_host: host.clone(),
            import_platform: platform.clone(),
            import_method: "ingest".to_string(),
            batch_id: session.batch_id.clone(),
            batch_name: session.batch_name.clone(),
            batch_file_count: Some(session.total_files),
            batch_sequence: None,
            was_renamed: Some(file.final_name.is_some()),
            dest_filename: file.final_name.clone(),
            rename_reason: file.final_name.as_ref().map(|_| "content-hash rename".to_string()),
            related_files: if file.related_files.is_empty() {
                None
            } else {
                Some(file.related_files.clone())
            },
            is_primary_file: Some(file.is_primary),
            custody_chain: Vec::new(),
            first_seen: now,
            event_count: 0,
            raw_metadata: if file.metadata.is_empty() {
                None
            } else {
                Some(file.metadata.clone())
            },
            category_detail: None,
            copied_companions: if file.copied_companions.is_empty() {
                None
            } else {
                Some(file.copied_companions.clone())
            },
            ingested_companions: None,
        };

        record.append_event(
            CustodyEvent {
                event_id: Uuid::new_v4().to_string(),
                event_timestamp: now,
                event_action: CustodyAction::Ingestion,
                event_outcome: if file.status == FileStatus::Validated {
                    CustodyOutcome::Success
                } else {
                    CustodyOutcome::Partial
                },
                event_location: None,
                event_host: host.clone(),
                event_user: user.clone(),
                event_tool: "wnb-ingest".to_string(),
                event_hash: record.source_hash.clone(),
                event_hash_algorithm: Some("blake3".to_string()),
                event_notes: None,
            },
            now,
        );

        let sidecar_path = sidecar_path_for(&dest_path);
        crate::record::write_xmp(&record, &sidecar_path)?;
        session.sidecar_files += 1;
    }
    Ok(())
}

fn sidecar_path_for(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.file_name().unwrap_or_default().to_os_string();
    name.push(".xmp");
    dest_path.with_file_name(name)
}

fn manifest_stage(session: &Session, options: &PipelineOptions) -> Result<()> {
    let inputs: Vec<crate::manifest::ManifestInput> = session
        .files
        .iter()
        .filter(|f| matches!(f.status, FileStatus::Validated | FileStatus::Copied))
        .filter_map(|f| {
            Some(crate::manifest::ManifestInput {
                relative_path: f.dest_path.as_ref()?.strip_prefix(&options.destination).ok()?.to_path_buf(),
                hash: f.hash_short.clone()?,
                size: f.size,
                mtime: None,
            })
        })
        .collect();

    let manifest = crate::manifest::build(&options.destination, &inputs, 16, env::now());
    crate::manifest::write(&manifest, &options.destination.join("manifest.json"))
}

/// Lock guarding concurrent checkpoint writes from the driver thread and any
/// cancellation handler; held only across the serialization, never across
/// destination I/O.
static CHECKPOINT_LOCK: Mutex<()> = Mutex::new(());

/// Write a checkpoint under the module-level lock, used by cancellation
/// handlers that run outside the normal stage-transition path.
pub fn checkpoint_now(session: &Session) -> Result<()> {
    let _guard = CHECKPOINT_LOCK.lock().unwrap();
    crate::checkpoint::write(session)
}
