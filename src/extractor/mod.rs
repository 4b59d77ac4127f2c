//! Metadata extractor interface and bounded invocation pool.
//!
//! Concrete extractors (EXIF, ffprobe, office readers, perceptual hashers)
//! are out of scope here — this module only defines the trait they implement
//! and the pool that invokes them as bounded, timed-out black boxes. There is
//! no async runtime in this crate's dependency stack, so a call's timeout is
//! enforced with a detached worker thread and a channel `recv_timeout`: the
//! worker is never joined, only raced against the deadline, since a scoped
//! thread would force the caller to wait for it regardless of which one
//! finishes first.

use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::error::{IngestError, Result};

/// Default per-call timeout for a single extractor invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Producer-prefixed metadata a single extractor contributes, e.g. keys under
/// an `"Exif_"` or `"Chromaprint_"` namespace.
pub type MetadataMap = std::collections::BTreeMap<String, serde_json::Value>;

/// A metadata extractor: given a file path, returns a flat map of
/// producer-prefixed fields. Implementations are expected to be cheap to
/// construct and safe to call from multiple worker threads concurrently.
pub trait MetadataExtractor: Send + Sync {
    /// Short name used to prefix this extractor's keys and identify it in errors.
    fn name(&self) -> &str;

    /// Whether this extractor applies to the given classified category/extension.
    fn applies_to(&self, extension: &str) -> bool;

    /// Extract metadata. Implementations should return quickly; the pool
    /// enforces the wall-clock timeout independently.
    fn extract(&self, path: &Path) -> std::result::Result<MetadataMap, String>;
}

/// Owns a fixed set of extractors and runs them with a bounded worker count
/// and a per-call timeout, acquired on entry to the extraction stage and
/// released on exit — no global singleton.
pub struct ExtractorPool {
    extractors: Vec<Arc<dyn MetadataExtractor>>,
    timeout: Duration,
    concurrency: usize,
}

impl ExtractorPool {
    pub fn new(extractors: Vec<Box<dyn MetadataExtractor>>) -> Self {
        Self {
            extractors: extractors.into_iter().map(Arc::from).collect(),
            timeout: DEFAULT_TIMEOUT,
            concurrency: 4,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every applicable extractor against `path`, merging their
    /// producer-prefixed maps. A single extractor's failure never aborts the
    /// others; it is logged and the record is emitted without that
    /// extractor's section.
    pub fn extract_all(&self, path: &Path) -> MetadataMap {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut merged = MetadataMap::new();
        for extractor in &self.extractors {
            if !extractor.applies_to(&extension) {
                continue;
            }
            match self.run_with_timeout(Arc::clone(extractor), path) {
                Ok(map) => merged.extend(map),
                Err(e) => {
                    tracing::warn!(extractor = extractor.name(), path = %path.display(), error = %e, "extractor failed");
                }
            }
        }
        merged
    }

    /// Run one extractor against `path` on a detached worker thread, raced
    /// against `self.timeout` via a channel `recv_timeout`. On timeout the
    /// `JoinHandle` is dropped rather than joined — the worker, if truly
    /// hung, keeps running unobserved instead of blocking this call (and the
    /// whole pipeline) indefinitely. A worker panic is caught and reported as
    /// [`IngestError::ExtractorCrash`] rather than unwinding into the caller.
    fn run_with_timeout(&self, extractor: Arc<dyn MetadataExtractor>, path: &Path) -> Result<MetadataMap> {
        let name = extractor.name().to_string();
        let path_buf = path.to_path_buf();
        let (tx, rx) = mpsc::channel();

        let spawned = std::thread::Builder::new()
            .name(format!("extractor-{name}"))
            .spawn(move || {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    extractor.extract(&path_buf)
                }));
                let _ = tx.send(outcome);
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(source) => {
                return Err(IngestError::ExtractorCrash {
                    name,
                    path: path.to_path_buf(),
                    reason: format!("failed to spawn extractor thread: {source}"),
                })
            }
        };

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(Ok(map))) => {
                let _ = handle.join();
                Ok(map)
            }
            Ok(Ok(Err(msg))) => {
                let _ = handle.join();
                Err(IngestError::ExtractorUnavailable { name, reason: msg })
            }
            Ok(Err(_panic_payload)) => {
                let _ = handle.join();
                Err(IngestError::ExtractorCrash {
                    name,
                    path: path.to_path_buf(),
                    reason: "extractor thread panicked".to_string(),
                })
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Do not join: the worker may be stuck indefinitely (blocked
                // syscall, hung child process). Drop the handle and move on.
                drop(handle);
                Err(IngestError::ExtractorTimeout {
                    name,
                    path: path.to_path_buf(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(IngestError::ExtractorCrash {
                    name,
                    path: path.to_path_buf(),
                    reason: "extractor thread disconnected without reporting".to_string(),
                })
            }
        }
    }
}

pub fn prefix_keys(prefix: &str, map: MetadataMap) -> MetadataMap {
    map.into_iter()
        .map(|(k, v)| (format!("{prefix}_{k}"), v))
        .collect()
}

/// Resolve a bounded worker count for the extraction stage, independent of
/// per-extractor pool sizing.
pub fn stage_concurrency() -> usize {
    4
}
