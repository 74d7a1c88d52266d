//! Temporary artifact lifecycle
//!
//! A [`TemporaryArtifact`] is the filesystem-backed container the export
//! phase writes into. It is created fresh per attempt, exclusively owned by
//! that attempt, and deleted by the same attempt on every exit path except
//! one: a local-destination job that succeeded, where the artifact is the
//! deliverable and is handed off via [`TemporaryArtifact::persist`].
//!
//! Deletion is attempted exactly once and a failed delete is logged but
//! never escalated; the phase outcome always wins. A Drop backstop covers
//! panic and early-return paths.

use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::types::SourceId;

/// Maximum number of suffix attempts when resolving a temp-name collision
const MAX_COLLISION_ATTEMPTS: u32 = 99;

/// A temporary export artifact, deleted on drop unless persisted.
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    cleaned_up: bool,
    persisted: bool,
}

impl TemporaryArtifact {
    /// Reserve a fresh artifact path under `temp_dir` for one attempt.
    ///
    /// The name is derived from the source id plus the clock's millisecond
    /// value, so attempts for different sources (or retries of the same
    /// source) never collide. If a file with the derived name already
    /// exists, a numeric suffix is added.
    ///
    /// Creates `temp_dir` if needed. A permission failure here is permanent;
    /// any other I/O failure is transient.
    pub fn allocate(temp_dir: &Path, source: &SourceId, clock: &dyn Clock) -> Result<Self> {
        std::fs::create_dir_all(temp_dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(format!(
                "cannot create temp directory {}",
                temp_dir.display()
            )),
            _ => Error::Io(e),
        })?;

        let stem = format!("export_{}_{}", safe_name(source.as_str()), clock.unix_millis());
        let mut path = temp_dir.join(format!("{stem}.backup"));
        let mut suffix = 0u32;
        while path.exists() {
            suffix += 1;
            if suffix > MAX_COLLISION_ATTEMPTS {
                return Err(Error::Other(format!(
                    "could not find unused temp artifact name for {stem}"
                )));
            }
            path = temp_dir.join(format!("{stem}_{suffix}.backup"));
        }

        Ok(Self {
            path,
            cleaned_up: false,
            persisted: false,
        })
    }

    /// Path the export phase writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the artifact on disk
    pub async fn byte_len(&self) -> Result<u64> {
        let meta = tokio::fs::metadata(&self.path).await?;
        Ok(meta.len())
    }

    /// Hand the artifact off as the local deliverable.
    ///
    /// Consumes the guard without deleting the file and returns its path.
    /// The caller owns any subsequent relocation.
    pub fn persist(mut self) -> PathBuf {
        self.persisted = true;
        self.path.clone()
    }

    /// Delete the artifact from disk.
    ///
    /// Idempotent: the first call attempts removal, later calls (and the
    /// Drop backstop) are no-ops. A delete failure is logged at warn and
    /// swallowed so it can never change the attempt's primary outcome.
    pub fn cleanup(&mut self) {
        if self.cleaned_up || self.persisted {
            return;
        }
        self.cleaned_up = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Deleted temporary artifact");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Export never got far enough to create the file
                tracing::debug!(path = %self.path.display(), "Temporary artifact already absent");
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to delete temporary artifact"
                );
            }
        }
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Source ids are opaque; keep the derived file name filesystem-safe.
fn safe_name(source: &str) -> String {
    source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
