//! Exporter port — the collaborator that serializes the data source into an
//! encrypted artifact.
//!
//! The backup container format and its encryption are entirely the
//! exporter's business; this crate only defines the contract the job holds
//! it to: write the artifact at the given path, poll the cancellation token
//! during long-running serialization, and report failures in terms the
//! retry classifier understands (see [`ExportError`]).

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::error::ExportError;
use crate::types::{ExportSecret, Passphrase, SourceId};

/// What a successful export reports back
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportStats {
    /// Total bytes written to the artifact
    pub bytes_written: u64,
}

/// Serializes a data source into an encrypted artifact on disk.
///
/// Implementations must poll `cancel` between units of work so cancellation
/// latency stays small during large exports, and must not leave a partial
/// file behind a successful return (partial files behind a *failed* return
/// are fine; the job deletes them).
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Materialize the artifact for `source` at `destination`.
    async fn export(
        &self,
        secret: &ExportSecret,
        source: &SourceId,
        destination: &Path,
        passphrase: &Passphrase,
        cancel: &CancellationToken,
    ) -> Result<ExportStats, ExportError>;
}

/// Access to the environment the job runs against.
///
/// The job validates these preconditions before any work starts; a missing
/// secret or unreadable source is a configuration error, never retried.
pub trait ExportEnvironment: Send + Sync {
    /// Resolve the encryption key material, if available
    fn export_secret(&self) -> Option<ExportSecret>;

    /// Whether the data source is currently open and readable
    fn source_readable(&self, source: &SourceId) -> bool;

    /// Expected artifact size for `source`, if the environment can estimate
    /// it. Used for the disk-space preflight; `None` skips the check.
    fn estimated_artifact_size(&self, source: &SourceId) -> Option<u64> {
        let _ = source;
        None
    }
}
