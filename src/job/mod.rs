//! Export-and-upload job -- core lifecycle of a single attempt.
//!
//! Split into focused submodules:
//! - [`preparation`] - Precondition validation and disk-space preflight
//! - [`export_phase`] - Artifact materialization via the Exporter port
//! - [`upload_phase`] - Parameter negotiation and resumable streaming
//!
//! One attempt is strictly sequential: prepare, export, upload (remote
//! destinations only), clean up. Every failure is classified exactly once
//! at its phase boundary, and the temporary artifact is removed on every
//! exit path except local-deliverable success.

mod export_phase;
mod preparation;
mod upload_phase;


use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::artifact::TemporaryArtifact;
use crate::clock::Clock;
use crate::config::JobConfig;
use crate::error::Result;
use crate::exporter::{ExportEnvironment, Exporter};
use crate::outcome::{AttemptOutcome, JobOutput, JobState};
use crate::types::{Destination, JobSpec};
use crate::upload::UploadClient;

/// Collaborators injected into the job.
///
/// Everything the job talks to comes through this bundle, so tests can
/// substitute fakes without any process-wide state.
#[derive(Clone)]
pub struct JobDeps {
    /// Serializes the source into the encrypted artifact
    pub exporter: Arc<dyn Exporter>,
    /// Negotiates and streams the remote upload
    pub upload_client: Arc<dyn UploadClient>,
    /// Key material and source-state checks
    pub environment: Arc<dyn ExportEnvironment>,
    /// Time source for artifact naming
    pub clock: Arc<dyn Clock>,
}

/// A durable export-and-upload job.
///
/// Owns one immutable [`JobSpec`] and executes one attempt per [`run`]
/// call; the runner (see [`crate::runner`]) owns attempt counting and the
/// lifespan deadline and re-invokes `run` on retryable failures.
///
/// [`run`]: ExportUploadJob::run
pub struct ExportUploadJob {
    spec: JobSpec,
    config: JobConfig,
    deps: JobDeps,
    state: Mutex<JobState>,
}

impl ExportUploadJob {
    /// Create a job for the given spec
    pub fn new(spec: JobSpec, config: JobConfig, deps: JobDeps) -> Self {
        Self {
            spec,
            config,
            deps,
            state: Mutex::new(JobState::NotStarted),
        }
    }

    /// The spec this job was created with
    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Current lifecycle state (the last attempt's final state once an
    /// attempt has finished)
    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: JobState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Execute one attempt.
    ///
    /// Never panics on collaborator failure and never returns an `Err`:
    /// every failure is caught at its phase boundary, classified, and
    /// reported as part of the [`AttemptOutcome`]. After this returns, no
    /// temporary artifact from this attempt remains on disk unless the
    /// destination is local and the attempt succeeded.
    pub async fn run(&self, cancel: &CancellationToken) -> AttemptOutcome {
        self.set_state(JobState::Running);
        tracing::info!(
            source_id = %self.spec.source_id,
            destination = if self.spec.destination.is_remote() { "remote" } else { "local" },
            "Starting export job attempt"
        );

        let outcome = match self.run_attempt(cancel).await {
            Ok(output) => AttemptOutcome::Succeeded(output),
            Err(e) => {
                tracing::warn!(
                    source_id = %self.spec.source_id,
                    error = %e,
                    cause = e.cause_code(),
                    "Export job attempt failed"
                );
                AttemptOutcome::from_error(e)
            }
        };

        self.set_state(outcome.state());
        outcome
    }

    async fn run_attempt(&self, cancel: &CancellationToken) -> Result<JobOutput> {
        // Preparation: preconditions first, so configuration problems never
        // touch the filesystem
        let secret = preparation::validate_preconditions(&self.spec, &*self.deps.environment)?;
        preparation::preflight_disk_space(
            &self.config.temp_dir,
            self.deps.environment.estimated_artifact_size(&self.spec.source_id),
        )?;

        let mut artifact = TemporaryArtifact::allocate(
            &self.config.temp_dir,
            &self.spec.source_id,
            &*self.deps.clock,
        )?;

        // Export: materialize the artifact; on failure the phase removes the
        // partial file before returning
        let stats = export_phase::run_export(
            &*self.deps.exporter,
            &secret,
            &self.spec,
            &mut artifact,
            cancel,
        )
        .await?;

        match &self.spec.destination {
            Destination::Local => {
                // The artifact is the deliverable; the caller owns relocation
                let path = artifact.persist();
                tracing::info!(
                    source_id = %self.spec.source_id,
                    path = %path.display(),
                    bytes = stats.bytes_written,
                    "Export destination is local; artifact handed off"
                );
                Ok(JobOutput::LocalArtifact {
                    path,
                    byte_len: stats.bytes_written,
                })
            }
            Destination::Remote(_) => {
                let byte_len = upload_phase::run_upload(
                    &*self.deps.upload_client,
                    &mut artifact,
                    cancel,
                )
                .await?;

                // The artifact was transient; remove it now that the bytes
                // are at the endpoint
                artifact.cleanup();
                tracing::info!(
                    source_id = %self.spec.source_id,
                    bytes = byte_len,
                    "Export job attempt finished successfully"
                );
                Ok(JobOutput::Uploaded { byte_len })
            }
        }
    }
}
