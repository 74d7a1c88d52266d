//! # backup-uplink
//!
//! Durable export-and-upload job library for encrypted backup artifacts.
//!
//! ## Design Philosophy
//!
//! backup-uplink is designed to be:
//! - **Collaborator-driven** - The backup format (Exporter) and the wire
//!   protocol (UploadClient) are ports; this crate owns the job lifecycle
//! - **Classified failure handling** - Every failure maps into one taxonomy
//!   member, decided once at the phase boundary: permanent causes are never
//!   retried, transient causes are retried with bounded backoff
//! - **Clean on every exit** - No temporary artifact survives an attempt,
//!   except a local-destination deliverable on success
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use backup_uplink::{
//!     Destination, ExportUploadJob, HttpUploadClient, JobConfig, JobDeps, JobRunner,
//!     JobSpec, Passphrase, SystemClock,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! # use backup_uplink::{ExportEnvironment, ExportSecret, SourceId};
//! # struct MyEnvironment;
//! # impl ExportEnvironment for MyEnvironment {
//! #     fn export_secret(&self) -> Option<ExportSecret> {
//! #         Some(ExportSecret::new(vec![0u8; 32]))
//! #     }
//! #     fn source_readable(&self, _source: &SourceId) -> bool {
//! #         true
//! #     }
//! # }
//! # async fn example(
//! #     exporter: Arc<dyn backup_uplink::Exporter>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Url::parse("https://storage.example.com/v1")?;
//! let spec = JobSpec::new(
//!     "chat-42",
//!     Passphrase::new("correct horse battery staple"),
//!     Destination::Remote(endpoint.clone()),
//! )?;
//! let config = JobConfig::default();
//!
//! let deps = JobDeps {
//!     exporter,
//!     upload_client: Arc::new(HttpUploadClient::new(endpoint, config.upload_chunk_size)),
//!     environment: Arc::new(MyEnvironment),
//!     clock: Arc::new(SystemClock),
//! };
//!
//! let job = ExportUploadJob::new(spec, config.clone(), deps);
//! let runner = JobRunner::new(&config, Arc::new(SystemClock));
//! let result = runner.run_to_completion(&job, &CancellationToken::new()).await;
//! println!("final state: {:?}", result.state);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Temporary artifact lifecycle
pub mod artifact;
/// Clock abstraction
pub mod clock;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Exporter port and environment checks
pub mod exporter;
/// Export-and-upload job core
pub mod job;
/// Attempt outcomes and the job state machine
pub mod outcome;
/// Retry classification and backoff
pub mod retry;
/// Job runner driving attempts to a terminal state
pub mod runner;
/// Recurring-export schedule model
pub mod schedule;
/// Core types (spec, identifiers, secrets)
pub mod types;
/// Upload client port and HTTP implementation
pub mod upload;
/// Utility functions
pub mod utils;

// unwrap/expect are acceptable in test support code
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use artifact::TemporaryArtifact;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{JobConfig, RetryConfig};
pub use error::{Error, ExportError, Result, UploadApiError};
pub use exporter::{ExportEnvironment, ExportStats, Exporter};
pub use job::{ExportUploadJob, JobDeps};
pub use outcome::{AttemptOutcome, AttemptReport, JobOutput, JobState};
pub use retry::IsRetryable;
pub use runner::{JobResult, JobRunner};
pub use schedule::{ExportFrequency, ExportSchedule};
pub use types::{Destination, ExportSecret, JobSpec, Passphrase, SourceId};
pub use upload::{
    ByteSource, UploadClient, UploadForm, UploadParameters, http::HttpUploadClient,
};
