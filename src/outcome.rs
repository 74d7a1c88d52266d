//! Attempt outcomes and the job state machine.
//!
//! One attempt moves `NotStarted -> Running` and ends in exactly one of
//! `Succeeded`, `FailedRetryable`, or `FailedPermanent`. `Succeeded` and
//! `FailedPermanent` are terminal; `FailedRetryable` reports upward and the
//! runner decides whether a fresh attempt re-enters `NotStarted`, bounded by
//! the attempt count and lifespan in [`crate::config`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::retry::IsRetryable;

/// Lifecycle state of a job attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No attempt has started yet
    NotStarted,
    /// An attempt is executing
    Running,
    /// The job finished; artifact uploaded or handed off
    Succeeded,
    /// The attempt failed with a transient cause; the runner may retry
    FailedRetryable,
    /// The job failed with a permanent cause; no further attempts
    FailedPermanent,
}

impl JobState {
    /// Terminal states end the job: no further attempts regardless of policy
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::FailedPermanent)
    }
}

/// What a successful attempt produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutput {
    /// The artifact was streamed to the remote endpoint and the local
    /// temporary copy removed
    Uploaded {
        /// Bytes transferred
        byte_len: u64,
    },
    /// The artifact is the local deliverable, left at `path` for the caller
    /// to relocate
    LocalArtifact {
        /// Where the deliverable lives
        path: PathBuf,
        /// Size the exporter reported
        byte_len: u64,
    },
}

/// Tagged result of one `run()` invocation
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The attempt completed; see [`JobOutput`] for what it produced
    Succeeded(JobOutput),
    /// Transient failure; the runner may schedule another attempt
    RetryableFailure(Error),
    /// Permanent failure; the job is finished, no retry can help
    PermanentFailure(Error),
}

impl AttemptOutcome {
    /// Classify an error into a retryable or permanent failure outcome
    pub fn from_error(error: Error) -> Self {
        if error.is_retryable() {
            AttemptOutcome::RetryableFailure(error)
        } else {
            AttemptOutcome::PermanentFailure(error)
        }
    }

    /// The state this outcome leaves the job in
    pub fn state(&self) -> JobState {
        match self {
            AttemptOutcome::Succeeded(_) => JobState::Succeeded,
            AttemptOutcome::RetryableFailure(_) => JobState::FailedRetryable,
            AttemptOutcome::PermanentFailure(_) => JobState::FailedPermanent,
        }
    }

    /// The failure cause, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            AttemptOutcome::Succeeded(_) => None,
            AttemptOutcome::RetryableFailure(e) | AttemptOutcome::PermanentFailure(e) => Some(e),
        }
    }
}

/// Record of one attempt, emitted by the runner for observability.
///
/// Serializable so callers can persist or report attempt histories; carries
/// the machine-readable cause code rather than the error itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// 1-based attempt number
    pub attempt: u32,
    /// State the attempt ended in
    pub state: JobState,
    /// Machine-readable cause code for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Human-readable failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the attempt started
    pub started_at: DateTime<Utc>,
    /// When the attempt finished
    pub finished_at: DateTime<Utc>,
}

impl AttemptReport {
    /// Build a report from an attempt's outcome
    pub fn new(
        attempt: u32,
        outcome: &AttemptOutcome,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            attempt,
            state: outcome.state(),
            cause: outcome.error().map(|e| e.cause_code().to_string()),
            message: outcome.error().map(|e| e.to_string()),
            started_at,
            finished_at,
        }
    }
}
