//! Job runner — drives a job through attempts until a terminal state.
//!
//! The job itself never owns retry scheduling; this runner does. It invokes
//! [`ExportUploadJob::run`], reads the [`AttemptOutcome`], and re-invokes on
//! retryable failures with exponential backoff, bounded by the configured
//! maximum attempt count and a wall-clock lifespan measured from first
//! enqueue. Past the lifespan deadline any further attempt is refused and
//! the job finalizes as failed-permanent with a lifespan-exceeded cause.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::{JobConfig, RetryConfig};
use crate::error::Error;
use crate::job::ExportUploadJob;
use crate::outcome::{AttemptOutcome, AttemptReport, JobOutput, JobState};
use crate::retry::backoff_delay;

/// Final result of driving a job to completion
#[derive(Debug)]
pub struct JobResult {
    /// Terminal state: `Succeeded` or `FailedPermanent`
    pub state: JobState,
    /// What the successful attempt produced
    pub output: Option<JobOutput>,
    /// The final failure cause, when the job did not succeed
    pub error: Option<Error>,
    /// Per-attempt history, in order
    pub attempts: Vec<AttemptReport>,
}

/// Drives jobs through their retry policy
pub struct JobRunner {
    retry: RetryConfig,
    lifespan: Duration,
    clock: Arc<dyn Clock>,
}

impl JobRunner {
    /// Create a runner from the job configuration
    pub fn new(config: &JobConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            retry: config.retry.clone(),
            lifespan: config.lifespan,
            clock,
        }
    }

    /// Run the job until it reaches a terminal state.
    ///
    /// The first invocation counts as the enqueue instant for the lifespan
    /// deadline. Returns the terminal state, the success output or final
    /// failure cause, and the full attempt history.
    pub async fn run_to_completion(
        &self,
        job: &ExportUploadJob,
        cancel: &CancellationToken,
    ) -> JobResult {
        let enqueued_at = self.clock.now();
        let mut attempts = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            // Lifespan gate: refuse the attempt outright once the deadline
            // has passed, whatever the retry budget says
            let elapsed = (self.clock.now() - enqueued_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if elapsed > self.lifespan {
                let error = Error::LifespanExceeded;
                tracing::error!(
                    source_id = %job.spec().source_id,
                    elapsed_secs = elapsed.as_secs(),
                    lifespan_secs = self.lifespan.as_secs(),
                    "Job lifespan exceeded, refusing further attempts"
                );
                let now = self.clock.now();
                attempts.push(AttemptReport::new(
                    attempt,
                    &AttemptOutcome::PermanentFailure(Error::LifespanExceeded),
                    now,
                    now,
                ));
                return JobResult {
                    state: JobState::FailedPermanent,
                    output: None,
                    error: Some(error),
                    attempts,
                };
            }

            let started_at = self.clock.now();
            let outcome = job.run(cancel).await;
            let finished_at = self.clock.now();
            attempts.push(AttemptReport::new(attempt, &outcome, started_at, finished_at));

            match outcome {
                AttemptOutcome::Succeeded(output) => {
                    if attempt > 1 {
                        tracing::info!(
                            source_id = %job.spec().source_id,
                            attempts = attempt,
                            "Job succeeded after retry"
                        );
                    }
                    return JobResult {
                        state: JobState::Succeeded,
                        output: Some(output),
                        error: None,
                        attempts,
                    };
                }
                AttemptOutcome::PermanentFailure(error) => {
                    tracing::error!(
                        source_id = %job.spec().source_id,
                        error = %error,
                        "Job failed permanently and will not be retried"
                    );
                    return JobResult {
                        state: JobState::FailedPermanent,
                        output: None,
                        error: Some(error),
                        attempts,
                    };
                }
                AttemptOutcome::RetryableFailure(error) => {
                    if attempt >= self.retry.max_attempts {
                        tracing::error!(
                            source_id = %job.spec().source_id,
                            error = %error,
                            attempts = attempt,
                            "Job failed after all retry attempts exhausted"
                        );
                        return JobResult {
                            state: JobState::FailedPermanent,
                            output: None,
                            error: Some(error),
                            attempts,
                        };
                    }

                    let delay = backoff_delay(&self.retry, attempt - 1);
                    tracing::warn!(
                        source_id = %job.spec().source_id,
                        error = %error,
                        attempt = attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis(),
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
