//! Retry classification and backoff
//!
//! This module decides which failures are worth retrying and how long to
//! wait between attempts. The classification table is the heart of the job's
//! state machine: permanent causes (permission denial, insufficient space,
//! endpoint rejection, bad configuration) terminate the job immediately,
//! transient causes (generic I/O, transport faults, cancellation) report
//! upward so the runner can schedule another attempt.
//!
//! Unknown failure modes fail closed: anything that cannot be positively
//! classified as transient is treated as permanent, so a misbehaving
//! collaborator cannot put the job into an indefinite retry loop.

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (disk hiccups, network timeouts, connection resets,
/// cancellation) should return `true`. Permanent failures (permission denied,
/// disk full, rejected credentials, bad configuration) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Permission problems require operator action; retrying cannot fix them
            Error::PermissionDenied(_) => false,
            // Disk space issues require user action to free space
            Error::InsufficientSpace { .. } => false,
            // Generic I/O failures during export or transfer are transient
            // (disk error, filesystem fault) and worth another attempt
            Error::Io(_) => true,
            // Transport-layer faults are the canonical retryable case
            Error::Network(_) => true,
            // The endpoint said no (credentials, quota); retrying with the
            // same request cannot change its mind
            Error::AuthorizationOrQuota(_) => false,
            // Configuration errors are permanent
            Error::Config { .. } => false,
            // Cancellation is transient from the job's perspective; whether a
            // fresh attempt actually runs is the runner's call
            Error::Cancelled => true,
            // Past the deadline, no attempt is permitted by definition
            Error::LifespanExceeded => false,
            // Unknown errors - fail closed and don't retry
            Error::Other(_) => false,
        }
    }
}

/// Compute the delay before the next retry attempt.
///
/// Exponential backoff: `initial_delay * multiplier^attempt`, capped at
/// `max_delay`, with optional uniform jitter between 1x and 2x the base
/// delay to prevent thundering herd.
///
/// `attempt` is zero-based: attempt 0 gets `initial_delay`.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.initial_delay.as_secs_f64() * config.backoff_multiplier.powi(attempt as i32);
    let capped = Duration::from_secs_f64(base).min(config.max_delay);
    if config.jitter {
        add_jitter(capped)
    } else {
        capped
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay is between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}
