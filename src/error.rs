//! Error types for backup-uplink
//!
//! This module provides the failure taxonomy for the export-and-upload job:
//! - Permanent environment errors (permission denial, insufficient space)
//! - Transient I/O and network errors
//! - Endpoint-level authorization/quota rejections
//! - Configuration errors detected before any work starts
//!
//! Every failure surfaced by a collaborator is mapped into exactly one of
//! these variants at the phase boundary; retry classification lives in
//! [`crate::retry::IsRetryable`].

use thiserror::Error;

/// Result type alias for backup-uplink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for backup-uplink
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues, and the Display
/// messages for permanent variants are written to be operator-actionable.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage permission was denied while creating or writing the artifact
    #[error("storage permission denied: {0} (grant storage access and re-run)")]
    PermissionDenied(String),

    /// Insufficient disk space for the export artifact
    #[error(
        "insufficient disk space: need {required} bytes, have {available} bytes (free up space and re-run)"
    )]
    InsufficientSpace {
        /// Number of bytes required for the operation
        required: u64,
        /// Number of bytes currently available on disk
        available: u64,
    },

    /// I/O error during export or transfer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-layer network error (connect, timeout, reset mid-transfer)
    #[error("network error: {0}")]
    Network(String),

    /// The remote endpoint rejected the request at the application level
    /// (invalid credentials, quota exhausted, payload too large)
    #[error("endpoint rejected request: {0} (check credentials and quota)")]
    AuthorizationOrQuota(String),

    /// Missing or invalid required configuration
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration field that caused the error (e.g., "passphrase")
        field: Option<String>,
    },

    /// The cancellation signal was observed mid-phase
    #[error("operation cancelled")]
    Cancelled,

    /// The job's wall-clock lifespan elapsed; the runner refuses further attempts
    #[error("job lifespan exceeded (no further attempts permitted)")]
    LifespanExceeded,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failures the exporter collaborator can surface.
///
/// Each variant maps onto exactly one member of the crate taxonomy, so the
/// export phase classifies with a plain `From` conversion instead of
/// inspecting error internals.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Storage permission denied while creating or writing the artifact
    #[error("storage permission denied: {0}")]
    PermissionDenied(String),

    /// Not enough disk space to materialize the artifact
    #[error("insufficient storage: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        /// Bytes the export would need
        required: u64,
        /// Bytes currently available
        available: u64,
    },

    /// Any other I/O failure (disk error, transient filesystem fault)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The exporter observed the cancellation token and aborted
    #[error("export cancelled")]
    Cancelled,
}

impl From<ExportError> for Error {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::PermissionDenied(msg) => Error::PermissionDenied(msg),
            ExportError::InsufficientSpace {
                required,
                available,
            } => Error::InsufficientSpace {
                required,
                available,
            },
            ExportError::Io(io) => Error::Io(io),
            ExportError::Cancelled => Error::Cancelled,
        }
    }
}

/// Failures the upload client collaborator can surface.
#[derive(Debug, Error)]
pub enum UploadApiError {
    /// Transport-layer failure: connect, timeout, reset mid-transfer
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("endpoint returned status {code}: {message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body or status text
        message: String,
    },

    /// The cancellation token fired during the request
    #[error("upload cancelled")]
    Cancelled,
}

impl UploadApiError {
    /// Classify this failure into the crate taxonomy.
    ///
    /// Transport faults are retryable network errors. Endpoint statuses
    /// split into authorization/quota rejections (permanent) and server-side
    /// trouble (retryable); anything else fails closed as unclassified.
    pub fn classify(self) -> Error {
        match self {
            UploadApiError::Transport(msg) => Error::Network(msg),
            UploadApiError::Status { code, message } => match code {
                // The endpoint refused us: credentials, quota, payload size
                401 | 402 | 403 | 413 | 429 => {
                    Error::AuthorizationOrQuota(format!("{code}: {message}"))
                }
                // Server-side trouble or a timeout the endpoint reported
                408 | 500..=599 => Error::Network(format!("{code}: {message}")),
                _ => Error::Other(format!("unexpected endpoint status {code}: {message}")),
            },
            UploadApiError::Cancelled => Error::Cancelled,
        }
    }
}

impl Error {
    /// Create a configuration error for a named field
    pub fn config(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Machine-readable cause code, stable across Display changes.
    ///
    /// Attempt reports carry this so callers can key on the cause without
    /// parsing messages.
    pub fn cause_code(&self) -> &'static str {
        match self {
            Error::PermissionDenied(_) => "permission_denied",
            Error::InsufficientSpace { .. } => "insufficient_space",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::AuthorizationOrQuota(_) => "authorization_or_quota",
            Error::Config { .. } => "config_error",
            Error::Cancelled => "cancelled",
            Error::LifespanExceeded => "lifespan_exceeded",
            Error::Other(_) => "internal_error",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_space_message_includes_byte_counts() {
        let err = Error::InsufficientSpace {
            required: 1_048_576,
            available: 512,
        };
        let msg = err.to_string();
        assert!(
            msg.contains("1048576"),
            "message should contain required bytes"
        );
        assert!(msg.contains("512"), "message should contain available bytes");
    }

    #[test]
    fn permission_denied_message_is_operator_actionable() {
        let err = Error::PermissionDenied("cannot write /backups".into());
        let msg = err.to_string();
        assert!(msg.contains("cannot write /backups"));
        assert!(
            msg.contains("grant storage access"),
            "permanent failures should tell the operator what to do"
        );
    }

    #[test]
    fn config_error_displays_message() {
        let err = Error::config("passphrase must not be empty", "passphrase");
        assert_eq!(
            err.to_string(),
            "configuration error: passphrase must not be empty"
        );
        match err {
            Error::Config { field, .. } => assert_eq!(field.as_deref(), Some("passphrase")),
            _ => panic!("expected Config variant"),
        }
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.cause_code(), "io_error");
    }

    #[test]
    fn export_errors_map_onto_the_crate_taxonomy() {
        let e: Error = ExportError::PermissionDenied("no write access".into()).into();
        assert!(matches!(e, Error::PermissionDenied(_)));

        let e: Error = ExportError::InsufficientSpace {
            required: 10,
            available: 1,
        }
        .into();
        assert!(matches!(
            e,
            Error::InsufficientSpace {
                required: 10,
                available: 1
            }
        ));

        let e: Error = ExportError::Io(std::io::Error::other("disk fault")).into();
        assert!(matches!(e, Error::Io(_)));

        let e: Error = ExportError::Cancelled.into();
        assert!(matches!(e, Error::Cancelled));
    }

    #[test]
    fn upload_transport_errors_classify_as_network() {
        let e = UploadApiError::Transport("connection reset".into()).classify();
        assert!(matches!(e, Error::Network(_)));
    }

    #[test]
    fn upload_auth_and_quota_statuses_classify_as_permanent_rejection() {
        for code in [401, 402, 403, 413, 429] {
            let e = UploadApiError::Status {
                code,
                message: "no".into(),
            }
            .classify();
            assert!(
                matches!(e, Error::AuthorizationOrQuota(_)),
                "status {code} should classify as authorization/quota"
            );
        }
    }

    #[test]
    fn upload_server_errors_classify_as_retryable_network() {
        for code in [408, 500, 502, 503] {
            let e = UploadApiError::Status {
                code,
                message: "later".into(),
            }
            .classify();
            assert!(
                matches!(e, Error::Network(_)),
                "status {code} should classify as network"
            );
        }
    }

    #[test]
    fn unexpected_upload_statuses_fail_closed() {
        let e = UploadApiError::Status {
            code: 418,
            message: "teapot".into(),
        }
        .classify();
        assert!(
            matches!(e, Error::Other(_)),
            "unknown statuses must classify as unclassified (permanent)"
        );
    }

    #[test]
    fn upload_cancellation_classifies_as_cancelled() {
        assert!(matches!(
            UploadApiError::Cancelled.classify(),
            Error::Cancelled
        ));
    }

    #[test]
    fn every_variant_has_a_distinct_cause_code() {
        let variants = vec![
            Error::PermissionDenied("x".into()),
            Error::InsufficientSpace {
                required: 1,
                available: 0,
            },
            Error::Io(std::io::Error::other("x")),
            Error::Network("x".into()),
            Error::AuthorizationOrQuota("x".into()),
            Error::Config {
                message: "x".into(),
                field: None,
            },
            Error::Cancelled,
            Error::LifespanExceeded,
            Error::Other("x".into()),
        ];
        let codes: std::collections::HashSet<_> = variants.iter().map(|e| e.cause_code()).collect();
        assert_eq!(codes.len(), variants.len(), "cause codes must be unique");
    }
}
