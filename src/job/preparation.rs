//! Preparation — precondition validation and disk-space preflight.
//!
//! These checks run before any filesystem or network work. Failures here
//! are configuration/environment errors: retrying without operator
//! intervention cannot fix them, so all of them classify as permanent.

use std::path::Path;

use crate::error::{Error, Result};
use crate::exporter::ExportEnvironment;
use crate::types::{ExportSecret, JobSpec};
use crate::utils::get_available_space;

/// Confirm the job can plausibly succeed before any work starts.
///
/// Validates the spec's required fields, resolves the encryption key
/// material, and checks the data source is readable. Returns the resolved
/// secret for the export phase.
pub(super) fn validate_preconditions(
    spec: &JobSpec,
    environment: &dyn ExportEnvironment,
) -> Result<ExportSecret> {
    spec.validate()?;

    let secret = environment.export_secret().ok_or_else(|| {
        tracing::warn!(source_id = %spec.source_id, "Encryption key material is not resolvable");
        Error::config(
            "encryption key material is not resolvable",
            "export_secret",
        )
    })?;

    if !environment.source_readable(&spec.source_id) {
        tracing::warn!(source_id = %spec.source_id, "Data source is not readable");
        return Err(Error::config(
            format!("source {} is not in a readable state", spec.source_id),
            "source_id",
        ));
    }

    Ok(secret)
}

/// Refuse to start an export that cannot fit on disk.
///
/// With no size estimate the check is skipped; the exporter will still
/// surface a real out-of-space condition mid-write. A failure to *measure*
/// available space is logged and skipped rather than failing the attempt:
/// the preflight is advisory, the export itself is authoritative.
pub(super) fn preflight_disk_space(temp_dir: &Path, estimate: Option<u64>) -> Result<()> {
    let Some(required) = estimate else {
        return Ok(());
    };

    // The temp dir may not exist yet; measure the nearest existing ancestor
    let mut probe = temp_dir;
    while !probe.exists() {
        match probe.parent() {
            Some(parent) => probe = parent,
            None => return Ok(()),
        }
    }

    match get_available_space(probe) {
        Ok(available) if available < required => {
            tracing::warn!(
                required,
                available,
                temp_dir = %temp_dir.display(),
                "Insufficient disk space for export artifact"
            );
            Err(Error::InsufficientSpace {
                required,
                available,
            })
        }
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not check disk space, continuing without preflight");
            Ok(())
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEnvironment;
    use crate::types::{Destination, Passphrase};
    use tempfile::TempDir;

    fn local_spec() -> JobSpec {
        JobSpec::new("chat-1", Passphrase::new("pw"), Destination::Local).unwrap()
    }

    #[test]
    fn preconditions_pass_with_secret_and_readable_source() {
        let env = FakeEnvironment::ready();
        let secret = validate_preconditions(&local_spec(), &env).unwrap();
        assert!(!secret.reveal().is_empty());
    }

    #[test]
    fn missing_secret_is_a_config_error() {
        let env = FakeEnvironment {
            secret: None,
            ..FakeEnvironment::ready()
        };
        let err = validate_preconditions(&local_spec(), &env).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn unreadable_source_is_a_config_error() {
        let env = FakeEnvironment {
            readable: false,
            ..FakeEnvironment::ready()
        };
        let err = validate_preconditions(&local_spec(), &env).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn preflight_without_estimate_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        preflight_disk_space(dir.path(), None).unwrap();
    }

    #[test]
    fn preflight_with_reasonable_estimate_passes() {
        let dir = TempDir::new().unwrap();
        preflight_disk_space(dir.path(), Some(1024)).unwrap();
    }

    #[test]
    fn preflight_with_absurd_estimate_reports_insufficient_space() {
        let dir = TempDir::new().unwrap();
        let err = preflight_disk_space(dir.path(), Some(u64::MAX)).unwrap_err();
        assert!(matches!(err, Error::InsufficientSpace { .. }));
    }

    #[test]
    fn preflight_probes_nearest_existing_ancestor_for_missing_temp_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("not/created/yet");
        // Should measure the tempdir's filesystem, not error on the missing path
        preflight_disk_space(&missing, Some(1024)).unwrap();
    }
}
