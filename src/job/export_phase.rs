//! Export phase — materialize the artifact via the Exporter port.

use tokio_util::sync::CancellationToken;

use crate::artifact::TemporaryArtifact;
use crate::error::Result;
use crate::exporter::{ExportStats, Exporter};
use crate::types::{ExportSecret, JobSpec};

/// Run the exporter against the temporary artifact path.
///
/// On any failure the partially-written artifact is deleted before this
/// returns, so a following attempt starts from a clean slate. The exporter's
/// error maps one-to-one onto the crate taxonomy; classification into
/// retryable/permanent happens once, at the attempt boundary.
pub(super) async fn run_export(
    exporter: &dyn Exporter,
    secret: &ExportSecret,
    spec: &JobSpec,
    artifact: &mut TemporaryArtifact,
    cancel: &CancellationToken,
) -> Result<ExportStats> {
    tracing::info!(
        source_id = %spec.source_id,
        path = %artifact.path().display(),
        "Beginning export to temporary artifact"
    );

    let result = exporter
        .export(
            secret,
            &spec.source_id,
            artifact.path(),
            &spec.passphrase,
            cancel,
        )
        .await;

    match result {
        Ok(stats) => {
            tracing::info!(
                source_id = %spec.source_id,
                bytes = stats.bytes_written,
                "Export to temporary artifact successful"
            );
            Ok(stats)
        }
        Err(e) => {
            tracing::warn!(
                source_id = %spec.source_id,
                error = %e,
                "Export failed, removing partial artifact"
            );
            artifact.cleanup();
            Err(e.into())
        }
    }
}
