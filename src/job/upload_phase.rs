//! Upload phase — negotiate parameters, then stream the artifact.
//!
//! The two sub-steps fail independently (authorization vs. transport) and
//! are classified independently; collapsing them would lose the distinction
//! between "do not retry, credentials invalid" and "retry, network dropped
//! mid-transfer". On either failure the artifact is deleted before this
//! returns.

use tokio_util::sync::CancellationToken;

use crate::artifact::TemporaryArtifact;
use crate::error::Result;
use crate::upload::UploadClient;

/// Negotiate upload parameters and stream the artifact's exact byte length
/// to the resumable endpoint. Returns the number of bytes transferred.
pub(super) async fn run_upload(
    client: &dyn UploadClient,
    artifact: &mut TemporaryArtifact,
    cancel: &CancellationToken,
) -> Result<u64> {
    // Sub-step 1: parameter negotiation
    let params = match client.negotiate_upload().await {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to negotiate upload parameters, removing artifact");
            artifact.cleanup();
            return Err(e.classify());
        }
    };
    tracing::info!(
        cdn = params.form.cdn_number,
        key = %params.form.key,
        "Negotiated upload parameters"
    );

    // Sub-step 2: stream the artifact
    let byte_len = match artifact.byte_len().await {
        Ok(len) => len,
        Err(e) => {
            artifact.cleanup();
            return Err(e);
        }
    };
    let file = match tokio::fs::File::open(artifact.path()).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open artifact for upload, removing it");
            artifact.cleanup();
            return Err(e.into());
        }
    };

    tracing::info!(bytes = byte_len, "Starting artifact upload");
    match client
        .stream_upload(&params, Box::new(file), byte_len, cancel)
        .await
    {
        Ok(()) => Ok(byte_len),
        Err(e) => {
            tracing::warn!(error = %e, "Artifact upload failed, removing artifact");
            artifact.cleanup();
            Err(e.classify())
        }
    }
}
