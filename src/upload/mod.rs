//! Upload client port — negotiation and resumable streaming.
//!
//! The upload happens in two independently-failing steps: a short parameter
//! negotiation (which can be rejected for authorization or quota reasons)
//! and the streaming transfer itself (which fails for transport reasons).
//! Keeping the steps separate is what lets the retry classifier tell "do
//! not retry, credentials invalid" apart from "retry, network dropped
//! mid-transfer".
//!
//! [`http::HttpUploadClient`] is the provided implementation; tests and
//! embedders with their own wire protocol can implement [`UploadClient`]
//! directly.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::UploadApiError;

/// Upload form returned by the endpoint during negotiation.
///
/// Carries everything the transfer step needs to address the upload:
/// the storage key, any headers the endpoint requires echoed back, and the
/// signed location used to open the resumable session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadForm {
    /// CDN the artifact lands on
    pub cdn_number: u32,
    /// Storage key for the uploaded artifact
    pub key: String,
    /// Headers the endpoint requires on the resumable session request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Signed URL used to open the resumable upload session
    pub signed_upload_location: Url,
}

/// `(form, resumable URL)` pair negotiated for one upload attempt.
///
/// Short-lived: scoped to a single attempt and never persisted.
#[derive(Clone, Debug)]
pub struct UploadParameters {
    /// The negotiated upload form
    pub form: UploadForm,
    /// Resumable endpoint the artifact bytes stream to
    pub resumable_url: Url,
}

/// Byte source streamed during the transfer step
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin + 'static>;

/// Negotiates upload parameters and streams artifact bytes to the endpoint.
#[async_trait]
pub trait UploadClient: Send + Sync {
    /// Request upload parameters for one attempt
    async fn negotiate_upload(&self) -> Result<UploadParameters, UploadApiError>;

    /// Stream exactly `byte_len` bytes from `source` to the negotiated
    /// resumable endpoint. Implementations must transfer in bounded chunks
    /// and observe `cancel` between them.
    async fn stream_upload(
        &self,
        params: &UploadParameters,
        source: ByteSource,
        byte_len: u64,
        cancel: &CancellationToken,
    ) -> Result<(), UploadApiError>;
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_form_deserializes_with_default_headers() {
        let json = r#"{
            "cdn_number": 3,
            "key": "backups/abc123",
            "signed_upload_location": "https://cdn.example.com/session/new"
        }"#;
        let form: UploadForm = serde_json::from_str(json).unwrap();
        assert_eq!(form.cdn_number, 3);
        assert_eq!(form.key, "backups/abc123");
        assert!(form.headers.is_empty());
    }

    #[test]
    fn upload_form_round_trips_with_headers() {
        let form = UploadForm {
            cdn_number: 1,
            key: "backups/xyz".into(),
            headers: HashMap::from([("x-session-token".to_string(), "tok".to_string())]),
            signed_upload_location: Url::parse("https://cdn.example.com/session/new").unwrap(),
        };
        let json = serde_json::to_string(&form).unwrap();
        let back: UploadForm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }
}
