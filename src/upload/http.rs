//! HTTP implementation of the upload client.
//!
//! Negotiation is a two-step exchange modeled on resumable-upload CDNs:
//! fetch the upload form from the endpoint, then open a resumable session
//! at the form's signed location and read the session URL from the
//! `Location` header. The transfer is a single PUT of the exact artifact
//! length, streamed in bounded chunks so the cancellation token is observed
//! with sub-second latency even on large artifacts.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Body;
use reqwest::header::{CONTENT_LENGTH, LOCATION};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{ByteSource, UploadClient, UploadForm, UploadParameters};
use crate::error::UploadApiError;

/// Upload client speaking HTTP to a resumable-upload endpoint
#[derive(Clone, Debug)]
pub struct HttpUploadClient {
    http: reqwest::Client,
    endpoint: Url,
    chunk_size: usize,
}

impl HttpUploadClient {
    /// Create a client for the given endpoint.
    ///
    /// `chunk_size` bounds how many bytes are read between cancellation
    /// checks during the transfer.
    pub fn new(endpoint: Url, chunk_size: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            chunk_size,
        }
    }

    /// Create a client reusing an existing reqwest client (connection pools,
    /// proxies, TLS configuration)
    pub fn with_client(http: reqwest::Client, endpoint: Url, chunk_size: usize) -> Self {
        Self {
            http,
            endpoint,
            chunk_size,
        }
    }

    fn form_url(&self) -> Result<Url, UploadApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| UploadApiError::Transport("endpoint URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["upload", "form"]);
        Ok(url)
    }
}

#[async_trait]
impl UploadClient for HttpUploadClient {
    async fn negotiate_upload(&self) -> Result<UploadParameters, UploadApiError> {
        // Step 1: fetch the upload form
        let form_url = self.form_url()?;
        tracing::debug!(url = %form_url, "Requesting upload form");

        let resp = self
            .http
            .get(form_url)
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let form: UploadForm = resp
            .json()
            .await
            .map_err(|e| UploadApiError::Transport(format!("invalid upload form response: {e}")))?;

        // Step 2: open the resumable session at the signed location
        let mut session_req = self.http.post(form.signed_upload_location.clone());
        for (name, value) in &form.headers {
            session_req = session_req.header(name, value);
        }
        let resp = session_req.send().await.map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let status = resp.status().as_u16();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| UploadApiError::Status {
                code: status,
                message: "resumable session response missing Location header".into(),
            })?;

        // The Location header may be relative to the signed location
        let resumable_url = form
            .signed_upload_location
            .join(location)
            .map_err(|e| UploadApiError::Status {
                code: status,
                message: format!("unparseable resumable upload URL: {e}"),
            })?;

        tracing::debug!(cdn = form.cdn_number, key = %form.key, "Negotiated upload parameters");
        Ok(UploadParameters {
            form,
            resumable_url,
        })
    }

    async fn stream_upload(
        &self,
        params: &UploadParameters,
        source: ByteSource,
        byte_len: u64,
        cancel: &CancellationToken,
    ) -> Result<(), UploadApiError> {
        if cancel.is_cancelled() {
            return Err(UploadApiError::Cancelled);
        }

        // Chunked body with a cancellation check between reads, so aborting
        // a large transfer does not wait for the whole PUT to fail
        let guard = cancel.clone();
        let stream = ReaderStream::with_capacity(source, self.chunk_size).map(move |chunk| {
            if guard.is_cancelled() {
                Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "upload cancelled",
                ))
            } else {
                chunk
            }
        });

        let mut req = self
            .http
            .put(params.resumable_url.clone())
            .header(CONTENT_LENGTH, byte_len)
            .body(Body::wrap_stream(stream));
        for (name, value) in &params.form.headers {
            req = req.header(name, value);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(_) if cancel.is_cancelled() => return Err(UploadApiError::Cancelled),
            Err(e) => return Err(transport_error(e)),
        };
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        tracing::debug!(bytes = byte_len, key = %params.form.key, "Streamed artifact to endpoint");
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> UploadApiError {
    UploadApiError::Transport(e.to_string())
}

async fn status_error(resp: reqwest::Response) -> UploadApiError {
    let code = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    UploadApiError::Status { code, message }
}
