//! Shared fake collaborators for unit tests.
//!
//! The fakes run a queue of planned behaviors (one per call) and fall back
//! to a default plan when the queue is empty, so retry tests can script
//! "fail, fail, succeed" sequences without bespoke mock types per test.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::clock::ManualClock;
use crate::error::{ExportError, UploadApiError};
use crate::exporter::{ExportEnvironment, ExportStats, Exporter};
use crate::types::{ExportSecret, Passphrase, SourceId};
use crate::upload::{ByteSource, UploadClient, UploadForm, UploadParameters};

/// Environment fake with direct field control
pub(crate) struct FakeEnvironment {
    pub secret: Option<ExportSecret>,
    pub readable: bool,
    pub estimate: Option<u64>,
}

impl FakeEnvironment {
    /// Secret present, source readable, no size estimate
    pub fn ready() -> Self {
        Self {
            secret: Some(ExportSecret::new(b"key-material".to_vec())),
            readable: true,
            estimate: None,
        }
    }
}

impl ExportEnvironment for FakeEnvironment {
    fn export_secret(&self) -> Option<ExportSecret> {
        self.secret.clone()
    }

    fn source_readable(&self, _source: &SourceId) -> bool {
        self.readable
    }

    fn estimated_artifact_size(&self, _source: &SourceId) -> Option<u64> {
        self.estimate
    }
}

/// One planned exporter behavior
#[derive(Clone)]
pub(crate) enum ExportPlan {
    /// Write `payload` to the destination and report its length
    Succeed { payload: Vec<u8> },
    /// Fail with a storage permission error
    PermissionDenied,
    /// Fail with an out-of-space error
    InsufficientSpace,
    /// Write a partial file, then fail with a generic I/O error
    IoError,
    /// Write a partial file, then wait for the cancellation token and abort
    AwaitCancel,
}

/// Scriptable exporter fake
pub(crate) struct FakeExporter {
    fallback: ExportPlan,
    queue: Mutex<VecDeque<ExportPlan>>,
    pub calls: AtomicU32,
    /// Advance this clock on every call (for lifespan-deadline tests)
    advance: Option<(Arc<ManualClock>, chrono::Duration)>,
}

impl FakeExporter {
    pub fn new(fallback: ExportPlan) -> Self {
        Self {
            fallback,
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            advance: None,
        }
    }

    /// Queue a plan for the next un-scripted call
    pub fn queue(self, plan: ExportPlan) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(plan);
        self
    }

    /// Advance `clock` by `by` every time export is called
    pub fn advancing(mut self, clock: Arc<ManualClock>, by: chrono::Duration) -> Self {
        self.advance = Some((clock, by));
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_plan(&self) -> ExportPlan {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Exporter for FakeExporter {
    async fn export(
        &self,
        _secret: &ExportSecret,
        _source: &SourceId,
        destination: &Path,
        _passphrase: &Passphrase,
        cancel: &CancellationToken,
    ) -> Result<ExportStats, ExportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((clock, by)) = &self.advance {
            clock.advance(*by);
        }

        match self.next_plan() {
            ExportPlan::Succeed { payload } => {
                tokio::fs::write(destination, &payload).await?;
                Ok(ExportStats {
                    bytes_written: payload.len() as u64,
                })
            }
            ExportPlan::PermissionDenied => {
                Err(ExportError::PermissionDenied("storage permission required".into()))
            }
            ExportPlan::InsufficientSpace => Err(ExportError::InsufficientSpace {
                required: 1_000_000,
                available: 10,
            }),
            ExportPlan::IoError => {
                // Leave a partial file behind; the export phase must remove it
                let _ = tokio::fs::write(destination, b"partial").await;
                Err(ExportError::Io(std::io::Error::other("disk fault")))
            }
            ExportPlan::AwaitCancel => {
                let _ = tokio::fs::write(destination, b"partial").await;
                cancel.cancelled().await;
                Err(ExportError::Cancelled)
            }
        }
    }
}

/// One planned negotiation behavior
#[derive(Clone, Copy)]
pub(crate) enum NegotiatePlan {
    Ok,
    Transport,
    Unauthorized,
    QuotaExceeded,
}

/// One planned transfer behavior
#[derive(Clone, Copy)]
pub(crate) enum StreamPlan {
    Ok,
    Transport,
    ServerError,
}

/// Scriptable upload client fake.
///
/// Records negotiation/upload call counts and the byte payload of every
/// successful upload, so tests can assert exact transfer sizes.
pub(crate) struct FakeUploadClient {
    negotiate_fallback: NegotiatePlan,
    negotiate_queue: Mutex<VecDeque<NegotiatePlan>>,
    stream_fallback: StreamPlan,
    stream_queue: Mutex<VecDeque<StreamPlan>>,
    pub negotiations: AtomicU32,
    pub uploads: AtomicU32,
    pub uploaded: Mutex<Vec<Vec<u8>>>,
}

impl FakeUploadClient {
    /// Negotiation and transfer both succeed
    pub fn happy() -> Self {
        Self::new(NegotiatePlan::Ok, StreamPlan::Ok)
    }

    pub fn new(negotiate_fallback: NegotiatePlan, stream_fallback: StreamPlan) -> Self {
        Self {
            negotiate_fallback,
            negotiate_queue: Mutex::new(VecDeque::new()),
            stream_fallback,
            stream_queue: Mutex::new(VecDeque::new()),
            negotiations: AtomicU32::new(0),
            uploads: AtomicU32::new(0),
            uploaded: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_negotiate(self, plan: NegotiatePlan) -> Self {
        self.negotiate_queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(plan);
        self
    }

    pub fn queue_stream(self, plan: StreamPlan) -> Self {
        self.stream_queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(plan);
        self
    }

    pub fn negotiation_count(&self) -> u32 {
        self.negotiations.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn uploaded_payloads(&self) -> Vec<Vec<u8>> {
        self.uploaded.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn dummy_params() -> UploadParameters {
        UploadParameters {
            form: UploadForm {
                cdn_number: 2,
                key: "backups/test".into(),
                headers: Default::default(),
                signed_upload_location: Url::parse("https://cdn.example.com/session/new")
                    .expect("static url"),
            },
            resumable_url: Url::parse("https://cdn.example.com/session/abc").expect("static url"),
        }
    }
}

#[async_trait]
impl UploadClient for FakeUploadClient {
    async fn negotiate_upload(&self) -> Result<UploadParameters, UploadApiError> {
        self.negotiations.fetch_add(1, Ordering::SeqCst);
        let plan = self
            .negotiate_queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(self.negotiate_fallback);

        match plan {
            NegotiatePlan::Ok => Ok(Self::dummy_params()),
            NegotiatePlan::Transport => {
                Err(UploadApiError::Transport("connection refused".into()))
            }
            NegotiatePlan::Unauthorized => Err(UploadApiError::Status {
                code: 401,
                message: "invalid credentials".into(),
            }),
            NegotiatePlan::QuotaExceeded => Err(UploadApiError::Status {
                code: 429,
                message: "quota exceeded".into(),
            }),
        }
    }

    async fn stream_upload(
        &self,
        _params: &UploadParameters,
        mut source: ByteSource,
        byte_len: u64,
        _cancel: &CancellationToken,
    ) -> Result<(), UploadApiError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let plan = self
            .stream_queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(self.stream_fallback);

        match plan {
            StreamPlan::Ok => {
                let mut received = Vec::new();
                tokio::io::copy(&mut source, &mut received)
                    .await
                    .map_err(|e| UploadApiError::Transport(e.to_string()))?;
                assert_eq!(
                    received.len() as u64,
                    byte_len,
                    "declared byte length must match the streamed bytes"
                );
                self.uploaded
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(received);
                Ok(())
            }
            StreamPlan::Transport => {
                Err(UploadApiError::Transport("connection reset mid-transfer".into()))
            }
            StreamPlan::ServerError => Err(UploadApiError::Status {
                code: 500,
                message: "storage backend unavailable".into(),
            }),
        }
    }
}
