//! Upload pipeline: validation, multipart transfer with progress, and
//! cooperative cancellation.
//!
//! Phases: `Idle -> Validating -> (Rejected | Ready) -> Uploading ->
//! (Succeeded | Failed | Cancelled) -> Idle`. Cancellation aborts the
//! in-flight transfer at its next checkpoint and is not an error; `reset()`
//! returns the pipeline to `Idle` for the next attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::watch;

use concilia_core::errors::{Error, Result, ValidationError};
use concilia_core::events::{UiEvent, UiEventSink};
use concilia_core::upload::{validate_batch, CandidateFile, UploadBatch, UploadSummary};

use concilia_client::ApiClient;

/// Transfer timeout: large batches take longer than plain reads.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Transfer chunk size; progress and cancellation checkpoints happen per
/// chunk.
const CHUNK_BYTES: usize = 64 * 1024;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Validating,
    Rejected,
    Ready,
    Uploading,
    Succeeded,
    Failed,
    Cancelled,
}

/// Terminal result of a submit that was not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Succeeded(UploadSummary),
    Cancelled,
}

/// Cancels the attempt it was obtained for. Cloneable so the UI can hold it
/// while the submit future is pending.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Requests cancellation; takes effect at the transfer's next checkpoint.
    pub fn fire(&self) {
        let _ = self.inner.send(true);
    }
}

/// Seam between the pipeline and the HTTP client, so transfers are mockable.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send(
        &self,
        form: reqwest::multipart::Form,
        timeout: Duration,
    ) -> Result<UploadSummary>;
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn send(
        &self,
        form: reqwest::multipart::Form,
        timeout: Duration,
    ) -> Result<UploadSummary> {
        self.upload_multipart(form, timeout).await
    }
}

/// Drives one upload attempt at a time.
pub struct UploadPipeline {
    transport: Arc<dyn UploadTransport>,
    events: Arc<dyn UiEventSink>,
    phase: UploadPhase,
    batch: Option<UploadBatch>,
    cancel: Arc<watch::Sender<bool>>,
}

impl UploadPipeline {
    pub fn new(transport: Arc<dyn UploadTransport>, events: Arc<dyn UiEventSink>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            transport,
            events,
            phase: UploadPhase::Idle,
            batch: None,
            cancel: Arc::new(cancel),
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Validates a selection, replacing any previous one and arming a fresh
    /// cancellation channel for the attempt.
    pub fn select_files(&mut self, files: Vec<CandidateFile>) -> &UploadBatch {
        self.phase = UploadPhase::Validating;
        let batch = validate_batch(files);
        self.phase = if batch.is_fully_rejected() {
            UploadPhase::Rejected
        } else {
            UploadPhase::Ready
        };
        debug!(
            "upload batch {}: {} accepted, {} rejected",
            batch.id,
            batch.accepted_count(),
            batch.rejected().count()
        );
        let (cancel, _) = watch::channel(false);
        self.cancel = Arc::new(cancel);
        self.batch.insert(batch)
    }

    /// Handle that cancels the current attempt.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            inner: self.cancel.clone(),
        }
    }

    /// Per-file rejection reasons for the current selection, one entry per
    /// failed check.
    pub fn rejection_reasons(&self) -> Vec<String> {
        let Some(batch) = &self.batch else {
            return Vec::new();
        };
        batch
            .rejected()
            .flat_map(|file| {
                file.verdict
                    .reasons
                    .iter()
                    .map(|reason| reason.user_message())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Transmits the accepted files.
    ///
    /// Emits progress events per transferred chunk. Returns
    /// [`UploadOutcome::Cancelled`] when the attempt's [`CancelHandle`]
    /// fired; transport and server failures are errors and leave the
    /// pipeline in `Failed`.
    pub async fn submit(&mut self) -> Result<UploadOutcome> {
        let batch = match (&self.phase, &self.batch) {
            (UploadPhase::Ready, Some(batch)) => batch.clone(),
            _ => return Err(Error::Validation(ValidationError::EmptySelection)),
        };

        self.phase = UploadPhase::Uploading;
        let cancel_rx = self.cancel.subscribe();

        let form = build_form(&batch, self.events.clone());
        let transport = self.transport.clone();
        let transfer = transport.send(form, UPLOAD_TIMEOUT);
        tokio::pin!(transfer);

        let result = tokio::select! {
            _ = wait_cancel(cancel_rx) => {
                info!("upload batch {} cancelled by user", batch.id);
                self.phase = UploadPhase::Cancelled;
                return Ok(UploadOutcome::Cancelled);
            }
            result = &mut transfer => result,
        };

        match result {
            Ok(summary) => {
                self.events
                    .emit(UiEvent::upload_progress(batch.id.to_string(), 100));
                self.phase = UploadPhase::Succeeded;
                Ok(UploadOutcome::Succeeded(summary))
            }
            Err(err) => {
                warn!("upload batch {} failed: {}", batch.id, err);
                self.phase = UploadPhase::Failed;
                Err(err)
            }
        }
    }

    /// Discards the selection and returns to `Idle`.
    pub fn reset(&mut self) {
        self.phase = UploadPhase::Idle;
        self.batch = None;
        let (cancel, _) = watch::channel(false);
        self.cancel = Arc::new(cancel);
    }
}

async fn wait_cancel(mut cancel: watch::Receiver<bool>) {
    while !*cancel.borrow() {
        if cancel.changed().await.is_err() {
            // Sender gone: cancellation can no longer happen.
            futures::future::pending::<()>().await;
        }
    }
}

/// Builds the multipart form, wrapping each accepted file in a chunked body
/// that reports progress as bytes actually leave the client.
fn build_form(batch: &UploadBatch, events: Arc<dyn UiEventSink>) -> reqwest::multipart::Form {
    let total = batch.total_accepted_bytes().max(1);
    let sent = Arc::new(AtomicU64::new(0));
    let batch_id = batch.id.to_string();

    let mut form = reqwest::multipart::Form::new();
    for file in batch.accepted() {
        let part = progress_part(file, total, sent.clone(), batch_id.clone(), events.clone());
        form = form.part("files", part);
    }
    form
}

fn progress_part(
    file: &CandidateFile,
    total_bytes: u64,
    sent: Arc<AtomicU64>,
    batch_id: String,
    events: Arc<dyn UiEventSink>,
) -> reqwest::multipart::Part {
    let len = file.size_bytes();
    let chunks: Vec<Vec<u8>> = file.bytes.chunks(CHUNK_BYTES).map(<[u8]>::to_vec).collect();

    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        let percent = ((done.min(total_bytes) * 100) / total_bytes) as u8;
        events.emit(UiEvent::upload_progress(batch_id.clone(), percent));
        Ok::<Vec<u8>, std::io::Error>(chunk)
    }));

    let part =
        reqwest::multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), len)
            .file_name(file.name.clone());
    match part.mime_str(&file.mime_type) {
        Ok(part) => part,
        Err(_) => reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concilia_core::events::MockUiEventSink;

    /// Transport that resolves immediately with a canned summary.
    struct OkTransport;

    #[async_trait]
    impl UploadTransport for OkTransport {
        async fn send(
            &self,
            _form: reqwest::multipart::Form,
            _timeout: Duration,
        ) -> Result<UploadSummary> {
            Ok(UploadSummary {
                files_total: 1,
                sales_found: 1,
                receipts_found: 0,
                total_sales: rust_decimal::Decimal::new(150000, 2),
                total_received: rust_decimal::Decimal::ZERO,
                message: "ok".to_string(),
            })
        }
    }

    /// Transport that never resolves, for cancellation tests.
    struct HangingTransport;

    #[async_trait]
    impl UploadTransport for HangingTransport {
        async fn send(
            &self,
            _form: reqwest::multipart::Form,
            _timeout: Duration,
        ) -> Result<UploadSummary> {
            futures::future::pending().await
        }
    }

    /// Transport that fails with a server-reported business message.
    struct BusinessFailTransport;

    #[async_trait]
    impl UploadTransport for BusinessFailTransport {
        async fn send(
            &self,
            _form: reqwest::multipart::Form,
            _timeout: Duration,
        ) -> Result<UploadSummary> {
            Err(Error::Business("Nenhum arquivo enviado.".to_string()))
        }
    }

    fn csv(name: &str) -> CandidateFile {
        CandidateFile::new(name, "text/csv", vec![b'x'; 128])
    }

    fn pipeline(transport: Arc<dyn UploadTransport>) -> UploadPipeline {
        UploadPipeline::new(transport, Arc::new(MockUiEventSink::new()))
    }

    #[test]
    fn test_selection_drives_ready_and_rejected_phases() {
        let mut pipeline = pipeline(Arc::new(OkTransport));
        assert_eq!(pipeline.phase(), UploadPhase::Idle);

        pipeline.select_files(vec![csv("vendas.csv")]);
        assert_eq!(pipeline.phase(), UploadPhase::Ready);

        pipeline.select_files(vec![CandidateFile::new("../x.csv", "text/csv", vec![0u8; 4])]);
        assert_eq!(pipeline.phase(), UploadPhase::Rejected);
        assert_eq!(pipeline.rejection_reasons().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_without_ready_batch_is_a_validation_error() {
        let mut pipeline = pipeline(Arc::new(OkTransport));
        let err = pipeline.submit().await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_successful_submit_reaches_succeeded() {
        let sink = Arc::new(MockUiEventSink::new());
        let mut pipeline = UploadPipeline::new(Arc::new(OkTransport), sink.clone());
        pipeline.select_files(vec![csv("vendas.csv")]);

        match pipeline.submit().await.unwrap() {
            UploadOutcome::Succeeded(summary) => {
                assert_eq!(summary.files_total, 1);
                assert_eq!(summary.sales_found, 1);
            }
            UploadOutcome::Cancelled => panic!("expected success"),
        }
        assert_eq!(pipeline.phase(), UploadPhase::Succeeded);
        assert!(sink
            .events()
            .iter()
            .any(|event| matches!(event, UiEvent::UploadProgress { percent: 100, .. })));
    }

    #[tokio::test]
    async fn test_cancel_mid_flight_is_not_an_error() {
        let mut pipeline = pipeline(Arc::new(HangingTransport));
        pipeline.select_files(vec![csv("vendas.csv")]);
        let cancel = pipeline.cancel_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.fire();
        });

        let outcome = pipeline.submit().await.unwrap();
        assert_eq!(outcome, UploadOutcome::Cancelled);
        assert_eq!(pipeline.phase(), UploadPhase::Cancelled);

        pipeline.reset();
        assert_eq!(pipeline.phase(), UploadPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_business_message() {
        let mut pipeline = pipeline(Arc::new(BusinessFailTransport));
        pipeline.select_files(vec![csv("vendas.csv")]);

        let err = pipeline.submit().await.unwrap_err();
        assert_eq!(err.kind(), "business");
        assert_eq!(err.user_message(), "Nenhum arquivo enviado.");
        assert_eq!(pipeline.phase(), UploadPhase::Failed);

        pipeline.reset();
        assert_eq!(pipeline.phase(), UploadPhase::Idle);
    }

    #[tokio::test]
    async fn test_rejected_batch_cannot_submit() {
        let mut pipeline = pipeline(Arc::new(OkTransport));
        pipeline.select_files(vec![CandidateFile::new(".env.csv", "text/csv", vec![0u8; 4])]);
        assert_eq!(pipeline.phase(), UploadPhase::Rejected);
        assert!(pipeline.submit().await.is_err());
    }
}
