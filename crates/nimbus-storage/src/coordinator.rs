//! Fan-out of one upload to every configured backend.
//!
//! [`Coordinator::dispatch`] starts one task per backend, collects exactly one
//! outcome per task from a completion channel sized to the backend count, and
//! joins every task before returning. A failing (or panicking) backend only
//! ever produces a failure entry in the [`UploadReport`]; it never stops its
//! siblings.

use std::sync::Arc;
use std::time::Duration;

use nimbus_core::{Payload, ProviderName};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{CoordinatorError, Interrupted, UploadError};
use crate::provider::Uploader;

/// One upload to perform on every backend.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    bucket: Arc<str>,
    key: Arc<str>,
    payload: Payload,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl UploadRequest {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, payload: Payload) -> Self {
        Self {
            bucket: Arc::from(bucket.into()),
            key: Arc::from(key.into()),
            payload,
            cancel: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Fail any backend that has not finished within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an externally owned token; cancelling it fails every unfinished backend.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Handle that cancels this request when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Per-backend outcomes of one dispatch, in completion order.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub succeeded: Vec<ProviderName>,
    pub failed: Vec<UploadError>,
}

impl UploadReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_providers(&self) -> Vec<&ProviderName> {
        self.failed.iter().map(|e| &e.provider).collect()
    }
}

struct Completion {
    index: usize,
    result: anyhow::Result<()>,
}

/// Owns the backends and fans uploads out to all of them.
pub struct Coordinator {
    uploaders: Vec<Arc<dyn Uploader>>,
}

impl Coordinator {
    /// Fails with [`CoordinatorError::NoBackends`] when `uploaders` is empty.
    pub fn new(uploaders: Vec<Arc<dyn Uploader>>) -> Result<Self, CoordinatorError> {
        if uploaders.is_empty() {
            return Err(CoordinatorError::NoBackends);
        }
        Ok(Self { uploaders })
    }

    pub fn len(&self) -> usize {
        self.uploaders.len()
    }

    /// Always `false` once constructed; pairs with [`Coordinator::len`].
    pub fn is_empty(&self) -> bool {
        self.uploaders.is_empty()
    }

    /// Provider identities in registration order.
    pub fn providers(&self) -> Vec<&ProviderName> {
        self.uploaders.iter().map(|u| u.provider()).collect()
    }

    /// Upload the request to every backend concurrently.
    ///
    /// Returns `Ok` only when every backend succeeded. Otherwise the error is
    /// [`CoordinatorError::PartialFailure`] or [`CoordinatorError::AllFailed`],
    /// both carrying the full report.
    pub async fn dispatch(&self, request: &UploadRequest) -> Result<UploadReport, CoordinatorError> {
        let total = self.uploaders.len();
        tracing::info!(
            bucket = request.bucket(),
            key = request.key(),
            bytes = request.payload.len(),
            backends = total,
            "dispatching upload"
        );

        let (tx, mut rx) = mpsc::channel::<Completion>(total);
        let mut tasks = JoinSet::new();

        for (index, uploader) in self.uploaders.iter().enumerate() {
            let uploader = Arc::clone(uploader);
            let tx = tx.clone();
            let bucket = Arc::clone(&request.bucket);
            let key = Arc::clone(&request.key);
            let reader = request.payload.reader();
            let cancel = request.cancel.clone();
            let timeout = request.timeout;

            tasks.spawn(async move {
                let mut upload = uploader.upload(&bucket, &key, reader);
                let result = run_upload(upload.as_mut(), &cancel, timeout).await;
                // The channel holds one slot per backend, so this never waits.
                let _ = tx.send(Completion { index, result }).await;
                // An abandoned upload is torn down only after its outcome is reported.
                drop(upload);
            });
        }
        drop(tx);

        let mut report = UploadReport::default();
        let mut reported = vec![false; total];

        // Ends early only if a task died before sending; the join below covers it.
        while report.total() < total {
            let Some(Completion { index, result }) = rx.recv().await else {
                break;
            };
            reported[index] = true;
            self.record(&mut report, index, result);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "upload task did not complete");
            }
        }

        // A task that panicked never sent its outcome.
        for (index, done) in reported.iter().enumerate() {
            if !done {
                self.record(&mut report, index, Err(Interrupted::Panicked.into()));
            }
        }

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "dispatch finished"
        );

        if report.failed.is_empty() {
            Ok(report)
        } else if report.succeeded.is_empty() {
            Err(CoordinatorError::AllFailed(report))
        } else {
            Err(CoordinatorError::PartialFailure(report))
        }
    }

    fn record(&self, report: &mut UploadReport, index: usize, result: anyhow::Result<()>) {
        let provider = self.uploaders[index].provider().clone();
        match result {
            Ok(()) => {
                tracing::debug!(%provider, "upload succeeded");
                report.succeeded.push(provider);
            }
            Err(cause) => {
                tracing::warn!(%provider, error = %format!("{cause:#}"), "upload failed");
                report.failed.push(UploadError::new(provider, cause));
            }
        }
    }
}

async fn run_upload(
    upload: impl Future<Output = anyhow::Result<()>>,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> anyhow::Result<()> {
    let bounded = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, upload).await {
                Ok(result) => result,
                Err(_) => Err(Interrupted::TimedOut(limit).into()),
            },
            None => upload.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled.into()),
        result = bounded => result,
    }
}
