use nimbus_core::ProviderName;
use thiserror::Error;

use crate::coordinator::UploadReport;

/// One backend's failed upload, tagged with the backend that produced it.
#[derive(Debug, Error)]
#[error("{:?} upload failed, error: {cause:#}", .provider.as_str())]
pub struct UploadError {
    pub provider: ProviderName,
    #[source]
    pub cause: anyhow::Error,
}

impl UploadError {
    pub fn new(provider: ProviderName, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            provider,
            cause: cause.into(),
        }
    }
}

/// Why an upload stopped before its backend finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("upload cancelled")]
    Cancelled,

    #[error("upload timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("upload task panicked")]
    Panicked,
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("At least one backend is required")]
    NoBackends,

    #[error("Some uploads failed ({} of {})", .0.failed.len(), .0.total())]
    PartialFailure(UploadReport),

    #[error("All uploads failed ({} of {})", .0.failed.len(), .0.total())]
    AllFailed(UploadReport),
}

impl CoordinatorError {
    /// The per-backend report behind an aggregate failure.
    pub fn report(&self) -> Option<&UploadReport> {
        match self {
            CoordinatorError::PartialFailure(report) | CoordinatorError::AllFailed(report) => {
                Some(report)
            }
            CoordinatorError::NoBackends => None,
        }
    }

    pub fn into_report(self) -> Option<UploadReport> {
        match self {
            CoordinatorError::PartialFailure(report) | CoordinatorError::AllFailed(report) => {
                Some(report)
            }
            CoordinatorError::NoBackends => None,
        }
    }
}
