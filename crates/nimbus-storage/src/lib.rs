pub mod azure;
pub mod coordinator;
pub mod error;
pub mod factory;
pub mod gcs;
pub mod local;
pub mod provider;
pub mod s3;

pub use coordinator::{Coordinator, UploadReport, UploadRequest};
pub use error::{CoordinatorError, Interrupted, UploadError};
pub use provider::Uploader;
