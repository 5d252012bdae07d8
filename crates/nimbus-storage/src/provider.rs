use async_trait::async_trait;
use nimbus_core::{PayloadReader, ProviderName};

/// Trait for cloud/local storage backends a file can be uploaded to.
///
/// Implementations keep no per-call state, so one instance may serve several
/// uploads at the same time.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload the payload to `key` inside the `bucket` container.
    ///
    /// The whole payload is uploaded regardless of the reader's position.
    /// Creating the container when it is missing is up to the backend.
    async fn upload(&self, bucket: &str, key: &str, payload: PayloadReader) -> anyhow::Result<()>;

    /// Provider identity for reporting.
    fn provider(&self) -> &ProviderName;
}
