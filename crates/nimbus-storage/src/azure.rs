#[cfg(feature = "azure")]
mod inner {
    use anyhow::Context;
    use async_trait::async_trait;
    use azure_storage::StorageCredentials;
    use azure_storage_blobs::prelude::*;
    use nimbus_core::config::AzureConfig;
    use nimbus_core::{PayloadReader, ProviderName};

    use crate::provider::Uploader;

    /// Azure Blob Storage uploader. Buckets map to blob containers.
    pub struct AzureUploader {
        service_client: BlobServiceClient,
        name: ProviderName,
    }

    impl AzureUploader {
        /// Create from storage account name + access key.
        pub fn new(config: &AzureConfig, name: impl Into<ProviderName>) -> anyhow::Result<Self> {
            config.validate()?;
            let credentials =
                StorageCredentials::access_key(&config.account_name, config.account_key.clone());
            let service_client =
                ClientBuilder::new(&config.account_name, credentials).blob_service_client();

            Ok(Self {
                service_client,
                name: name.into(),
            })
        }

        /// Create using the emulator (Azurite).
        pub fn emulator(name: impl Into<ProviderName>) -> Self {
            Self {
                service_client: ClientBuilder::emulator().blob_service_client(),
                name: name.into(),
            }
        }

        async fn ensure_container(&self, container: &ContainerClient) -> anyhow::Result<()> {
            if container
                .exists()
                .await
                .context("checking container")?
            {
                return Ok(());
            }
            container.create().await.context("creating container")?;
            tracing::info!(container = container.container_name(), "created Azure container");
            Ok(())
        }
    }

    #[async_trait]
    impl Uploader for AzureUploader {
        async fn upload(&self, bucket: &str, key: &str, payload: PayloadReader) -> anyhow::Result<()> {
            let container = self.service_client.container_client(bucket);
            self.ensure_container(&container).await?;

            container
                .blob_client(key)
                .put_block_blob(payload.into_bytes())
                .await
                .with_context(|| format!("uploading blob {bucket}/{key}"))?;
            Ok(())
        }

        fn provider(&self) -> &ProviderName {
            &self.name
        }
    }
}

#[cfg(feature = "azure")]
pub use inner::AzureUploader;
