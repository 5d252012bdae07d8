#[cfg(feature = "gcs")]
mod inner {
    use anyhow::Context;
    use async_trait::async_trait;
    use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
    use google_cloud_storage::client::{Client, ClientConfig};
    use google_cloud_storage::http::Error as GcsError;
    use google_cloud_storage::http::buckets::get::GetBucketRequest;
    use google_cloud_storage::http::buckets::insert::{InsertBucketParam, InsertBucketRequest};
    use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
    use nimbus_core::config::GcpConfig;
    use nimbus_core::{PayloadReader, ProviderName};

    use crate::provider::Uploader;

    /// Google Cloud Storage uploader.
    pub struct GcsUploader {
        client: Client,
        project_id: Option<String>,
        name: ProviderName,
    }

    impl GcsUploader {
        /// Create from a service-account JSON credentials file.
        pub async fn new(config: &GcpConfig, name: impl Into<ProviderName>) -> anyhow::Result<Self> {
            config.validate()?;
            let credentials = CredentialsFile::new_from_file(config.credentials_file.clone())
                .await
                .with_context(|| format!("reading GCP credentials {}", config.credentials_file))?;
            let client_config = ClientConfig::default().with_credentials(credentials).await?;

            let project_id = config
                .project_id
                .clone()
                .or_else(|| client_config.project_id.clone());

            Ok(Self {
                client: Client::new(client_config),
                project_id,
                name: name.into(),
            })
        }

        async fn ensure_bucket(&self, bucket: &str) -> anyhow::Result<()> {
            let existing = self
                .client
                .get_bucket(&GetBucketRequest {
                    bucket: bucket.to_string(),
                    ..Default::default()
                })
                .await;

            match existing {
                Ok(_) => return Ok(()),
                Err(GcsError::Response(resp)) if resp.code == 404 => {}
                Err(err) => return Err(anyhow::Error::new(err).context("looking up bucket")),
            }

            let project = self
                .project_id
                .as_deref()
                .context("bucket does not exist and no GCP project id is known to create it")?;
            self.client
                .insert_bucket(&InsertBucketRequest {
                    name: bucket.to_string(),
                    param: InsertBucketParam {
                        project: project.to_string(),
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .await
                .with_context(|| format!("creating bucket {bucket}"))?;
            tracing::info!(bucket, project, "created GCS bucket");
            Ok(())
        }
    }

    #[async_trait]
    impl Uploader for GcsUploader {
        async fn upload(&self, bucket: &str, key: &str, payload: PayloadReader) -> anyhow::Result<()> {
            self.ensure_bucket(bucket).await?;

            let upload_type = UploadType::Simple(Media::new(key.to_string()));
            self.client
                .upload_object(
                    &UploadObjectRequest {
                        bucket: bucket.to_string(),
                        ..Default::default()
                    },
                    payload.into_bytes(),
                    &upload_type,
                )
                .await
                .with_context(|| format!("uploading gs://{bucket}/{key}"))?;
            Ok(())
        }

        fn provider(&self) -> &ProviderName {
            &self.name
        }
    }
}

#[cfg(feature = "gcs")]
pub use inner::GcsUploader;
