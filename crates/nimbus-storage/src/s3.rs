#[cfg(feature = "s3")]
mod inner {
    use anyhow::Context;
    use async_trait::async_trait;
    use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
    use aws_sdk_s3::Client;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
    use nimbus_core::config::AwsConfig;
    use nimbus_core::{PayloadReader, ProviderName};

    use crate::provider::Uploader;

    /// AWS S3 and S3-compatible uploader.
    ///
    /// Credentials come from a shared credentials file and profile. The bucket
    /// is created on first upload if it does not exist yet.
    pub struct S3Uploader {
        client: Client,
        region: String,
        name: ProviderName,
    }

    impl S3Uploader {
        pub async fn new(config: &AwsConfig, name: impl Into<ProviderName>) -> anyhow::Result<Self> {
            config.validate()?;

            let profile_files = ProfileFiles::builder()
                .with_file(ProfileFileKind::Credentials, &config.credentials_file)
                .build();

            let sdk_config = aws_config::from_env()
                .profile_files(profile_files)
                .profile_name(&config.profile)
                .region(aws_config::Region::new(config.region.clone()))
                .load()
                .await;

            let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

            // Most S3-compatible servers only understand path-style addressing.
            if let Some(endpoint) = &config.endpoint_url {
                s3_config_builder = s3_config_builder
                    .endpoint_url(endpoint)
                    .force_path_style(true);
            }

            let client = Client::from_conf(s3_config_builder.build());

            Ok(Self {
                client,
                region: config.region.clone(),
                name: name.into(),
            })
        }

        async fn ensure_bucket(&self, bucket: &str) -> anyhow::Result<()> {
            let mut request = self.client.create_bucket().bucket(bucket);

            // us-east-1 is the implicit location and must not be sent explicitly.
            if self.region != "us-east-1" {
                request = request.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                        .build(),
                );
            }

            match request.send().await {
                Ok(_) => {
                    tracing::info!(bucket, region = %self.region, "created S3 bucket");
                    Ok(())
                }
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
                {
                    Ok(())
                }
                Err(err) => Err(anyhow::Error::new(err).context(format!("creating bucket {bucket}"))),
            }
        }
    }

    #[async_trait]
    impl Uploader for S3Uploader {
        async fn upload(&self, bucket: &str, key: &str, payload: PayloadReader) -> anyhow::Result<()> {
            self.ensure_bucket(bucket).await?;

            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(payload.into_bytes()))
                .send()
                .await
                .with_context(|| format!("putting s3://{bucket}/{key}"))?;
            Ok(())
        }

        fn provider(&self) -> &ProviderName {
            &self.name
        }
    }
}

#[cfg(feature = "s3")]
pub use inner::S3Uploader;
