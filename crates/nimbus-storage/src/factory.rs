//! Builds uploaders from configuration.
//!
//! Each [`ProviderKind`] maps to one constructor. Cloud adapters are compiled
//! in through the `s3`, `azure` and `gcs` features; asking for one that is
//! not compiled in is a configuration error.

use std::path::Path;
use std::sync::Arc;

use nimbus_core::config::NimbusConfig;
use nimbus_core::{NimbusError, ProviderKind};

use crate::local::LocalUploader;
use crate::provider::Uploader;

/// Whether the adapter for `kind` was compiled into this build.
pub fn is_compiled_in(kind: ProviderKind) -> bool {
    match kind {
        ProviderKind::Aws => cfg!(feature = "s3"),
        ProviderKind::Azure => cfg!(feature = "azure"),
        ProviderKind::Gcp => cfg!(feature = "gcs"),
        ProviderKind::Local => true,
    }
}

fn not_configured(kind: ProviderKind) -> anyhow::Error {
    NimbusError::ProviderNotConfigured(kind.to_string()).into()
}

/// Create the uploader for one provider from its config section.
///
/// The uploader reports `kind` as its provider name.
pub async fn create_uploader(
    kind: ProviderKind,
    config: &NimbusConfig,
) -> anyhow::Result<Arc<dyn Uploader>> {
    match kind {
        ProviderKind::Local => {
            let local = config.local.as_ref().ok_or_else(|| not_configured(kind))?;
            local.validate()?;
            Ok(Arc::new(LocalUploader::new(Path::new(&local.root), kind)?))
        }

        #[cfg(feature = "s3")]
        ProviderKind::Aws => {
            let aws = config.aws.as_ref().ok_or_else(|| not_configured(kind))?;
            Ok(Arc::new(crate::s3::S3Uploader::new(aws, kind).await?))
        }

        #[cfg(not(feature = "s3"))]
        ProviderKind::Aws => {
            anyhow::bail!("s3 feature not enabled. Recompile with --features s3")
        }

        #[cfg(feature = "azure")]
        ProviderKind::Azure => {
            let azure = config.azure.as_ref().ok_or_else(|| not_configured(kind))?;
            Ok(Arc::new(crate::azure::AzureUploader::new(azure, kind)?))
        }

        #[cfg(not(feature = "azure"))]
        ProviderKind::Azure => {
            anyhow::bail!("azure feature not enabled. Recompile with --features azure")
        }

        #[cfg(feature = "gcs")]
        ProviderKind::Gcp => {
            let gcp = config.gcp.as_ref().ok_or_else(|| not_configured(kind))?;
            Ok(Arc::new(crate::gcs::GcsUploader::new(gcp, kind).await?))
        }

        #[cfg(not(feature = "gcs"))]
        ProviderKind::Gcp => {
            anyhow::bail!("gcs feature not enabled. Recompile with --features gcs")
        }
    }
}

/// Create every requested uploader, failing on the first one that cannot be built.
pub async fn init_uploaders(
    kinds: &[ProviderKind],
    config: &NimbusConfig,
) -> anyhow::Result<Vec<Arc<dyn Uploader>>> {
    let mut uploaders = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let uploader = create_uploader(kind, config)
            .await
            .map_err(|e| e.context(format!("initializing {kind} provider")))?;
        tracing::debug!(provider = %kind, "provider initialized");
        uploaders.push(uploader);
    }
    Ok(uploaders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::config::LocalConfig;
    use tempfile::TempDir;

    fn local_config(root: &Path) -> NimbusConfig {
        NimbusConfig {
            local: Some(LocalConfig {
                root: root.display().to_string(),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn local_uploader_uses_kind_as_name() {
        let tmp = TempDir::new().unwrap();
        let uploader = create_uploader(ProviderKind::Local, &local_config(tmp.path()))
            .await
            .unwrap();
        assert_eq!(uploader.provider().as_str(), "local");
    }

    #[tokio::test]
    async fn missing_section_is_a_config_error() {
        let err = create_uploader(ProviderKind::Local, &NimbusConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<NimbusError>(),
            Some(NimbusError::ProviderNotConfigured(name)) if name == "local"
        ));
    }

    #[tokio::test]
    async fn init_stops_at_first_unconfigured_provider() {
        let tmp = TempDir::new().unwrap();
        let err = init_uploaders(
            &[ProviderKind::Local, ProviderKind::Azure],
            &local_config(tmp.path()),
        )
        .await
        .err()
        .unwrap();
        assert!(err.to_string().contains("initializing azure provider"), "{err}");
    }

    #[tokio::test]
    async fn init_builds_each_requested_provider() {
        let tmp = TempDir::new().unwrap();
        let uploaders = init_uploaders(&[ProviderKind::Local], &local_config(tmp.path()))
            .await
            .unwrap();
        assert_eq!(uploaders.len(), 1);
    }

    #[test]
    fn local_is_always_compiled_in() {
        assert!(is_compiled_in(ProviderKind::Local));
    }
}
