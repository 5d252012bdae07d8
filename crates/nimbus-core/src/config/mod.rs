use crate::error::{NimbusError, Result};
use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level nimbus configuration stored as TOML.
///
/// Each provider section is optional; a present section means the provider
/// can be targeted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NimbusConfig {
    #[serde(default)]
    pub nimbus: NimbusSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NimbusSettings {
    /// Per-backend upload timeout in seconds. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timeout_secs: Option<u64>,
}

impl NimbusSettings {
    pub fn upload_timeout(&self) -> Option<Duration> {
        self.upload_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Location of the shared AWS credentials file.
    pub credentials_file: String,
    /// Profile to use from that file.
    pub profile: String,
    #[serde(default = "default_aws_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, Garage, ...). Implies path-style addressing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

fn default_aws_region() -> String {
    "us-east-1".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub account_name: String,
    pub account_key: String,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("account_name", &self.account_name)
            .field("account_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Path to a service-account JSON credentials file.
    pub credentials_file: String,
    /// Project that owns newly created buckets. Defaults to the project in the credentials file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory under which `<bucket>/<key>` files are written.
    pub root: String,
}

fn require(provider: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NimbusError::InvalidProviderConfig {
            provider,
            reason: format!("{field} is empty"),
        });
    }
    Ok(())
}

impl AwsConfig {
    pub fn validate(&self) -> Result<()> {
        require("aws", "profile", &self.profile)?;
        require("aws", "credentials_file", &self.credentials_file)?;
        require("aws", "region", &self.region)?;
        if let Some(endpoint) = &self.endpoint_url {
            require("aws", "endpoint_url", endpoint)?;
        }
        Ok(())
    }
}

impl AzureConfig {
    pub fn validate(&self) -> Result<()> {
        require("azure", "account_name", &self.account_name)?;
        require("azure", "account_key", &self.account_key)
    }
}

impl GcpConfig {
    pub fn validate(&self) -> Result<()> {
        require("gcp", "credentials_file", &self.credentials_file)?;
        if let Some(project) = &self.project_id {
            require("gcp", "project_id", project)?;
        }
        Ok(())
    }
}

impl LocalConfig {
    pub fn validate(&self) -> Result<()> {
        require("local", "root", &self.root)
    }
}

impl NimbusConfig {
    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NimbusError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| NimbusError::TomlDe(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| NimbusError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate every provider section that is present.
    pub fn validate(&self) -> Result<()> {
        if let Some(aws) = &self.aws {
            aws.validate()?;
        }
        if let Some(azure) = &self.azure {
            azure.validate()?;
        }
        if let Some(gcp) = &self.gcp {
            gcp.validate()?;
        }
        if let Some(local) = &self.local {
            local.validate()?;
        }
        if self.nimbus.upload_timeout_secs == Some(0) {
            return Err(NimbusError::Config(
                "upload_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Providers that have a configuration section, in a fixed order.
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(*kind))
            .collect()
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Aws => self.aws.is_some(),
            ProviderKind::Azure => self.azure.is_some(),
            ProviderKind::Gcp => self.gcp.is_some(),
            ProviderKind::Local => self.local.is_some(),
        }
    }

    /// Resolve the config file path: `<base_dir>/nimbus.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("nimbus.toml")
    }

    /// Resolve the default nimbus home directory: `~/.nimbus`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".nimbus"))
            .ok_or_else(|| NimbusError::Config("Cannot determine home directory".to_string()))
    }
}
