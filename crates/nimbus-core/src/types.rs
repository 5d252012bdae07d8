use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NimbusError;

/// Label identifying one backend in reports ("aws", "gcp", "azure", ...).
///
/// Only ever compared and displayed; nothing branches on its value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderName(String);

impl ProviderName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ProviderName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<ProviderKind> for ProviderName {
    fn from(kind: ProviderKind) -> Self {
        Self(kind.to_string())
    }
}

/// Backend families the factory knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Aws,
    Azure,
    Gcp,
    /// Filesystem directory, used for dry runs and tests.
    Local,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Aws,
        ProviderKind::Azure,
        ProviderKind::Gcp,
        ProviderKind::Local,
    ];
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Aws => write!(f, "aws"),
            ProviderKind::Azure => write!(f, "azure"),
            ProviderKind::Gcp => write!(f, "gcp"),
            ProviderKind::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = NimbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" | "s3" => Ok(ProviderKind::Aws),
            "azure" | "blob" => Ok(ProviderKind::Azure),
            "gcp" | "gcs" => Ok(ProviderKind::Gcp),
            "local" => Ok(ProviderKind::Local),
            _ => Err(NimbusError::InvalidProviders(vec![s.to_string()])),
        }
    }
}

/// Parse user-supplied provider names.
///
/// An empty list is rejected, and every unknown name is reported at once.
/// Duplicates collapse to a single entry so a backend is never targeted twice.
pub fn validate_provider_names<S: AsRef<str>>(names: &[S]) -> crate::error::Result<Vec<ProviderKind>> {
    if names.is_empty() {
        return Err(NimbusError::NoProviders);
    }

    let mut kinds = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();
    for name in names {
        match name.as_ref().parse::<ProviderKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(_) => invalid.push(format!("{:?}", name.as_ref())),
        }
    }

    if !invalid.is_empty() {
        return Err(NimbusError::InvalidProviders(invalid));
    }
    Ok(kinds)
}
