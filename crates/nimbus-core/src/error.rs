use thiserror::Error;

#[derive(Debug, Error)]
pub enum NimbusError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}")]
    ConfigNotFound(String),

    #[error("Invalid {provider} configuration: {reason}")]
    InvalidProviderConfig {
        provider: &'static str,
        reason: String,
    },

    #[error("No configuration section for provider: {0}")]
    ProviderNotConfigured(String),

    // Providers
    #[error("Providers cannot be empty")]
    NoProviders,

    #[error("Invalid provider(s): {}", .0.join(", "))]
    InvalidProviders(Vec<String>),

    // Payload
    #[error("Failed to read payload from {path}: {source}")]
    Payload {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization
    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

pub type Result<T> = std::result::Result<T, NimbusError>;
