pub mod config;
pub mod error;
pub mod payload;
pub mod types;

pub use error::{NimbusError, Result};
pub use payload::{Payload, PayloadReader};
pub use types::{ProviderKind, ProviderName};
