// Firestore Sync - Error Taxonomy
//
// Only a source fetch failure ends a pass early. Destination write failures
// are folded into per-variable outcomes and never leave the executor.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the two stores.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source store unreachable, non-success status, or undecodable body.
    #[error("Failed to fetch from Realtime Database: {0}")]
    SourceFetch(String),

    /// Destination store rejected or failed a single write.
    #[error("Failed to save {variable}: {message}")]
    DestinationWrite { variable: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    pub fn source_fetch(message: impl Into<String>) -> Self {
        Self::SourceFetch(message.into())
    }

    pub fn destination_write(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestinationWrite {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// True when this error must end the whole pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceFetch(_) | Self::Config(_))
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing API key: set destination.api_key or the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for firestore-sync.
pub type Result<T> = std::result::Result<T, SyncError>;
