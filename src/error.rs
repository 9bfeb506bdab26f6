//! Error types for archive ingestion

use thiserror::Error;

/// Errors that can occur while ingesting an archive
#[derive(Error, Debug)]
pub enum IngestError {
    /// Every candidate encoding failed to decode the bytes
    #[error("Failed to decode content with any of: {}", attempts.join(", "))]
    Decode { attempts: Vec<String> },

    /// The payload is already text, so there is nothing to decode
    #[error("Payload is not byte data")]
    NotBytes,

    /// An encoding label did not name a known codec
    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// The compressed payload could not be inflated
    #[error("Failed to decompress archive: {0}")]
    Decompress(String),

    /// The content type does not map to a supported source format
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The requested archive object does not exist
    #[error("Object {name} not found in {container}")]
    ObjectNotFound { container: String, name: String },

    /// The store rejected a batch as too large
    #[error("Batch of {records} records is too large for the store")]
    BatchTooLarge { records: usize },

    /// A single record could not be written even on its own
    #[error("Record rejected by the store: {reason}")]
    RecordRejected { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IngestError {
    /// True when the caller may pass the value through instead of decoding it
    #[must_use]
    pub const fn is_not_bytes(&self) -> bool {
        matches!(self, Self::NotBytes)
    }

    /// Errors that only spoil the current archive file, not the run
    #[must_use]
    pub const fn is_file_level(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::NotBytes
                | Self::Decompress(_)
                | Self::UnsupportedContentType(_)
                | Self::ObjectNotFound { .. }
        )
    }
}

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;
