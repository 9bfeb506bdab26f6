//! Ingestion settings
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Command-line flags are applied on top by the binary.

use crate::decoder::{DEFAULT_ENCODINGS, Decoder};
use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Records sent to the sink per write
pub const DEFAULT_CHUNK_SIZE: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Codec labels tried in order when decoding archive bytes
    pub encodings: Vec<String>,

    /// Extra codec tried after the configured ones
    pub additional_encoding: Option<String>,

    /// Records per store write before any halving
    pub chunk_size: usize,

    /// Object-name substring marking abuse-report archives
    pub abuse_marker: String,

    /// Container-name suffixes removed to get the list id
    pub list_suffixes: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.iter().map(ToString::to_string).collect(),
            additional_encoding: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            abuse_marker: "abuse".to_string(),
            list_suffixes: vec!["-gzip".to_string(), "-text".to_string()],
        }
    }
}

impl IngestConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded ingestion config");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(IngestError::Config("chunk_size must be at least 1".into()));
        }
        self.decoder().map(|_| ())
    }

    /// Build the codec chain, failing on unknown labels
    pub fn decoder(&self) -> Result<Decoder> {
        let decoder = Decoder::from_labels(&self.encodings)?;
        match &self.additional_encoding {
            Some(label) => decoder.with_additional(label),
            None => Ok(decoder),
        }
    }

    /// Logical list id for a container, e.g. `voting-rights-gzip` → `voting-rights`
    #[must_use]
    pub fn list_id<'a>(&self, container: &'a str) -> &'a str {
        self.list_suffixes
            .iter()
            .find_map(|suffix| container.strip_suffix(suffix.as_str()))
            .unwrap_or(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decoder().unwrap().codecs().len(), 3);
    }

    #[test]
    fn test_partial_json() {
        let config: IngestConfig =
            serde_json::from_str(r#"{"chunk_size": 50, "additional_encoding": "cp1252"}"#)
                .unwrap();
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.abuse_marker, "abuse");
        assert_eq!(config.decoder().unwrap().codecs().len(), 4);
    }

    #[test]
    fn test_invalid_values() {
        let config = IngestConfig {
            chunk_size: 0,
            ..IngestConfig::default()
        };
        assert!(matches!(config.validate(), Err(IngestError::Config(_))));

        let config = IngestConfig {
            encodings: vec!["no-such-codec".into()],
            ..IngestConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(IngestError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_list_id() {
        let config = IngestConfig::default();
        assert_eq!(config.list_id("voting-rights-gzip"), "voting-rights");
        assert_eq!(config.list_id("voting-rights-text"), "voting-rights");
        assert_eq!(config.list_id("voting-rights"), "voting-rights");
    }
}
