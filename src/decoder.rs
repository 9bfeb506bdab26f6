//! Byte to text decoding with an ordered codec fallback

use crate::error::{IngestError, Result};
use crate::types::Payload;
use encoding_rs::Encoding;
use std::fmt;
use tracing::{debug, warn};

/// Codec labels tried when nothing else is configured
pub const DEFAULT_ENCODINGS: [&str; 3] = ["utf-8", "iso-8859-1", "iso-8859-2"];

/// One text encoding the decoder can attempt
#[derive(Clone, Copy)]
pub enum Codec {
    Utf8,
    /// Exact ISO-8859-1; every byte maps to the code point of the same value
    Latin1,
    Other(&'static Encoding),
}

impl Codec {
    /// Resolve a codec label such as `utf8`, `latin-1` or `windows-1250`
    pub fn from_label(label: &str) -> Result<Self> {
        let normalized = label.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" | "l1" => Ok(Self::Latin1),
            _ => Encoding::for_label(normalized.as_bytes())
                .map(Self::Other)
                .ok_or_else(|| IngestError::UnknownEncoding(label.to_string())),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
            Self::Other(encoding) => encoding.name(),
        }
    }

    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            Self::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
            Self::Other(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(std::borrow::Cow::into_owned),
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tries each codec in order and returns the first clean decode
#[derive(Debug, Clone)]
pub struct Decoder {
    codecs: Vec<Codec>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            codecs: vec![Codec::Utf8, Codec::Latin1, Codec::Other(encoding_rs::ISO_8859_2)],
        }
    }
}

impl Decoder {
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codecs = labels
            .into_iter()
            .map(|label| Codec::from_label(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if codecs.is_empty() {
            return Err(IngestError::Config("at least one encoding is required".into()));
        }
        Ok(Self { codecs })
    }

    /// Append a caller-supplied codec after the configured ones
    pub fn with_additional(mut self, label: &str) -> Result<Self> {
        self.codecs.push(Codec::from_label(label)?);
        Ok(self)
    }

    #[must_use]
    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        let mut attempts = Vec::with_capacity(self.codecs.len());
        for codec in &self.codecs {
            if let Some(text) = codec.decode(bytes) {
                if !attempts.is_empty() {
                    debug!(codec = codec.name(), failed = ?attempts, "Decoded with fallback codec");
                }
                return Ok(text);
            }
            attempts.push(codec.name().to_string());
        }
        warn!(bytes = bytes.len(), tried = ?attempts, "Cannot decode bytes with any codec");
        Err(IngestError::Decode { attempts })
    }

    /// Decode byte payloads; text payloads fail with [`IngestError::NotBytes`]
    pub fn decode_payload(&self, payload: &Payload) -> Result<String> {
        match payload {
            Payload::Bytes(bytes) => self.decode(bytes),
            Payload::Text(_) => Err(IngestError::NotBytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_first() {
        let decoder = Decoder::default();
        let text = decoder
            .decode(b"From ida.b.wells@gmail.com Tue Sep  1 04:14:32 2020\n")
            .unwrap();
        assert_eq!(text, "From ida.b.wells@gmail.com Tue Sep  1 04:14:32 2020\n");
    }

    #[test]
    fn test_latin1_fallback() {
        let decoder = Decoder::default();
        assert_eq!(decoder.decode(b"\xe0").unwrap(), "à");
        assert_eq!(decoder.decode(b"hello ab\xe4c\xf6").unwrap(), "hello abäcö");
    }

    #[test]
    fn test_text_payload_is_distinguishable() {
        let decoder = Decoder::default();
        let err = decoder
            .decode_payload(&Payload::Text("Hello New York".into()))
            .unwrap_err();
        assert!(err.is_not_bytes());
    }

    #[test]
    fn test_all_codecs_fail() {
        let decoder = Decoder::from_labels(["utf-8"]).unwrap();
        let err = decoder.decode(b"caf\xe9").unwrap_err();
        match err {
            IngestError::Decode { attempts } => assert_eq!(attempts, vec!["utf-8"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_additional_codec() {
        let decoder = Decoder::from_labels(["utf-8"])
            .unwrap()
            .with_additional("windows-1250")
            .unwrap();
        assert_eq!(decoder.codecs().len(), 2);
        assert_eq!(decoder.decode(b"\x8a").unwrap(), "Š");
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            Codec::from_label("klingon-8"),
            Err(IngestError::UnknownEncoding(_))
        ));
    }
}
