//! Splitting one archive blob into per-message segments
//!
//! Archives carry no reliable message delimiter, so each source format has
//! its own boundary heuristic:
//!
//! - `flat-text` dumps glue messages with a literal `/n` marker followed,
//!   possibly after some noise on the same line, by a header that reliably
//!   opens a message (`Received:`, `MIME-Version`, `X-Received:`,
//!   `X-BeenThere:`, `Date:`). The marker is dropped and the rest of the
//!   match opens the next segment.
//! - `compressed-unix-mailbox` archives split on `From ` sender lines, but
//!   only when the next line is a `From:` header. Quoted body text such as
//!   `From 1913 ...` never starts a message.
//!
//! Boundary detection runs on bytes so the same rules serve both the bulk
//! path (decoded text) and the line-by-line fallback used when the archive
//! cannot be decoded as a whole.

use crate::decoder::Decoder;
use crate::error::{IngestError, Result};
use crate::types::{MessageSegment, Payload, RawArchiveBlob, SourceFormat};
use flate2::read::GzDecoder;
use regex::bytes::Regex;
use std::borrow::Cow;
use std::io::Read;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Literal marker that flat-text dumps put between messages
pub const BOUNDARY_MARKER: &str = "/n";

static FLAT_TEXT_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)/n.*?(?:Received:|MIME-Version|X-Re(?:cie|cei)ved:|X-BeenThere:|Date:)",
    )
    .unwrap()
});

static FLAT_TEXT_REPLY_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m-u)(^|/n)(?i:reply-to):").unwrap());

static MAILBOX_SEND_REPLY_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m-u)^(?i:send reply to):").unwrap());

/// Where one segment stops and the next one starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cut {
    end: usize,
    start: usize,
}

/// Splits decoded or raw archive content into message segments
pub struct Segmenter<'a> {
    decoder: &'a Decoder,
}

impl<'a> Segmenter<'a> {
    pub const fn new(decoder: &'a Decoder) -> Self {
        Self { decoder }
    }

    /// Segment a whole archive object
    ///
    /// Gzipped payloads are inflated first. When bulk decoding fails the
    /// bytes are walked line by line and an undecodable tail is dropped.
    pub fn segment(&self, blob: &RawArchiveBlob) -> Result<Vec<MessageSegment>> {
        let payload = match (&blob.format, &blob.payload) {
            (SourceFormat::CompressedUnixMailbox, Payload::Bytes(bytes)) => {
                Cow::Owned(Payload::Bytes(inflate(bytes)?))
            }
            _ => Cow::Borrowed(&blob.payload),
        };

        match self.decoder.decode_payload(&payload) {
            Ok(text) => Ok(split_text(blob.format, &text)),
            Err(err) if err.is_not_bytes() => match payload.as_ref() {
                Payload::Text(text) => Ok(split_text(blob.format, text)),
                Payload::Bytes(_) => Err(err),
            },
            Err(IngestError::Decode { attempts }) => {
                warn!(
                    format = %blob.format,
                    tried = ?attempts,
                    "Bulk decode failed, splitting line by line"
                );
                match payload.as_ref() {
                    Payload::Bytes(bytes) => Ok(self.split_lines(blob.format, bytes)),
                    Payload::Text(text) => Ok(split_text(blob.format, text)),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Line-by-line fallback over undecodable bytes
    ///
    /// Each line is decoded on its own, so lines written by different
    /// clients may use different codecs. The first line that no codec can
    /// decode ends the usable input; everything before it is still segmented.
    #[must_use]
    pub fn split_lines(&self, format: SourceFormat, bytes: &[u8]) -> Vec<MessageSegment> {
        let mut decoded = String::with_capacity(bytes.len());
        let mut offset = 0;
        for line in bytes.split_inclusive(|b| *b == b'\n') {
            match self.decoder.decode(line) {
                Ok(text) => decoded.push_str(&text),
                Err(err) => {
                    warn!(
                        offset,
                        dropped = bytes.len() - offset,
                        "Error decoding line, dropping the rest of the archive: {err}"
                    );
                    break;
                }
            }
            offset += line.len();
        }
        split_text(format, &decoded)
    }
}

/// Segment already-decoded archive text
#[must_use]
pub fn split_text(format: SourceFormat, text: &str) -> Vec<MessageSegment> {
    split_bytes(format, text.as_bytes())
}

fn split_bytes(format: SourceFormat, raw: &[u8]) -> Vec<MessageSegment> {
    let normalized = normalize(format, raw);
    let cuts = match format {
        SourceFormat::FlatText => flat_text_cuts(&normalized),
        SourceFormat::CompressedUnixMailbox => mailbox_cuts(&normalized),
    };
    if cuts.is_empty() {
        debug!(%format, bytes = raw.len(), "No boundary matched, keeping blob as one segment");
    }

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        push_segment(&mut segments, &normalized[start..cut.end]);
        start = cut.start;
    }
    push_segment(&mut segments, &normalized[start..]);
    segments
}

fn push_segment(segments: &mut Vec<MessageSegment>, raw: &[u8]) {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return;
    }
    segments.push(MessageSegment::new(raw));
}

/// Canonicalize the alternate reply headers to `In-Reply-To:`
fn normalize(format: SourceFormat, raw: &[u8]) -> Cow<'_, [u8]> {
    match format {
        SourceFormat::FlatText => FLAT_TEXT_REPLY_TO.replace_all(raw, &b"${1}In-Reply-To:"[..]),
        SourceFormat::CompressedUnixMailbox => {
            MAILBOX_SEND_REPLY_TO.replace_all(raw, &b"In-Reply-To:"[..])
        }
    }
}

fn flat_text_cuts(raw: &[u8]) -> Vec<Cut> {
    FLAT_TEXT_BOUNDARY
        .find_iter(raw)
        .map(|found| Cut {
            end: found.start(),
            start: found.start() + BOUNDARY_MARKER.len(),
        })
        .collect()
}

fn mailbox_cuts(raw: &[u8]) -> Vec<Cut> {
    let mut cuts = Vec::new();
    let mut offset = 0;
    let mut lines = raw.split_inclusive(|b| *b == b'\n').peekable();
    while let Some(line) = lines.next() {
        let opens_message = is_sender_line(line)
            && lines
                .peek()
                .is_some_and(|next| next.starts_with(b"From:"));
        if opens_message {
            cuts.push(Cut {
                end: offset,
                start: offset,
            });
        }
        offset += line.len();
    }
    cuts
}

/// `From ` envelope line as written by mbox tools
fn is_sender_line(line: &[u8]) -> bool {
    line.starts_with(b"From ")
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut inflated = Vec::with_capacity(bytes.len().saturating_mul(4));
    GzDecoder::new(bytes)
        .read_to_end(&mut inflated)
        .map_err(|e| IngestError::Decompress(e.to_string()))?;
    Ok(inflated)
}
