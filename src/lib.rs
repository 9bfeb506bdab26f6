// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::significant_drop_tightening)]

//! Mailing-List Archive Ingestion
//!
//! Best-effort normalization of concatenated mailing-list archives into flat,
//! structured message records. Archives come from decades of mail software,
//! so every stage recovers what it can instead of rejecting input.
//!
//! # Pipeline
//!
//! - Decode archive bytes with an ordered codec fallback
//! - Segment the archive into messages by source format
//! - Read headers permissively and split the body into text, html and image parts
//! - Normalize dates, contacts and references into canonical fields
//! - Write records in batches, halving any batch the store rejects as too large
//!
//! # Example
//!
//! ```rust
//! use mailing_list_ingest::{SourceContext, SourceFormat, assemble_segments, split_text};
//!
//! let archive = "From: A <a@x>\nTo: B <b@y>\n\
//!                Date: Sat, 6 Aug 1965 22:11:18 -0800\nSubject: S\n\nHello\n";
//! let segments = split_text(SourceFormat::CompressedUnixMailbox, archive);
//! let context = SourceContext::new("voting-rights", "1965-08.txt.gz", "abuse");
//! let records = assemble_segments(&segments, &context);
//!
//! assert_eq!(records[0].text("from_email"), Some("a@x"));
//! assert_eq!(records[0].text("date"), Some("1965-08-07 06:11:18"));
//! ```

mod config;
mod contact;
mod date;
mod decoder;
mod error;
mod parser;
mod pipeline;
mod record;
mod references;
mod schema;
mod segmenter;
mod store;
mod timezones;
mod types;

pub use config::{DEFAULT_CHUNK_SIZE, IngestConfig};
pub use contact::normalize_contact;
pub use date::{normalize_date, resolve};
pub use decoder::{Codec, DEFAULT_ENCODINGS, Decoder};
pub use error::{IngestError, Result};
pub use parser::{AUTO_TIMESTAMP, SourceContext, parse_message, reply_target};
pub use pipeline::{Pipeline, RunRequest, RunSummary, assemble_segments};
pub use record::{ALLOWED_FIELDS, IGNORED_FIELDS, Role, assemble, canonical_name};
pub use references::parse_references;
pub use schema::{FieldMode, FieldType, SchemaField, record_schema};
pub use segmenter::{BOUNDARY_MARKER, Segmenter, split_text};
pub use store::{
    ArchiveObject, FsObjectStore, JsonLinesSink, ObjectStore, RecordSink, store_records,
};
pub use timezones::zone_offset;
pub use types::*;
