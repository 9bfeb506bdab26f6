//! Archive-to-record driver
//!
//! Files are handled one at a time and in listing order. Within a file the
//! records keep the order their segments had in the archive.

use crate::config::IngestConfig;
use crate::decoder::Decoder;
use crate::error::{IngestError, Result};
use crate::parser::{SourceContext, parse_message};
use crate::record::assemble;
use crate::schema::record_schema;
use crate::segmenter::Segmenter;
use crate::store::{ObjectStore, RecordSink, store_records};
use crate::types::{MessageSegment, NormalizedRecord, RawArchiveBlob, SourceFormat};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Which archive files to ingest and where the records go
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub container: String,
    /// Only list objects whose name starts with this
    pub prefix: Option<String>,
    /// Explicit object names; listing is skipped when non-empty
    pub filenames: Vec<String>,
    pub destination: String,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: usize,
    pub skipped: usize,
    pub segments: usize,
    pub records_written: usize,
}

pub struct Pipeline {
    config: IngestConfig,
    decoder: Decoder,
}

impl Pipeline {
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.validate()?;
        let decoder = config.decoder()?;
        Ok(Self { config, decoder })
    }

    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Fetch, segment, parse and assemble one archive object
    pub fn process_object<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        container: &str,
        name: &str,
    ) -> Result<Vec<NormalizedRecord>> {
        let object = store.get_object(container, name)?;
        let format = SourceFormat::from_content_type(&object.content_type)
            .ok_or_else(|| IngestError::UnsupportedContentType(object.content_type.clone()))?;
        debug!(file = name, %format, bytes = object.payload.len(), "Fetched archive");

        let blob = RawArchiveBlob::new(format, object.payload);
        let segments = Segmenter::new(&self.decoder).segment(&blob)?;
        let context = SourceContext::new(
            self.config.list_id(container),
            name,
            &self.config.abuse_marker,
        );
        Ok(assemble_segments(&segments, &context))
    }

    /// Ingest every requested file, writing records unless `sink` is `None`
    ///
    /// Files that cannot be read or yield no messages are logged and
    /// skipped. A record the sink rejects on its own ends the run.
    pub fn run<S, K>(&self, store: &S, sink: Option<&K>, request: &RunRequest) -> Result<RunSummary>
    where
        S: ObjectStore + ?Sized,
        K: RecordSink + ?Sized,
    {
        let names = if request.filenames.is_empty() {
            store.list_object_names(&request.container, request.prefix.as_deref())?
        } else {
            request.filenames.clone()
        };
        info!(container = %request.container, files = names.len(), "Starting ingestion");

        let schema = record_schema();
        let mut summary = RunSummary::default();

        for name in &names {
            summary.files += 1;
            let records = match self.process_object(store, &request.container, name) {
                Ok(records) if records.is_empty() => {
                    warn!(file = %name, "No messages found in archive, skipping");
                    summary.skipped += 1;
                    continue;
                }
                Ok(records) => records,
                Err(e) if e.is_file_level() => {
                    warn!(file = %name, "Skipping archive: {e}");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            summary.segments += records.len();

            let mut written = 0;
            if let Some(sink) = sink {
                for chunk in records.chunks(self.config.chunk_size) {
                    written += store_records(sink, &request.destination, chunk, &schema)?;
                }
            }
            summary.records_written += written;
            info!(file = %name, records = records.len(), written, "Processed archive");
        }

        info!(
            files = summary.files,
            skipped = summary.skipped,
            records = summary.records_written,
            "Ingestion finished"
        );
        Ok(summary)
    }
}

/// Parse and assemble segments in order
#[must_use]
pub fn assemble_segments(
    segments: &[MessageSegment],
    context: &SourceContext,
) -> Vec<NormalizedRecord> {
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let record = assemble(&parse_message(segment, context));
            debug!(index, fields = record.len(), "Assembled record");
            record
        })
        .collect()
}
