//! Archive sources and record destinations
//!
//! The pipeline only talks to the two traits below. The filesystem adapters
//! stand in for a bucket and a table: a container is a directory under a
//! root, and a destination is a JSON-lines file with a schema file beside it.

use crate::error::{IngestError, Result};
use crate::schema::SchemaField;
use crate::types::{NormalizedRecord, Payload};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One fetched archive object and its declared content type
#[derive(Debug, Clone)]
pub struct ArchiveObject {
    pub content_type: String,
    pub payload: Payload,
}

/// Read access to archive objects
pub trait ObjectStore {
    /// Object names in the container, sorted, optionally limited to a prefix
    fn list_object_names(&self, container: &str, prefix: Option<&str>) -> Result<Vec<String>>;

    fn get_object(&self, container: &str, name: &str) -> Result<ArchiveObject>;
}

/// Append-only structured record store
pub trait RecordSink {
    /// Append a batch, creating the destination with `schema` if absent
    ///
    /// Batches the store cannot take in one write fail with
    /// [`IngestError::BatchTooLarge`].
    fn write_batch(
        &self,
        destination: &str,
        records: &[NormalizedRecord],
        schema: &[SchemaField],
    ) -> Result<usize>;
}

/// Write records, halving any batch the sink rejects as too large
///
/// Halves are retried independently in order. A single record that is
/// still too large fails with [`IngestError::RecordRejected`].
pub fn store_records<S: RecordSink + ?Sized>(
    sink: &S,
    destination: &str,
    records: &[NormalizedRecord],
    schema: &[SchemaField],
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    match sink.write_batch(destination, records, schema) {
        Err(IngestError::BatchTooLarge { records: count }) if records.len() > 1 => {
            let (left, right) = records.split_at(records.len() / 2);
            warn!(
                destination,
                count,
                left = left.len(),
                right = right.len(),
                "Batch too large, halving"
            );
            let written = store_records(sink, destination, left, schema)?;
            Ok(written + store_records(sink, destination, right, schema)?)
        }
        Err(IngestError::BatchTooLarge { .. }) => {
            let message_id = records[0].text("message_id").unwrap_or("<none>");
            Err(IngestError::RecordRejected {
                reason: format!("record {message_id} exceeds the batch limit on its own"),
            })
        }
        other => other,
    }
}

/// Containers are directories under `root`
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn content_type(path: &Path) -> &'static str {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz" | "gzip") => "application/x-gzip",
            _ => "text/plain",
        }
    }
}

impl ObjectStore for FsObjectStore {
    fn list_object_names(&self, container: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let dir = self.root.join(container);
        if !dir.is_dir() {
            return Err(IngestError::ObjectNotFound {
                container: container.to_string(),
                name: prefix.unwrap_or_default().to_string(),
            });
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let Ok(relative) = entry.path().strip_prefix(&dir) else {
                        continue;
                    };
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    if prefix.is_none_or(|p| name.starts_with(p)) {
                        names.push(name);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Error walking container {}: {}", dir.display(), e),
            }
        }

        names.sort();
        debug!(container, count = names.len(), "Listed archive objects");
        Ok(names)
    }

    fn get_object(&self, container: &str, name: &str) -> Result<ArchiveObject> {
        let path = self.root.join(container).join(name);
        if !path.is_file() {
            return Err(IngestError::ObjectNotFound {
                container: container.to_string(),
                name: name.to_string(),
            });
        }
        Ok(ArchiveObject {
            content_type: Self::content_type(&path).to_string(),
            payload: Payload::Bytes(fs::read(&path)?),
        })
    }
}

/// Destinations are `<dir>/<destination>.jsonl` files
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    dir: PathBuf,
    max_batch_bytes: Option<usize>,
}

impl JsonLinesSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_batch_bytes: None,
        }
    }

    /// Reject batches whose serialized size goes over `limit`
    #[must_use]
    pub fn with_max_batch_bytes(mut self, limit: usize) -> Self {
        self.max_batch_bytes = Some(limit);
        self
    }

    #[must_use]
    pub fn records_path(&self, destination: &str) -> PathBuf {
        self.dir.join(format!("{destination}.jsonl"))
    }

    #[must_use]
    pub fn schema_path(&self, destination: &str) -> PathBuf {
        self.dir.join(format!("{destination}.schema.json"))
    }
}

impl RecordSink for JsonLinesSink {
    fn write_batch(
        &self,
        destination: &str,
        records: &[NormalizedRecord],
        schema: &[SchemaField],
    ) -> Result<usize> {
        let lines = records
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let size: usize = lines.iter().map(|line| line.len() + 1).sum();
        if let Some(limit) = self.max_batch_bytes {
            if size > limit {
                return Err(IngestError::BatchTooLarge {
                    records: records.len(),
                });
            }
        }

        fs::create_dir_all(&self.dir)?;
        let schema_path = self.schema_path(destination);
        if !schema_path.exists() {
            fs::write(&schema_path, serde_json::to_vec_pretty(schema)?)?;
            info!(destination, path = %schema_path.display(), "Created destination");
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.records_path(destination))?;
        let mut writer = BufWriter::new(file);
        for line in &lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;

        debug!(destination, records = records.len(), bytes = size, "Wrote batch");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Accepts at most `limit` records per write and remembers batch sizes
    struct CountingSink {
        limit: usize,
        batches: RefCell<Vec<usize>>,
    }

    impl RecordSink for CountingSink {
        fn write_batch(
            &self,
            _destination: &str,
            records: &[NormalizedRecord],
            _schema: &[SchemaField],
        ) -> Result<usize> {
            if records.len() > self.limit {
                return Err(IngestError::BatchTooLarge {
                    records: records.len(),
                });
            }
            self.batches.borrow_mut().push(records.len());
            Ok(records.len())
        }
    }

    fn records(count: usize) -> Vec<NormalizedRecord> {
        (0..count)
            .map(|i| {
                let mut record = NormalizedRecord::new();
                record.insert("message_id", format!("<{i}@x>"));
                record
            })
            .collect()
    }

    #[test]
    fn test_halving_until_accepted() {
        let sink = CountingSink {
            limit: 2,
            batches: RefCell::new(Vec::new()),
        };
        let written = store_records(&sink, "t", &records(7), &[]).unwrap();
        assert_eq!(written, 7);
        assert_eq!(*sink.batches.borrow(), vec![1, 2, 2, 2]);
    }

    #[test]
    fn test_single_record_rejection_is_fatal() {
        let sink = CountingSink {
            limit: 0,
            batches: RefCell::new(Vec::new()),
        };
        let err = store_records(&sink, "t", &records(2), &[]).unwrap_err();
        assert!(matches!(err, IngestError::RecordRejected { .. }));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let sink = CountingSink {
            limit: 0,
            batches: RefCell::new(Vec::new()),
        };
        assert_eq!(store_records(&sink, "t", &[], &[]).unwrap(), 0);
        assert!(sink.batches.borrow().is_empty());
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(
            FsObjectStore::content_type(Path::new("a/2020-11.txt.gz")),
            "application/x-gzip"
        );
        assert_eq!(FsObjectStore::content_type(Path::new("a/2020-11.txt")), "text/plain");
    }
}
