use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::prospects::models::ProspectRecord;

/// Column names, identical to the `ProspectRecord` field names.
pub const CSV_HEADER: [&str; 6] = [
    "date",
    "university",
    "role",
    "priority",
    "status",
    "output_preview",
];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot CSV is malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not replace snapshot file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("snapshot worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// A CSV file mirroring one session's prospect log.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record. A missing file is an empty log, not an error.
    pub fn load(&self) -> Result<Vec<ProspectRecord>, SnapshotError> {
        match File::open(&self.path) {
            Ok(file) => read_csv(file),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrites the whole file atomically: write a sibling temp file, then rename over.
    pub fn save(&self, records: &[ProspectRecord]) -> Result<(), SnapshotError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        write_csv(records, &mut tmp)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

/// Header row followed by one row per record, in the given order.
pub fn write_csv<W: Write>(records: &[ProspectRecord], writer: W) -> Result<(), SnapshotError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ProspectRecord>, SnapshotError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records = rdr
        .deserialize::<ProspectRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
