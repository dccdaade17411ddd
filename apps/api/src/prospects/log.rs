//! The per-session prospect log: append-only, insertion-ordered.
//!
//! CRITICAL: rows are never edited or removed individually. The only mutations are
//! `append` and a whole-table `clear`. The in-memory table is authoritative; the
//! snapshot file is a best-effort mirror.
//!
//! Snapshot reads and writes run on the blocking pool. Callers hold the log's lock
//! across a write, so writes to one file never overtake each other.

use tracing::{info, warn};

use crate::prospects::models::ProspectRecord;
use crate::prospects::snapshot::{write_csv, SnapshotError, SnapshotStore};

/// What happened to the on-disk mirror after a mutation.
#[derive(Debug)]
pub enum PersistOutcome {
    /// No snapshot configured for this log.
    MemoryOnly,
    Persisted,
    /// The mutation stands in memory; the file is stale.
    Failed(SnapshotError),
}

impl PersistOutcome {
    /// User-facing warning for a failed mirror write.
    pub fn warning(&self) -> Option<String> {
        match self {
            PersistOutcome::Failed(e) => Some(format!(
                "Prospect log could not be saved to disk ({e}); \
                 it remains available for this session."
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ProspectLog {
    records: Vec<ProspectRecord>,
    snapshot: Option<SnapshotStore>,
}

impl ProspectLog {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a log mirrored to `snapshot`, loading any prior rows.
    /// An unreadable snapshot starts an empty log.
    pub async fn open(snapshot: SnapshotStore) -> Self {
        let loader = snapshot.clone();
        let loaded = tokio::task::spawn_blocking(move || loader.load())
            .await
            .unwrap_or_else(|e| Err(SnapshotError::from(e)));

        let records = match loaded {
            Ok(records) => {
                info!(
                    "Loaded {} prospects from {}",
                    records.len(),
                    snapshot.path().display()
                );
                records
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable prospect snapshot {}: {e}",
                    snapshot.path().display()
                );
                Vec::new()
            }
        };

        Self {
            records,
            snapshot: Some(snapshot),
        }
    }

    pub async fn append(&mut self, record: ProspectRecord) -> PersistOutcome {
        self.records.push(record);
        self.persist().await
    }

    pub fn records(&self) -> &[ProspectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every row immediately. There is no undo.
    pub async fn clear(&mut self) -> PersistOutcome {
        self.records.clear();
        self.persist().await
    }

    /// Whether the log is mirrored to a snapshot file.
    pub fn is_persistent(&self) -> bool {
        self.snapshot.is_some()
    }

    pub async fn persist(&self) -> PersistOutcome {
        let Some(snapshot) = self.snapshot.clone() else {
            return PersistOutcome::MemoryOnly;
        };
        let path = snapshot.path().to_path_buf();
        let records = self.records.clone();

        let saved = tokio::task::spawn_blocking(move || snapshot.save(&records))
            .await
            .unwrap_or_else(|e| Err(SnapshotError::from(e)));

        match saved {
            Ok(()) => PersistOutcome::Persisted,
            Err(e) => {
                warn!("Failed to persist prospect snapshot {}: {e}", path.display());
                PersistOutcome::Failed(e)
            }
        }
    }

    pub fn export_csv(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut buf = Vec::new();
        write_csv(&self.records, &mut buf)?;
        Ok(buf)
    }

    pub fn export_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.records)
    }
}
