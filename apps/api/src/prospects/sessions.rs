use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::AppError;
use crate::prospects::log::{PersistOutcome, ProspectLog};
use crate::prospects::snapshot::SnapshotStore;

pub const SESSION_HEADER: &str = "x-session-id";
pub const DEFAULT_SESSION: &str = "default";
const MAX_SESSION_ID_LEN: usize = 64;

/// Identifies whose prospect log a request touches. Also used as the snapshot file stem,
/// so only `[A-Za-z0-9_-]` is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::Validation(format!(
                "{SESSION_HEADER} must be 1-{MAX_SESSION_ID_LEN} characters of [A-Za-z0-9_-]"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION.to_string())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(SESSION_HEADER) {
            None => Ok(SessionId::default()),
            Some(value) => {
                let raw = value.to_str().map_err(|_| {
                    AppError::Validation(format!("{SESSION_HEADER} must be ASCII"))
                })?;
                SessionId::parse(raw.trim())
            }
        }
    }
}

pub type SharedLog = Arc<Mutex<ProspectLog>>;

/// One independent prospect log per session. Logs are never shared across sessions.
///
/// A log is registered only when a session first appends, or when a snapshot for it
/// already exists on disk. Reads for unknown sessions see an empty log without
/// registering anything.
pub struct SessionStore {
    logs: Mutex<HashMap<SessionId, SharedLog>>,
    snapshot_dir: Option<PathBuf>,
}

/// Result of clearing one session's log.
#[derive(Debug)]
pub struct Cleared {
    pub count: usize,
    pub outcome: PersistOutcome,
}

impl SessionStore {
    pub fn new(snapshot_dir: Option<PathBuf>) -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
            snapshot_dir,
        }
    }

    /// Number of registered session logs.
    pub async fn len(&self) -> usize {
        self.logs.lock().await.len()
    }

    fn snapshot_for(&self, id: &SessionId) -> Option<SnapshotStore> {
        self.snapshot_dir
            .as_ref()
            .map(|dir| SnapshotStore::new(dir.join(format!("{}.csv", id.as_str()))))
    }

    /// Returns the session's log for appending, registering it on first use.
    pub async fn log(&self, id: &SessionId) -> SharedLog {
        if let Some(log) = self.logs.lock().await.get(id) {
            return Arc::clone(log);
        }

        // Loaded outside the registry lock.
        let log = match self.snapshot_for(id) {
            Some(snapshot) => ProspectLog::open(snapshot).await,
            None => ProspectLog::in_memory(),
        };

        let mut logs = self.logs.lock().await;
        let log = logs
            .entry(id.clone())
            .or_insert_with(|| {
                debug!("Opened prospect log for session '{}'", id.as_str());
                Arc::new(Mutex::new(log))
            });
        Arc::clone(log)
    }

    /// Returns the session's log if it has one, in memory or on disk. Never registers
    /// a log for a session that has nothing stored.
    pub async fn existing(&self, id: &SessionId) -> Option<SharedLog> {
        if let Some(log) = self.logs.lock().await.get(id) {
            return Some(Arc::clone(log));
        }

        let snapshot = self.snapshot_for(id)?;
        let on_disk = tokio::fs::try_exists(snapshot.path()).await.unwrap_or(false);
        if !on_disk {
            return None;
        }
        Some(self.log(id).await)
    }

    /// Empties the session's log. A memory-only log that nobody else holds is dropped
    /// from the registry afterwards.
    pub async fn clear(&self, id: &SessionId) -> Cleared {
        let Some(log) = self.existing(id).await else {
            return Cleared {
                count: 0,
                outcome: PersistOutcome::MemoryOnly,
            };
        };

        let (count, outcome) = {
            let mut guard = log.lock().await;
            let count = guard.len();
            (count, guard.clear().await)
        };
        self.release(id, log).await;

        Cleared { count, outcome }
    }

    /// Hands back a handle obtained from [`SessionStore::log`]. The log is dropped from the registry when it is
    /// memory-only, empty, and held by nobody else.
    pub async fn release(&self, id: &SessionId, log: SharedLog) {
        let mut logs = self.logs.lock().await;
        let registered = logs.get(id).is_some_and(|entry| Arc::ptr_eq(entry, &log));
        // Handles are only handed out under the registry lock, so a count of two
        // (the map and `log`) means no other request holds this log.
        if !registered || Arc::strong_count(&log) != 2 {
            return;
        }

        let idle = log
            .try_lock()
            .map(|guard| !guard.is_persistent() && guard.is_empty())
            .unwrap_or(false);
        if idle {
            logs.remove(id);
            debug!("Dropped empty prospect log for session '{}'", id.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prospects::models::ProspectRecord;
    use chrono::NaiveDate;

    fn record() -> ProspectRecord {
        ProspectRecord {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            university: "Boston University".into(),
            role: "Dean of Students".into(),
            priority: "Medium".into(),
            status: "Researched".into(),
            output_preview: "SUBJECT: ...".into(),
        }
    }

    #[test]
    fn test_session_id_validation() {
        assert!(SessionId::parse("team-a_1").is_ok());
        assert!(SessionId::parse("").is_err());
        assert!(SessionId::parse("../etc/passwd").is_err());
        assert!(SessionId::parse(&"x".repeat(65)).is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(None);
        let alice = SessionId::parse("alice").unwrap();
        let bob = SessionId::parse("bob").unwrap();

        store.log(&alice).await.lock().await.append(record()).await;

        assert_eq!(store.log(&alice).await.lock().await.len(), 1);
        assert!(store.existing(&bob).await.is_none());
    }

    #[tokio::test]
    async fn test_reads_for_unknown_sessions_register_nothing() {
        let store = SessionStore::new(None);
        for n in 0..100 {
            let id = SessionId::parse(&format!("visitor-{n}")).unwrap();
            assert!(store.existing(&id).await.is_none());
            assert_eq!(store.clear(&id).await.count, 0);
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_clearing_a_memory_only_log_drops_it() {
        let store = SessionStore::new(None);
        let id = SessionId::parse("dave").unwrap();
        store.log(&id).await.lock().await.append(record()).await;
        assert_eq!(store.len().await, 1);

        let cleared = store.clear(&id).await;
        assert_eq!(cleared.count, 1);
        assert_eq!(store.len().await, 0);
        assert!(store.existing(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_released_empty_log_is_dropped() {
        let store = SessionStore::new(None);
        let id = SessionId::parse("frank").unwrap();

        let log = store.log(&id).await;
        assert_eq!(store.len().await, 1);
        store.release(&id, log).await;
        assert_eq!(store.len().await, 0);

        let log = store.log(&id).await;
        log.lock().await.append(record()).await;
        store.release(&id, log).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_keeps_a_log_another_request_holds() {
        let store = SessionStore::new(None);
        let id = SessionId::parse("erin").unwrap();
        let held = store.log(&id).await;
        held.lock().await.append(record()).await;

        store.clear(&id).await;
        assert_eq!(store.len().await, 1);

        // A late append through the held handle stays visible to later reads.
        held.lock().await.append(record()).await;
        let log = store.existing(&id).await.unwrap();
        assert_eq!(log.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_file_is_named_after_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().to_path_buf()));
        let id = SessionId::parse("carol").unwrap();

        store.log(&id).await.lock().await.append(record()).await;

        assert!(dir.path().join("carol.csv").exists());

        // A fresh store (new process) picks the rows back up on first read.
        let restarted = SessionStore::new(Some(dir.path().to_path_buf()));
        let log = restarted.existing(&id).await.unwrap();
        assert_eq!(log.lock().await.len(), 1);

        // Sessions without a snapshot stay unregistered.
        let stranger = SessionId::parse("stranger").unwrap();
        assert!(restarted.existing(&stranger).await.is_none());
        assert_eq!(restarted.len().await, 1);
    }
}
