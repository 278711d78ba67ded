//! JSON-file storage for [`DeletionRecord`]s.
//!
//! The file holds a JSON array in insertion order. Each mutation is a
//! read-modify-write under an async mutex, committed by writing a sibling
//! temporary file and renaming it over the ledger. A missing file is an
//! empty ledger.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::record::{DeletionRecord, LedgerEntry};

/// Records kept before the oldest are evicted.
pub const DEFAULT_RETENTION: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

pub struct DeletionLedger {
    path: PathBuf,
    retention: usize,
    lock: Mutex<()>,
}

impl DeletionLedger {
    /// Open a ledger at `path` keeping at most `retention` records (at
    /// least one).
    pub fn new(path: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            path: path.into(),
            retention: retention.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Append a record, evicting the oldest records beyond the retention
    /// cap. Returns the ids of evicted records.
    pub async fn append(&self, record: DeletionRecord) -> Result<Vec<String>, LedgerError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let record_id = record.record_id.clone();
        records.push(record);

        let overflow = records.len().saturating_sub(self.retention);
        let evicted: Vec<String> = records
            .drain(..overflow)
            .map(|r| r.record_id)
            .collect();

        self.store(&records).await?;
        tracing::info!(
            record_id = %record_id,
            evicted = evicted.len(),
            total = records.len(),
            "Deletion record appended",
        );
        Ok(evicted)
    }

    pub async fn find(&self, record_id: &str) -> Result<Option<DeletionRecord>, LedgerError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.record_id == record_id))
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        Ok(records.iter().rev().map(DeletionRecord::entry).collect())
    }

    /// Remove one record. Returns `false` if it was not in the ledger.
    pub async fn remove(&self, record_id: &str) -> Result<bool, LedgerError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.record_id != record_id);
        if records.len() == before {
            return Ok(false);
        }

        self.store(&records).await?;
        tracing::info!(record_id, "Deletion record pruned");
        Ok(true)
    }

    // ---- private helpers ----

    async fn load(&self) -> Result<Vec<DeletionRecord>, LedgerError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn store(&self, records: &[DeletionRecord]) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let bytes = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use zoneops_core::geometry::BoundingBox;
    use zoneops_core::widget::{Widget, WidgetType};

    use super::*;

    fn record() -> DeletionRecord {
        DeletionRecord::new(
            "z1",
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
            vec![Widget::new(WidgetType::Note)],
        )
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeletionLedger::new(dir.path().join("ledger.json"), 5);
        assert!(ledger.list().await.unwrap().is_empty());
        assert!(ledger.find("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeletionLedger::new(dir.path().join("ledger.json"), 5);
        let rec = record();
        let id = rec.record_id.clone();

        assert!(ledger.append(rec.clone()).await.unwrap().is_empty());
        assert_eq!(ledger.find(&id).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let ledger = DeletionLedger::new(&path, 5);
        ledger.append(record()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn zero_retention_keeps_one() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeletionLedger::new(dir.path().join("ledger.json"), 0);
        assert_eq!(ledger.retention(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{not json").unwrap();
        let ledger = DeletionLedger::new(&path, 5);
        assert!(matches!(ledger.list().await, Err(LedgerError::Serde(_))));
    }
}
