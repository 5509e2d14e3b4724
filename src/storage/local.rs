//! Local filesystem rotation store.
//!
//! Writes go to a temporary sibling file which is then renamed over the
//! target, so a reader sees either the old or the new file, never half of one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{RawRecords, RotationRecords};
use crate::storage::RotationStore;

/// JSON file backend for rotation records.
#[derive(Debug, Clone)]
pub struct LocalRotationStore {
    path: PathBuf,
}

impl LocalRotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Move an unreadable state file aside so the next save does not erase it.
    async fn quarantine(&self) -> Result<PathBuf> {
        let aside = self.path.with_extension("corrupt");
        tokio::fs::rename(&self.path, &aside).await?;
        Ok(aside)
    }
}

#[async_trait]
impl RotationStore for LocalRotationStore {
    async fn load(&self) -> Result<RotationRecords> {
        let Some(bytes) = self.read_bytes().await? else {
            log::info!("No rotation state at {}, starting fresh", self.path.display());
            return Ok(RotationRecords::new());
        };

        let raw: RawRecords = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                let aside = self.quarantine().await?;
                log::warn!(
                    "Rotation state {} is unreadable ({}); moved to {} and starting fresh",
                    self.path.display(),
                    e,
                    aside.display()
                );
                return Ok(RotationRecords::new());
            }
        };

        let (records, rejected) = RotationRecords::from_raw(raw);
        if !rejected.is_empty() {
            log::warn!(
                "Ignoring {} rotation entries with invalid ids: {:?}",
                rejected.len(),
                rejected
            );
        }
        log::debug!(
            "Loaded {} rotation records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    async fn save(&self, records: &RotationRecords) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&records.to_raw())?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Saved {} rotation records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use tempfile::TempDir;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalRotationStore::new(tmp.path().join("random_seen.json"));

        let records = store.load().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalRotationStore::new(tmp.path().join("state/random_seen.json"));

        let mut records = RotationRecords::new();
        records.record(4_821_337, now());
        records.record(12, now() - Duration::days(3));
        records.prune(Duration::days(14), now());

        store.save(&records).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, records);
        assert!(!tmp.path().join("state/random_seen.tmp").exists());
    }

    #[tokio::test]
    async fn reads_legacy_float_timestamps() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("random_seen.json");
        tokio::fs::write(&path, r#"{"4821337": 1760000000.123456, "99": 1759990000}"#)
            .await
            .unwrap();

        let records = LocalRotationStore::new(&path).load().await.unwrap();

        assert_eq!(records.posted_at(4_821_337), Some(1_760_000_000));
        assert_eq!(records.posted_at(99), Some(1_759_990_000));
    }

    #[tokio::test]
    async fn written_file_is_human_readable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("random_seen.json");
        let store = LocalRotationStore::new(&path);

        let mut records = RotationRecords::new();
        records.record(7, now());
        store.save(&records).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "{\n  \"7\": 1760000000\n}");
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("random_seen.json");
        tokio::fs::write(&path, "{ truncated").await.unwrap();

        let records = LocalRotationStore::new(&path).load().await.unwrap();

        assert!(records.is_empty());
        assert!(!path.exists());
        assert!(tmp.path().join("random_seen.corrupt").exists());
    }
}
