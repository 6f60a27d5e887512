//! File-backed JSON document store
//!
//! One document per key, stored as pretty-printed JSON under `database/`.
//! Writes are serialized per key with a lock marker, preceded by a backup of
//! the previous file, and land through a temp file + rename so readers never
//! observe a half-written document.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path as StdPath, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::core::config::{BackupPolicy, StoreConfig};
use crate::core::errors::{Result, StoreError};
use crate::core::key::{sanitize, DocumentKey};
use crate::core::path::DocPath;
use crate::core::value::{coerce_integers, is_empty_document, merge_document};

use super::backup::Backups;
use super::layout::{document_stem, is_temp_file, Layout};
use super::lock::KeyLock;
use super::report::{BackupInfo, DeleteOutcome, IntegrityReport};

/// State of a document file as seen by a writer holding its lock
enum Current {
    Missing,
    Valid(Value),
    Corrupt,
}

/// Result of restoring a corrupted document from its latest backup
enum Recovery {
    Restored,
    NoBackup,
    InvalidBackup(String),
}

/// The document store
pub struct DocumentStore {
    config: StoreConfig,
    layout: Layout,
    backups: Backups,
    /// Keys whose reads degraded to "empty" since the last integrity report
    degraded_reads: Mutex<BTreeSet<String>>,
}

impl DocumentStore {
    /// Create a store without touching the filesystem. Call `init` before use.
    pub fn new(config: StoreConfig) -> Self {
        let layout = Layout::new(&config.base_dir);
        let backups = Backups::new(layout.clone(), config.max_backups);
        DocumentStore {
            config,
            layout,
            backups,
            degraded_reads: Mutex::new(BTreeSet::new()),
        }
    }

    /// Create a store and make sure its directories exist
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let store = DocumentStore::new(config);
        store.init().await?;
        Ok(store)
    }

    /// Ensure `database/`, `database/backups/` and `database/locks/` exist
    pub async fn init(&self) -> Result<()> {
        self.layout.ensure_dirs().await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Whole document, or `None` if it is missing, empty, or unreadable
    pub async fn get<K: Into<DocumentKey>>(&self, key: K) -> Result<Option<Value>> {
        let key = key.into();
        let doc = self.load_document(&key).await?;
        Ok(doc.filter(|d| !is_empty_document(d)))
    }

    /// Value at `path` inside a document, or `None` if any segment is missing
    pub async fn get_at<K, P>(&self, key: K, path: P) -> Result<Option<Value>>
    where
        K: Into<DocumentKey>,
        P: Into<DocPath>,
    {
        let key = key.into();
        let path = path.into();
        if path.is_empty() {
            return self.get(key).await;
        }

        let doc = match self.load_document(&key).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        Ok(path.resolve(&doc).filter(|v| !v.is_null()).cloned())
    }

    /// Every stored key (the sanitized file stems), sorted
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let dir = self.layout.database_dir();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::io(dir, e))? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(stem) = entry.file_name().to_str().and_then(document_stem) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Every document keyed by its key. Unreadable documents map to `null`.
    pub async fn get_all(&self) -> Result<Map<String, Value>> {
        self.collect_documents(|_| true).await
    }

    /// Documents whose key starts with `prefix`
    pub async fn get_prefix(&self, prefix: &str) -> Result<Map<String, Value>> {
        let prefix = sanitize(prefix);
        self.collect_documents(|key| key.starts_with(&prefix)).await
    }

    async fn collect_documents<F>(&self, filter: F) -> Result<Map<String, Value>>
    where
        F: Fn(&str) -> bool,
    {
        let mut result = Map::new();
        for key in self.list_keys().await? {
            if !filter(&key) {
                continue;
            }
            let doc = self.load_document(&DocumentKey::new(key.as_str())).await?;
            result.insert(key, doc.unwrap_or(Value::Null));
        }
        Ok(result)
    }

    /// Read and parse a document, recovering it from backup if corrupted.
    ///
    /// Missing and unrecoverable documents are `None`; only I/O failures
    /// other than "not found" are errors.
    async fn load_document(&self, key: &DocumentKey) -> Result<Option<Value>> {
        if key.is_empty() {
            return Ok(None);
        }
        let stem = key.sanitized();
        let live = self.layout.document_file(&stem);

        let bytes = match read_file(&live).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => return Ok(Some(doc)),
            Err(e) => error!("Corrupted JSON file {}: {}", live.display(), e),
        }

        let lock = match self.lock(&stem).await {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Cannot recover {} right now: {}", live.display(), e);
                self.note_degraded_read(&stem).await;
                return Ok(None);
            }
        };
        let current = self.read_current(&stem, &live).await;
        lock.release().await;

        match current? {
            Current::Valid(doc) => Ok(Some(doc)),
            Current::Missing => Ok(None),
            Current::Corrupt => {
                self.note_degraded_read(&stem).await;
                Ok(None)
            }
        }
    }

    async fn note_degraded_read(&self, stem: &str) {
        warn!("Read of `{}` degraded to an empty document", stem);
        self.degraded_reads.lock().await.insert(stem.to_string());
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Merge `value` into the document and return the document as stored.
    ///
    /// Integers are stored as strings. When both the stored document and
    /// `value` are objects they are deep-merged, otherwise `value` replaces
    /// the document.
    pub async fn set<K, V>(&self, key: K, value: &V) -> Result<Value>
    where
        K: Into<DocumentKey>,
        V: Serialize + ?Sized,
    {
        let key = key.into();
        let value = coerce_integers(serde_json::to_value(value)?);
        self.write(&key, value).await
    }

    /// Merge `value` into the document at `path`, creating intermediate
    /// objects as needed.
    pub async fn set_at<K, P, V>(&self, key: K, path: P, value: &V) -> Result<Value>
    where
        K: Into<DocumentKey>,
        P: Into<DocPath>,
        V: Serialize + ?Sized,
    {
        let key = key.into();
        let value = coerce_integers(serde_json::to_value(value)?);
        self.write(&key, path.into().nest(value)).await
    }

    async fn write(&self, key: &DocumentKey, value: Value) -> Result<Value> {
        let stem = writable_stem(key)?;
        let lock = self.lock(&stem).await?;
        let result = self.merge_locked(&stem, value).await;
        lock.release().await;
        result
    }

    async fn merge_locked(&self, stem: &str, value: Value) -> Result<Value> {
        let live = self.layout.document_file(stem);

        let existing = match self.read_current(stem, &live).await? {
            Current::Valid(doc) => {
                self.backup(stem, &live).await?;
                doc
            }
            Current::Missing | Current::Corrupt => Value::Object(Map::new()),
        };

        let merged = merge_document(existing, value);
        self.persist(stem, &live, &merged).await?;
        Ok(merged)
    }

    /// Remove the whole document. `None` if it did not exist.
    pub async fn delete<K: Into<DocumentKey>>(&self, key: K) -> Result<Option<DeleteOutcome>> {
        let key = key.into();
        if key.is_empty() {
            return Ok(None);
        }
        let stem = key.sanitized();
        let live = self.layout.document_file(&stem);

        if !exists(&live).await? {
            return Ok(None);
        }

        let lock = self.lock(&stem).await?;
        let removed = tokio::fs::remove_file(&live).await;
        lock.release().await;

        match removed {
            Ok(()) => {
                info!("Deleted document {}", key);
                Ok(Some(DeleteOutcome::Removed))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&live, e)),
        }
    }

    /// Remove the value at `path` and return the document as now stored.
    /// `None` if the document or any segment of the path is missing.
    pub async fn delete_at<K, P>(&self, key: K, path: P) -> Result<Option<DeleteOutcome>>
    where
        K: Into<DocumentKey>,
        P: Into<DocPath>,
    {
        let key = key.into();
        let path = path.into();
        if path.is_empty() {
            return self.delete(key).await;
        }

        if key.is_empty() {
            return Ok(None);
        }
        let stem = key.sanitized();
        let live = self.layout.document_file(&stem);
        if !exists(&live).await? {
            return Ok(None);
        }

        let lock = self.lock(&stem).await?;
        let result = self.remove_path_locked(&stem, &live, &path).await;
        lock.release().await;
        result
    }

    async fn remove_path_locked(
        &self,
        stem: &str,
        live: &StdPath,
        path: &DocPath,
    ) -> Result<Option<DeleteOutcome>> {
        let mut doc = match self.read_current(stem, live).await? {
            Current::Valid(doc) => doc,
            Current::Missing | Current::Corrupt => return Ok(None),
        };

        if path.remove_from(&mut doc).is_none() {
            debug!("Nothing at {}/{} to delete", stem, path);
            return Ok(None);
        }

        self.backup(stem, live).await?;
        self.persist(stem, live, &doc).await?;
        Ok(Some(DeleteOutcome::Updated(doc)))
    }

    /// Delete every live document. Backups and lock markers are kept.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut deleted = 0;
        for key in self.list_keys().await? {
            if let Some(DeleteOutcome::Removed) = self.delete(key.as_str()).await? {
                deleted += 1;
            }
        }
        info!("Cleared {} documents", deleted);
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Check every document and restore corrupted ones from their latest
    /// backup. Safe to run repeatedly.
    pub async fn verify_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport::default();

        let keys = match self.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                report.errors.push(format!("Error listing documents: {}", e));
                Vec::new()
            }
        };

        for stem in keys {
            report.checked += 1;
            let live = self.layout.document_file(&stem);

            match read_file(&live).await {
                Ok(Some(bytes)) if serde_json::from_slice::<Value>(&bytes).is_err() => {}
                Ok(_) => continue,
                Err(e) => {
                    report.errors.push(format!("Error checking {}: {}", live.display(), e));
                    continue;
                }
            }

            let lock = match self.lock(&stem).await {
                Ok(lock) => lock,
                Err(e) => {
                    report.corrupted += 1;
                    report.errors.push(format!("Failed to recover {}: {}", live.display(), e));
                    continue;
                }
            };
            let outcome = self.check_and_recover(&stem, &live).await;
            lock.release().await;

            match outcome {
                Ok(None) => {}
                Ok(Some(Recovery::Restored)) => {
                    report.corrupted += 1;
                    report.recovered += 1;
                }
                Ok(Some(Recovery::NoBackup)) => {
                    report.corrupted += 1;
                    report
                        .errors
                        .push(format!("Failed to recover {}: no backup available", live.display()));
                }
                Ok(Some(Recovery::InvalidBackup(name))) => {
                    report.corrupted += 1;
                    report.errors.push(format!(
                        "Failed to recover {}: backup {} is not valid JSON",
                        live.display(),
                        name
                    ));
                }
                Err(e) => {
                    report.corrupted += 1;
                    report.errors.push(format!("Failed to recover {}: {}", live.display(), e));
                }
            }
        }

        self.sweep_leftovers(&mut report).await;

        let degraded = std::mem::take(&mut *self.degraded_reads.lock().await);
        report.degraded_reads = degraded.into_iter().collect();

        info!("Database integrity check complete: {:?}", report);
        report
    }

    /// Delete temp files left by interrupted writes and report lock markers
    /// older than the lock timeout
    async fn sweep_leftovers(&self, report: &mut IntegrityReport) {
        let min_age = self.config.lock_timeout;

        match files_older_than(self.layout.database_dir(), min_age, is_temp_file).await {
            Ok(leftovers) => {
                for tmp in leftovers {
                    match tokio::fs::remove_file(&tmp).await {
                        Ok(()) => {
                            info!("Removed leftover temp file {}", tmp.display());
                            report.removed_temp_files += 1;
                        }
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => report
                            .errors
                            .push(format!("Error removing temp file {}: {}", tmp.display(), e)),
                    }
                }
            }
            Err(e) => report.errors.push(format!("Error scanning for temp files: {}", e)),
        }

        let is_lock = |name: &str| name.ends_with(".lock");
        match files_older_than(self.layout.lock_dir(), min_age, is_lock).await {
            Ok(stale) => {
                for marker in stale {
                    warn!("Stale lock marker {}", marker.display());
                    report.errors.push(format!(
                        "Stale lock marker {}: remove it if no writer is running",
                        marker.display()
                    ));
                }
            }
            Err(e) => report.errors.push(format!("Error scanning lock markers: {}", e)),
        }
    }

    /// Re-check a document under its lock; `None` if it parses now
    async fn check_and_recover(&self, stem: &str, live: &StdPath) -> Result<Option<Recovery>> {
        match read_file(live).await? {
            Some(bytes) if serde_json::from_slice::<Value>(&bytes).is_err() => {
                self.recover(stem, live).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Backup count, newest and oldest backup per key
    pub async fn backup_status(&self) -> Result<BTreeMap<String, BackupInfo>> {
        self.backups
            .status()
            .await
            .map_err(|e| StoreError::io(self.layout.backup_dir(), e))
    }

    /// Backup file names of one key, newest first
    pub async fn list_backups<K: Into<DocumentKey>>(&self, key: K) -> Result<Vec<String>> {
        let stem = key.into().sanitized();
        let backups = self
            .backups
            .list(&stem)
            .await
            .map_err(|e| StoreError::io(self.layout.backup_dir(), e))?;
        Ok(backups.into_iter().map(|b| b.file_name).collect())
    }

    /// Copy a named backup over the live document.
    ///
    /// `false` if the backup does not exist or does not hold valid JSON.
    pub async fn restore_from_backup<K: Into<DocumentKey>>(
        &self,
        key: K,
        backup_name: &str,
    ) -> Result<bool> {
        let key = key.into();
        let stem = writable_stem(&key)?;
        if backup_name.is_empty()
            || backup_name.contains(['/', '\\'])
            || backup_name.contains("..")
        {
            error!("Backup file not found: {}", backup_name);
            return Ok(false);
        }

        let backup = self.layout.backup_file(backup_name);
        if !exists(&backup).await? {
            error!("Backup file not found: {}", backup_name);
            return Ok(false);
        }

        let live = self.layout.document_file(&stem);
        let lock = self.lock(&stem).await?;
        let promoted = self.promote(&stem, &backup, &live).await;
        lock.release().await;

        if promoted? {
            info!("Successfully restored {} from {}", key, backup_name);
            Ok(true)
        } else {
            error!("Backup {} is not valid JSON, {} left unchanged", backup_name, key);
            Ok(false)
        }
    }

    /// Write every document into one JSON object. Defaults to
    /// `database_export_<timestamp>.json` in the base directory.
    pub async fn export_all(&self, path: Option<&StdPath>) -> Option<PathBuf> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.config.base_dir.join(format!(
                "database_export_{}.json",
                Local::now().format("%Y%m%d_%H%M%S")
            )),
        };

        match self.write_export(&target).await {
            Ok(()) => {
                info!("Database exported to {}", target.display());
                Some(target)
            }
            Err(e) => {
                error!("Error exporting database: {}", e);
                None
            }
        }
    }

    async fn write_export(&self, target: &StdPath) -> Result<()> {
        let all = Value::Object(self.get_all().await?);
        let text = serde_json::to_string_pretty(&all)?;
        tokio::fs::write(target, text)
            .await
            .map_err(|e| StoreError::io(target, e))
    }

    // ------------------------------------------------------------------
    // Internals shared by reads and writes
    // ------------------------------------------------------------------

    async fn lock(&self, stem: &str) -> Result<KeyLock> {
        KeyLock::acquire(
            stem,
            self.layout.lock_file(stem),
            self.config.lock_timeout,
            self.config.lock_poll_interval,
        )
        .await
    }

    /// Load the live file; caller holds the key's lock. A corrupted file is
    /// restored from backup first when possible.
    async fn read_current(&self, stem: &str, live: &StdPath) -> Result<Current> {
        let bytes = match read_file(live).await? {
            Some(bytes) => bytes,
            None => return Ok(Current::Missing),
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => return Ok(Current::Valid(doc)),
            Err(e) => error!("Corrupted JSON file {}: {}", live.display(), e),
        }

        match self.recover(stem, live).await {
            Ok(Recovery::Restored) => {}
            Ok(_) => return Ok(Current::Corrupt),
            Err(e) => {
                error!("Recovery failed for {}: {}", live.display(), e);
                return Ok(Current::Corrupt);
            }
        }

        match read_file(live).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)
                .map(Current::Valid)
                .unwrap_or(Current::Corrupt)),
            None => Ok(Current::Missing),
        }
    }

    /// Replace the live file with its latest backup; caller holds the lock.
    /// Older backups are never tried.
    async fn recover(&self, stem: &str, live: &StdPath) -> Result<Recovery> {
        let latest = self
            .backups
            .latest(stem)
            .await
            .map_err(|e| StoreError::io(self.layout.backup_dir(), e))?;

        let latest = match latest {
            Some(latest) => latest,
            None => {
                warn!("No backup available to recover {}", live.display());
                return Ok(Recovery::NoBackup);
            }
        };

        info!("Attempting recovery for {} using {}", live.display(), latest.file_name);
        let backup = self.layout.backup_file(&latest.file_name);
        if self.promote(stem, &backup, live).await? {
            info!("Successfully recovered {}", live.display());
            Ok(Recovery::Restored)
        } else {
            error!("Recovery failed for {}: {} does not parse", live.display(), latest.file_name);
            Ok(Recovery::InvalidBackup(latest.file_name))
        }
    }

    /// Copy `source` to a temp file, check it parses, then rename it over
    /// `live`. `false` (and nothing changed) if it does not parse.
    async fn promote(&self, stem: &str, source: &StdPath, live: &StdPath) -> Result<bool> {
        let tmp = self.layout.temp_file(stem);
        tokio::fs::copy(source, &tmp)
            .await
            .map_err(|e| StoreError::io(source, e))?;

        let parses = match tokio::fs::read(&tmp).await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).is_ok(),
            Err(e) => {
                discard(&tmp).await;
                return Err(StoreError::io(&tmp, e));
            }
        };

        if !parses {
            discard(&tmp).await;
            return Ok(false);
        }

        if let Err(e) = tokio::fs::rename(&tmp, live).await {
            discard(&tmp).await;
            return Err(StoreError::io(live, e));
        }
        Ok(true)
    }

    /// Back up the live file according to the configured policy
    async fn backup(&self, stem: &str, live: &StdPath) -> Result<()> {
        match self.backups.create(stem, live).await {
            Ok(_) => Ok(()),
            Err(e) => match self.config.backup_policy {
                BackupPolicy::BestEffort => {
                    error!("Error creating backup for {}: {}", live.display(), e);
                    Ok(())
                }
                BackupPolicy::Required => Err(StoreError::Backup {
                    key: stem.to_string(),
                    source: e,
                }),
            },
        }
    }

    /// Write `doc` as pretty JSON through a temp file and rename it over `live`
    async fn persist(&self, stem: &str, live: &StdPath, doc: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(doc)?;
        let tmp = self.layout.temp_file(stem);

        if let Err(e) = write_synced(&tmp, text.as_bytes()).await {
            discard(&tmp).await;
            error!("Error saving database file {}: {}", live.display(), e);
            return Err(StoreError::io(&tmp, e));
        }

        if let Err(e) = tokio::fs::rename(&tmp, live).await {
            discard(&tmp).await;
            error!("Error saving database file {}: {}", live.display(), e);
            return Err(StoreError::io(live, e));
        }

        info!("Successfully saved {}", live.display());
        Ok(())
    }
}

/// File stem of a key about to be written
fn writable_stem(key: &DocumentKey) -> Result<String> {
    if key.is_empty() {
        return Err(StoreError::InvalidOperation(
            "document key must not be empty".to_string(),
        ));
    }
    Ok(key.sanitized())
}

/// Files in `dir` whose name matches and that were last modified at least
/// `min_age` ago, sorted
async fn files_older_than<F>(dir: &StdPath, min_age: Duration, matches: F) -> io::Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_str().map(|n| matches(n)).unwrap_or(false) {
            continue;
        }
        let modified = entry.metadata().await?.modified()?;
        if now.duration_since(modified).unwrap_or_default() >= min_age {
            found.push(entry.path());
        }
    }

    found.sort();
    Ok(found)
}

async fn read_file(path: &StdPath) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

async fn exists(path: &StdPath) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

async fn write_synced(path: &StdPath, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn discard(path: &StdPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove temp file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn test_config(dir: &TempDir) -> StoreConfig {
        StoreConfig::new(dir.path())
            .with_lock_poll_interval(Duration::from_millis(5))
            .with_lock_timeout(Duration::from_secs(5))
    }

    async fn open_store(dir: &TempDir) -> DocumentStore {
        DocumentStore::open(test_config(dir)).await.unwrap()
    }

    fn seed_backup(store: &DocumentStore, stem: &str, day: u32, content: &str) -> String {
        let name = format!("{}_200001{:02}_000000.json", stem, day);
        std::fs::write(store.layout().backup_file(&name), content).unwrap();
        name
    }

    #[tokio::test]
    async fn test_open_creates_layout() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        assert!(store.layout().database_dir().is_dir());
        assert!(store.layout().backup_dir().is_dir());
        assert!(store.layout().lock_dir().is_dir());

        // init is idempotent
        store.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_coerces_integers() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        let stored = store
            .set("Users", &json!({"1": {"cap": 53, "ids": [1, 2], "active": true, "ratio": 0.5}}))
            .await
            .unwrap();
        let expected = json!({"1": {"cap": "53", "ids": ["1", "2"], "active": true, "ratio": 0.5}});
        assert_eq!(stored, expected);
        assert_eq!(store.get("Users").await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_path_addressing() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Teams", &json!({"a": {"b": {"c": 1}}})).await.unwrap();

        assert_eq!(store.get_at("Teams", "a/b/c").await.unwrap(), Some(json!("1")));
        assert_eq!(store.get_at("Teams", "a/b/x").await.unwrap(), None);
        assert_eq!(store.get_at("Missing", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_integer_path_segments() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let guild: u64 = 112233445566778899;
        let user: u64 = 998877665544332211;

        let mut payload = HashMap::new();
        payload.insert(guild, HashMap::from([(user, json!({"contract": 2}))]));
        store.set("Contracts", &payload).await.unwrap();

        assert_eq!(
            store.get_at("Contracts", [guild, user]).await.unwrap(),
            Some(json!({"contract": "2"}))
        );
        assert_eq!(
            store.get_at("Contracts", guild).await.unwrap().map(|v| v.is_object()),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_merge_semantics() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Stats", &json!({"1": {"x": 1}})).await.unwrap();
        let merged = store.set("Stats", &json!({"1": {"y": 2}})).await.unwrap();
        assert_eq!(merged, json!({"1": {"x": "1", "y": "2"}}));

        store.set("Toggle", "Off").await.unwrap();
        let replaced = store.set("Toggle", &json!({"1": {"y": 2}})).await.unwrap();
        assert_eq!(replaced, json!({"1": {"y": "2"}}));
        assert_eq!(store.get("Toggle").await.unwrap(), Some(json!({"1": {"y": "2"}})));
    }

    #[tokio::test]
    async fn test_scalar_replaces_object() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Mode", &json!({"1": "On"})).await.unwrap();
        assert_eq!(store.set("Mode", "Off").await.unwrap(), json!("Off"));
        assert_eq!(store.get("Mode").await.unwrap(), Some(json!("Off")));
    }

    #[tokio::test]
    async fn test_set_at_merges_at_path() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Users", &json!({"1": {"name": "Ana"}})).await.unwrap();
        let stored = store.set_at("Users", "1/stats", &json!({"td": 3})).await.unwrap();
        assert_eq!(stored, json!({"1": {"name": "Ana", "stats": {"td": "3"}}}));
    }

    #[tokio::test]
    async fn test_delete_whole_document() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": "1"})).await.unwrap();

        assert_eq!(store.delete("Users").await.unwrap(), Some(DeleteOutcome::Removed));
        assert_eq!(store.get("Users").await.unwrap(), None);
        assert!(!store.layout().document_file("Users").exists());
    }

    #[tokio::test]
    async fn test_delete_path_keeps_siblings() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store
            .set("Users", &json!({"a": {"b": {"c": "1"}, "keep": "2"}, "other": "3"}))
            .await
            .unwrap();

        let outcome = store.delete_at("Users", "a/b").await.unwrap();
        let expected = json!({"a": {"keep": "2"}, "other": "3"});
        assert_eq!(outcome, Some(DeleteOutcome::Updated(expected.clone())));
        assert_eq!(store.get("Users").await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        assert_eq!(store.delete("Nothing").await.unwrap(), None);
        assert_eq!(store.delete_at("Nothing", "a/b").await.unwrap(), None);

        store.set("Users", &json!({"a": "1"})).await.unwrap();
        let backups_before = store.list_backups("Users").await.unwrap().len();
        assert_eq!(store.delete_at("Users", "x/y").await.unwrap(), None);
        assert_eq!(store.list_backups("Users").await.unwrap().len(), backups_before);
        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"a": "1"})));
    }

    #[tokio::test]
    async fn test_empty_documents_read_as_none() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Empty", &json!({})).await.unwrap();
        assert_eq!(store.get("Empty").await.unwrap(), None);

        store.set("Flag", &false).await.unwrap();
        assert_eq!(store.get("Flag").await.unwrap(), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_key_sanitization() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("A/B", &1).await.unwrap();
        assert_eq!(store.get("A/B").await.unwrap(), Some(json!("1")));
        assert!(store.layout().document_file("A_B").exists());
        assert_eq!(store.list_keys().await.unwrap(), vec!["A_B"]);
    }

    #[tokio::test]
    async fn test_dot_keys_are_listed_and_checked() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set(".Settings", &json!({"a": 1})).await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec![".Settings"]);
        assert_eq!(store.get_all().await.unwrap()[".Settings"], json!({"a": "1"}));
        assert_eq!(store.get_prefix(".Set").await.unwrap().len(), 1);

        std::fs::write(store.layout().document_file(".Settings"), b"garbage").unwrap();
        let report = store.verify_integrity().await;
        assert_eq!(report.checked, 1);
        assert_eq!(report.corrupted, 1);

        assert_eq!(store.clear_all().await.unwrap(), 1);
        assert!(!store.layout().document_file(".Settings").exists());
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        let err = store.set("", &json!({"a": 1})).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation(_)));
        let err = store.restore_from_backup("", "x.json").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation(_)));

        assert!(!store.layout().document_file("").exists());
        assert_eq!(store.get("").await.unwrap(), None);
        assert_eq!(store.delete("").await.unwrap(), None);
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_integrity_sweeps_leftovers() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        fn age(path: &StdPath) {
            std::fs::File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(SystemTime::now() - Duration::from_secs(3600))
                .unwrap();
        }

        let old_tmp = store.layout().database_dir().join(".Users.0001.tmp");
        let fresh_tmp = store.layout().database_dir().join(".Users.0002.tmp");
        std::fs::write(&old_tmp, b"{").unwrap();
        std::fs::write(&fresh_tmp, b"{").unwrap();
        age(&old_tmp);

        let stale_lock = store.layout().lock_file("Users");
        std::fs::write(&stale_lock, b"").unwrap();
        age(&stale_lock);
        std::fs::write(store.layout().lock_file("Teams"), b"").unwrap();

        let report = store.verify_integrity().await;
        assert_eq!(report.checked, 0);
        assert_eq!(report.removed_temp_files, 1);
        assert!(!old_tmp.exists());
        assert!(fresh_tmp.exists());

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Stale lock marker"));
        assert!(report.errors[0].contains("Users.lock"));
        assert!(stale_lock.exists());
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Teams", &json!({"name": "Zoë ⚽"})).await.unwrap();

        let text = std::fs::read_to_string(store.layout().document_file("Teams")).unwrap();
        assert_eq!(text, "{\n  \"name\": \"Zoë ⚽\"\n}");
    }

    #[tokio::test]
    async fn test_serialization_error_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        let mut bad: HashMap<(u8, u8), i32> = HashMap::new();
        bad.insert((1, 2), 3);

        let err = store.set("Bad", &bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(!store.layout().document_file("Bad").exists());
        assert!(!store.layout().lock_file("Bad").exists());
    }

    #[tokio::test]
    async fn test_lock_timeout_fails_write() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir).with_lock_timeout(Duration::from_millis(50));
        let store = DocumentStore::open(config).await.unwrap();
        store.set("Users", &json!({"a": "1"})).await.unwrap();

        std::fs::write(store.layout().lock_file("Users"), "").unwrap();
        let err = store.set("Users", &json!({"b": "2"})).await.unwrap_err();
        assert!(err.is_lock_timeout());

        // other keys are unaffected
        store.set("Teams", &json!({"c": "3"})).await.unwrap();

        std::fs::remove_file(store.layout().lock_file("Users")).unwrap();
        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"a": "1"})));
    }

    #[tokio::test]
    async fn test_lock_released_after_write() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": "1"})).await.unwrap();
        store.delete_at("Users", "a").await.unwrap();
        assert!(!store.layout().lock_file("Users").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_same_key() {
        let dir = tempdir().unwrap();
        let store = Arc::new(open_store(&dir).await);

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .set("Roster", &json!({ format!("player{}", i): { "number": i } }))
                        .await
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let doc = store.get("Roster").await.unwrap().unwrap();
        let map = doc.as_object().unwrap();
        assert_eq!(map.len(), 8);
        for i in 0..8 {
            assert_eq!(map[&format!("player{}", i)], json!({"number": i.to_string()}));
        }
        assert!(!store.layout().lock_file("Roster").exists());
    }

    #[tokio::test]
    async fn test_backup_taken_before_overwrite() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Users", &json!({"a": 1})).await.unwrap();
        assert!(store.list_backups("Users").await.unwrap().is_empty());

        store.set("Users", &json!({"b": 2})).await.unwrap();
        let backups = store.list_backups("Users").await.unwrap();
        assert_eq!(backups.len(), 1);

        let content = std::fs::read_to_string(store.layout().backup_file(&backups[0])).unwrap();
        let previous: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(previous, json!({"a": "1"}));
    }

    #[tokio::test]
    async fn test_backup_retention_after_many_writes() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        for i in 0..15 {
            store.set("Users", &json!({ format!("k{}", i): i })).await.unwrap();
        }
        assert!(store.list_backups("Users").await.unwrap().len() <= 10);
    }

    #[tokio::test]
    async fn test_backup_retention_keeps_most_recent() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": "1"})).await.unwrap();

        let seeded: Vec<String> = (1..=12).map(|day| seed_backup(&store, "Users", day, "{}")).collect();
        store.set("Users", &json!({"b": "2"})).await.unwrap();

        let kept = store.list_backups("Users").await.unwrap();
        assert_eq!(kept.len(), 10);
        assert!(!kept[0].starts_with("Users_2000"));
        assert_eq!(&kept[1..], &seeded[3..].iter().rev().cloned().collect::<Vec<_>>()[..]);
        for pruned in &seeded[..3] {
            assert!(!store.layout().backup_file(pruned).exists());
        }
    }

    #[tokio::test]
    async fn test_corruption_recovery() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Users", &json!({"a": 1})).await.unwrap();
        store.set("Users", &json!({"b": 2})).await.unwrap();
        std::fs::write(store.layout().document_file("Users"), b"{\"a\": \"1\", broken").unwrap();

        let report = store.verify_integrity().await;
        assert_eq!(report.checked, 1);
        assert_eq!(report.corrupted, 1);
        assert_eq!(report.recovered, 1);
        assert!(report.errors.is_empty());

        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"a": "1"})));

        let again = store.verify_integrity().await;
        assert_eq!(again.corrupted, 0);
        assert_eq!(again.recovered, 0);
    }

    #[tokio::test]
    async fn test_read_recovers_corrupted_document() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.set("Users", &json!({"a": 1})).await.unwrap();
        store.set("Users", &json!({"b": 2})).await.unwrap();
        std::fs::write(store.layout().document_file("Users"), b"not json").unwrap();

        assert_eq!(store.get_at("Users", "a").await.unwrap(), Some(json!("1")));
        assert!(store.verify_integrity().await.degraded_reads.is_empty());
    }

    #[tokio::test]
    async fn test_unrecoverable_read_degrades() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        std::fs::write(store.layout().document_file("Broken"), b"{{{").unwrap();

        assert_eq!(store.get("Broken").await.unwrap(), None);

        let report = store.verify_integrity().await;
        assert_eq!(report.corrupted, 1);
        assert_eq!(report.recovered, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.degraded_reads, vec!["Broken"]);
        assert!(!report.is_healthy());

        assert!(store.verify_integrity().await.degraded_reads.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_backup_is_not_promoted() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        std::fs::write(store.layout().document_file("Users"), b"garbage").unwrap();
        seed_backup(&store, "Users", 1, "{\"old\": \"1\"}");
        seed_backup(&store, "Users", 2, "also garbage");

        let report = store.verify_integrity().await;
        assert_eq!(report.corrupted, 1);
        assert_eq!(report.recovered, 0);
        assert_eq!(
            std::fs::read(store.layout().document_file("Users")).unwrap(),
            b"garbage"
        );
    }

    #[tokio::test]
    async fn test_write_over_corrupted_document_recovers_first() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        std::fs::write(store.layout().document_file("Users"), b"garbage").unwrap();
        seed_backup(&store, "Users", 1, "{\"old\": \"1\"}");

        let stored = store.set("Users", &json!({"new": 2})).await.unwrap();
        assert_eq!(stored, json!({"old": "1", "new": "2"}));
    }

    #[tokio::test]
    async fn test_required_backup_policy_aborts_write() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir).with_backup_policy(BackupPolicy::Required);
        let store = DocumentStore::open(config).await.unwrap();
        store.set("Users", &json!({"a": "1"})).await.unwrap();

        std::fs::remove_dir_all(store.layout().backup_dir()).unwrap();
        std::fs::write(store.layout().backup_dir(), b"not a directory").unwrap();

        let err = store.set("Users", &json!({"b": "2"})).await.unwrap_err();
        assert!(matches!(err, StoreError::Backup { .. }));
        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"a": "1"})));
    }

    #[tokio::test]
    async fn test_best_effort_backup_policy_still_writes() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": "1"})).await.unwrap();

        std::fs::remove_dir_all(store.layout().backup_dir()).unwrap();
        std::fs::write(store.layout().backup_dir(), b"not a directory").unwrap();

        store.set("Users", &json!({"b": "2"})).await.unwrap();
        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"a": "1", "b": "2"})));
    }

    #[tokio::test]
    async fn test_list_and_collect_documents() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": "1"})).await.unwrap();
        store.set("Team/Role", &json!({"b": "2"})).await.unwrap();
        store.set("TeamChannel", &json!({"c": "3"})).await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["TeamChannel", "Team_Role", "Users"]);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["Users"], json!({"a": "1"}));

        let teams = store.get_prefix("Team").await.unwrap();
        assert_eq!(teams.len(), 2);
        let roles = store.get_prefix("Team/").await.unwrap();
        assert_eq!(roles.keys().collect::<Vec<_>>(), vec!["Team_Role"]);
    }

    #[tokio::test]
    async fn test_backup_status() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let oldest = seed_backup(&store, "Users", 1, "{}");
        let latest = seed_backup(&store, "Users", 5, "{}");
        seed_backup(&store, "Teams", 3, "{}");

        let status = store.backup_status().await.unwrap();
        assert_eq!(status.len(), 2);
        assert_eq!(status["Users"].count, 2);
        assert_eq!(status["Users"].latest, Some(latest));
        assert_eq!(status["Users"].oldest, Some(oldest));
    }

    #[tokio::test]
    async fn test_restore_from_backup() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"current": "1"})).await.unwrap();
        let name = seed_backup(&store, "Users", 1, "{\"restored\": \"1\"}");
        let bad = seed_backup(&store, "Users", 2, "nope");

        assert!(store.restore_from_backup("Users", &name).await.unwrap());
        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"restored": "1"})));

        assert!(!store.restore_from_backup("Users", &bad).await.unwrap());
        assert!(!store.restore_from_backup("Users", "missing.json").await.unwrap());
        assert!(!store.restore_from_backup("Users", "../Users.json").await.unwrap());
        assert_eq!(store.get("Users").await.unwrap(), Some(json!({"restored": "1"})));
    }

    #[tokio::test]
    async fn test_export_all() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": 1})).await.unwrap();
        store.set("Mode", "On").await.unwrap();

        let target = dir.path().join("export.json");
        let written = store.export_all(Some(&target)).await.unwrap();
        assert_eq!(written, target);

        let exported: Value = serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(exported, json!({"Mode": "On", "Users": {"a": "1"}}));

        let default = store.export_all(None).await.unwrap();
        assert!(default.starts_with(dir.path()));
        assert!(default
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("database_export_"));
        assert_eq!(store.list_keys().await.unwrap(), vec!["Mode", "Users"]);
    }

    #[tokio::test]
    async fn test_export_failure_returns_none() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let target = dir.path().join("no/such/dir/export.json");
        assert_eq!(store.export_all(Some(&target)).await, None);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_backups() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.set("Users", &json!({"a": "1"})).await.unwrap();
        store.set("Users", &json!({"b": "2"})).await.unwrap();
        store.set("Teams", &json!({"c": "3"})).await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert!(store.list_keys().await.unwrap().is_empty());
        assert_eq!(store.list_backups("Users").await.unwrap().len(), 1);
    }
}
