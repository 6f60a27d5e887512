//! On-disk layout
//!
//! ```text
//! <base>/database/<key>.json
//! <base>/database/backups/<key>_<YYYYMMDD_HHMMSS>.json
//! <base>/database/locks/<key>.lock
//! ```

use std::path::{Path as StdPath, PathBuf};

use chrono::{DateTime, Local};

use crate::core::errors::{Result, StoreError};

pub const DATABASE_DIR: &str = "database";
pub const BACKUP_DIR: &str = "backups";
pub const LOCK_DIR: &str = "locks";

const DOCUMENT_EXT: &str = "json";
const LOCK_EXT: &str = "lock";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Resolves file locations for documents, backups and locks
#[derive(Debug, Clone)]
pub struct Layout {
    database_dir: PathBuf,
    backup_dir: PathBuf,
    lock_dir: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<StdPath>>(base_dir: P) -> Self {
        let database_dir = base_dir.as_ref().join(DATABASE_DIR);
        Layout {
            backup_dir: database_dir.join(BACKUP_DIR),
            lock_dir: database_dir.join(LOCK_DIR),
            database_dir,
        }
    }

    /// Create every directory of the layout (idempotent)
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.database_dir, &self.backup_dir, &self.lock_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
        }
        Ok(())
    }

    pub fn database_dir(&self) -> &StdPath {
        &self.database_dir
    }

    pub fn backup_dir(&self) -> &StdPath {
        &self.backup_dir
    }

    pub fn lock_dir(&self) -> &StdPath {
        &self.lock_dir
    }

    /// Live file of a document, by sanitized key
    pub fn document_file(&self, stem: &str) -> PathBuf {
        self.database_dir.join(format!("{}.{}", stem, DOCUMENT_EXT))
    }

    /// Lock marker of a document, by sanitized key
    pub fn lock_file(&self, stem: &str) -> PathBuf {
        self.lock_dir.join(format!("{}.{}", stem, LOCK_EXT))
    }

    /// Fresh temp file next to the live documents. The name does not end in
    /// `.json`, so it is never listed as a document.
    pub fn temp_file(&self, stem: &str) -> PathBuf {
        self.database_dir
            .join(format!(".{}.{}.tmp", stem, uuid::Uuid::new_v4().simple()))
    }

    pub fn backup_file(&self, name: &str) -> PathBuf {
        self.backup_dir.join(name)
    }
}

/// Document stem of a `<stem>.json` file name
pub fn document_stem(file_name: &str) -> Option<&str> {
    match file_name.strip_suffix(".json")? {
        "" => None,
        stem => Some(stem),
    }
}

/// True for the `.<stem>.<id>.tmp` files written before a rename
pub fn is_temp_file(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.ends_with(".tmp")
}

/// Backup file name for `stem` taken at `at`
pub fn backup_name(stem: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.{}", stem, at.format(TIMESTAMP_FORMAT), DOCUMENT_EXT)
}

/// A backup file name split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupName {
    pub stem: String,
    /// `YYYYMMDD_HHMMSS`, sorts chronologically as a string
    pub timestamp: String,
    pub file_name: String,
}

impl BackupName {
    /// Parse `<stem>_<YYYYMMDD>_<HHMMSS>.json`. The stem itself may contain `_`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let base = file_name.strip_suffix(".json")?;
        let (rest, time) = base.rsplit_once('_')?;
        let (stem, date) = rest.rsplit_once('_')?;

        if stem.is_empty() || !is_digits(date, 8) || !is_digits(time, 6) {
            return None;
        }

        Some(BackupName {
            stem: stem.to_string(),
            timestamp: format!("{}_{}", date, time),
            file_name: file_name.to_string(),
        })
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}
