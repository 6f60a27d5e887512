//! Pre-write backups
//!
//! Before a document is overwritten its current file is copied to
//! `backups/<key>_<timestamp>.json`, and only the newest `max_backups`
//! copies of that key are kept.

use std::collections::BTreeMap;
use std::io;
use std::path::Path as StdPath;

use chrono::Local;
use log::{error, info};

use super::layout::{backup_name, BackupName, Layout};
use super::report::BackupInfo;

/// Backup directory manager
#[derive(Debug, Clone)]
pub struct Backups {
    layout: Layout,
    max_backups: usize,
}

impl Backups {
    pub fn new(layout: Layout, max_backups: usize) -> Self {
        Backups {
            layout,
            max_backups: max_backups.max(1),
        }
    }

    /// Copy `source` into the backup directory and prune old copies.
    ///
    /// Returns the backup file name, or `None` when `source` does not exist.
    pub async fn create(&self, stem: &str, source: &StdPath) -> io::Result<Option<String>> {
        if !tokio::fs::try_exists(source).await? {
            return Ok(None);
        }

        let name = backup_name(stem, Local::now());
        let target = self.layout.backup_file(&name);
        tokio::fs::copy(source, &target).await?;
        info!("Backup created: {}", target.display());

        self.prune(stem).await;
        Ok(Some(name))
    }

    /// All backups of `stem`, newest first
    pub async fn list(&self, stem: &str) -> io::Result<Vec<BackupName>> {
        let mut backups: Vec<BackupName> = self
            .scan()
            .await?
            .into_iter()
            .filter(|b| b.stem == stem)
            .collect();
        sort_newest_first(&mut backups);
        Ok(backups)
    }

    /// Most recent backup of `stem`
    pub async fn latest(&self, stem: &str) -> io::Result<Option<BackupName>> {
        Ok(self.list(stem).await?.into_iter().next())
    }

    /// Delete everything past the newest `max_backups` copies of `stem`.
    /// Failures are logged; pruning never fails a write.
    pub async fn prune(&self, stem: &str) {
        let backups = match self.list(stem).await {
            Ok(backups) => backups,
            Err(e) => {
                error!("Error cleaning up backups: {}", e);
                return;
            }
        };

        for old in backups.iter().skip(self.max_backups) {
            let path = self.layout.backup_file(&old.file_name);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                error!("Error removing old backup {}: {}", path.display(), e);
            }
        }
    }

    /// Count, newest and oldest backup per key
    pub async fn status(&self) -> io::Result<BTreeMap<String, BackupInfo>> {
        let mut grouped: BTreeMap<String, Vec<BackupName>> = BTreeMap::new();
        for backup in self.scan().await? {
            grouped.entry(backup.stem.clone()).or_default().push(backup);
        }

        Ok(grouped
            .into_iter()
            .map(|(stem, mut backups)| {
                sort_newest_first(&mut backups);
                let info = BackupInfo {
                    count: backups.len(),
                    latest: backups.first().map(|b| b.file_name.clone()),
                    oldest: backups.last().map(|b| b.file_name.clone()),
                };
                (stem, info)
            })
            .collect())
    }

    async fn scan(&self) -> io::Result<Vec<BackupName>> {
        let mut entries = match tokio::fs::read_dir(self.layout.backup_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(parsed) = entry.file_name().to_str().and_then(BackupName::parse) {
                backups.push(parsed);
            }
        }
        Ok(backups)
    }
}

fn sort_newest_first(backups: &mut [BackupName]) {
    backups.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.file_name.cmp(&a.file_name))
    });
}
