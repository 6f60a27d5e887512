//! Store configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::errors::{Result, StoreError};

pub const DEFAULT_MAX_BACKUPS: usize = 10;
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

const ENV_DIR: &str = "LEAGUESTORE_DIR";
const ENV_MAX_BACKUPS: &str = "LEAGUESTORE_MAX_BACKUPS";
const ENV_LOCK_TIMEOUT_MS: &str = "LEAGUESTORE_LOCK_TIMEOUT_MS";
const ENV_BACKUP_POLICY: &str = "LEAGUESTORE_BACKUP_POLICY";

/// What to do when the pre-write backup cannot be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Log the failure and write anyway
    #[default]
    BestEffort,
    /// Abort the write
    Required,
}

impl FromStr for BackupPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(BackupPolicy::BestEffort),
            "required" | "strict" => Ok(BackupPolicy::Required),
            other => Err(StoreError::Config(format!("unknown backup policy: {}", other))),
        }
    }
}

/// Configuration of a `DocumentStore`
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory that contains `database/`
    pub base_dir: PathBuf,
    /// How long a writer waits for a key's lock
    pub lock_timeout: Duration,
    /// Sleep between lock attempts
    pub lock_poll_interval: Duration,
    /// Backups kept per key
    pub max_backups: usize,
    pub backup_policy: BackupPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            base_dir: PathBuf::from("."),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
            max_backups: DEFAULT_MAX_BACKUPS,
            backup_policy: BackupPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `base_dir`
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        StoreConfig {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `LEAGUESTORE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = StoreConfig::default();

        if let Some(dir) = read_env(ENV_DIR) {
            config.base_dir = PathBuf::from(dir);
        }
        if let Some(raw) = read_env(ENV_MAX_BACKUPS) {
            let max = raw
                .parse::<usize>()
                .map_err(|e| StoreError::Config(format!("{}={}: {}", ENV_MAX_BACKUPS, raw, e)))?;
            config = config.with_max_backups(max);
        }
        if let Some(raw) = read_env(ENV_LOCK_TIMEOUT_MS) {
            let ms = raw
                .parse::<u64>()
                .map_err(|e| StoreError::Config(format!("{}={}: {}", ENV_LOCK_TIMEOUT_MS, raw, e)))?;
            config.lock_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = read_env(ENV_BACKUP_POLICY) {
            config.backup_policy = raw.parse()?;
        }

        Ok(config)
    }

    pub fn with_base_dir<P: Into<PathBuf>>(mut self, base_dir: P) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_lock_poll_interval(mut self, interval: Duration) -> Self {
        self.lock_poll_interval = interval;
        self
    }

    /// At least one backup is always kept
    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups.max(1);
        self
    }

    pub fn with_backup_policy(mut self, policy: BackupPolicy) -> Self {
        self.backup_policy = policy;
        self
    }
}

fn read_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.base_dir, PathBuf::from("."));
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.max_backups, 10);
        assert_eq!(config.backup_policy, BackupPolicy::BestEffort);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new("/tmp/league")
            .with_max_backups(0)
            .with_lock_timeout(Duration::from_millis(250))
            .with_backup_policy(BackupPolicy::Required);
        assert_eq!(config.base_dir, PathBuf::from("/tmp/league"));
        assert_eq!(config.max_backups, 1);
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.backup_policy, BackupPolicy::Required);
    }

    #[test]
    fn test_backup_policy_parsing() {
        assert_eq!("best-effort".parse::<BackupPolicy>().unwrap(), BackupPolicy::BestEffort);
        assert_eq!("Required".parse::<BackupPolicy>().unwrap(), BackupPolicy::Required);
        assert!("sometimes".parse::<BackupPolicy>().is_err());
    }
}
