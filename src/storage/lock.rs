//! Per-key write locks
//!
//! A lock is an empty marker file created with exclusive-create semantics.
//! Whoever creates `<key>.lock` owns the key until the file is removed.

use std::io;
use std::path::{Path as StdPath, PathBuf};
use std::time::Duration;

use log::{debug, error, warn};
use tokio::time::{sleep, Instant};

use crate::core::errors::{Result, StoreError};

/// Exclusive write access to one document
///
/// Dropping the guard removes the marker, so the lock is released on every
/// exit path, including early returns and panics.
#[derive(Debug)]
pub struct KeyLock {
    key: String,
    path: PathBuf,
    released: bool,
}

impl KeyLock {
    /// Try to create `path` until it succeeds or `timeout` elapses
    pub async fn acquire(
        key: &str,
        path: PathBuf,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let started = Instant::now();

        loop {
            match try_create(&path).await {
                Ok(()) => {
                    debug!("Lock acquired for key: {}", key);
                    return Ok(KeyLock {
                        key: key.to_string(),
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        warn!("Lock timeout for key: {}", key);
                        return Err(StoreError::LockTimeout {
                            key: key.to_string(),
                            waited,
                        });
                    }
                    sleep(poll_interval).await;
                }
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &StdPath {
        &self.path
    }

    /// Remove the marker now instead of on drop
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Lock released for key: {}", self.key),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!("Error releasing lock for {}: {}", self.key, e),
        }
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    error!("Error releasing lock for {}: {}", self.key, e);
                }
            }
        }
    }
}

async fn try_create(path: &StdPath) -> io::Result<()> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map(|_| ())
}
