//! Result types returned by maintenance operations

use serde::Serialize;
use serde_json::Value;

/// Outcome of `verify_integrity`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Documents inspected
    pub checked: usize,
    /// Documents whose bytes did not parse
    pub corrupted: usize,
    /// Corrupted documents restored from their latest backup
    pub recovered: usize,
    pub errors: Vec<String>,
    /// Keys whose reads fell back to "empty" since the previous report
    pub degraded_reads: Vec<String>,
    /// Temp files of interrupted writes that were deleted
    pub removed_temp_files: usize,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Backups held for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub count: usize,
    pub latest: Option<String>,
    pub oldest: Option<String>,
}

/// What a successful `delete` did
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The whole document was removed
    Removed,
    /// A nested value was removed; holds the document as now stored
    Updated(Value),
}
