//! leaguestore: the JSON document store behind the league bot
//!
//! Each document is a named JSON value kept in its own file under
//! `database/`. Nested values are addressed with slash-separated paths,
//! writes are serialized per key with lock markers and preceded by a
//! timestamped backup, and corrupted files are restored from the newest
//! backup.
//!
//! ```no_run
//! use leaguestore::{DocumentStore, StoreConfig};
//! use serde_json::json;
//!
//! # async fn demo() -> leaguestore::Result<()> {
//! let store = DocumentStore::open(StoreConfig::new("/srv/bot")).await?;
//! store.set("Users", &json!({"1234": {"team": "Hawks"}})).await?;
//! let team = store.get_at("Users", "1234/team").await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod storage;

pub use crate::core::config::{BackupPolicy, StoreConfig};
pub use crate::core::errors::{Result, StoreError};
pub use crate::core::key::DocumentKey;
pub use crate::core::path::DocPath;
pub use crate::core::shape::{DocumentShape, Toggle};
pub use storage::{BackupInfo, DeleteOutcome, DocumentStore, IntegrityReport};
