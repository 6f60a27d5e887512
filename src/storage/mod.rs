pub mod backup;
pub mod document_store;
pub mod layout;
pub mod lock;
pub mod report;

pub use document_store::DocumentStore;
pub use report::{BackupInfo, DeleteOutcome, IntegrityReport};
