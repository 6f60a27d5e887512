pub mod config;
pub mod errors;
pub mod key;
pub mod path;
pub mod shape;
pub mod value;


pub use config::{BackupPolicy, StoreConfig};
pub use errors::{Result, StoreError};
pub use key::DocumentKey;
pub use path::DocPath;
pub use shape::{DocumentShape, Toggle};
