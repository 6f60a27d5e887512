pub mod get;
pub mod set;
pub mod delete;
pub mod keys;
pub mod health;
pub mod backups;
pub mod export;
pub mod restore;
pub mod clear;
