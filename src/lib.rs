//! Hrsync - HR organization snapshot importer
//!
//! This crate ingests flat employee snapshots and reconciles them into a
//! department tree with stable hierarchical serials, plus an account and
//! profile directory.

pub mod config;
pub mod db;
pub mod employee;
pub mod entity;
pub mod error;
pub mod event_log;
pub mod hierarchy;
pub mod raw;
pub mod source;
pub mod task;

// Re-export commonly used types
pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use task::{BatchSummary, ImportJob, LocalDirSource};
