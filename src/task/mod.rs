//! Import scheduling
//!
//! Discovers snapshot files and runs one import batch per file

mod import;

pub use import::{BatchSummary, FileSource, ImportJob, LocalDirSource, Tally};
