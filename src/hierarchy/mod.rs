//! Department hierarchy reconciliation
//!
//! Turns dash-delimited department paths into a persistent tree with stable
//! identities and hierarchical serials.

pub mod ancestor;
pub mod obsolete;
pub mod projection;
pub mod segment;
pub mod serial;
pub mod upsert;

pub use ancestor::AncestorResolver;
pub use obsolete::ObsolescenceDetector;
pub use projection::sync_projection;
pub use segment::DepartmentPath;
pub use serial::SerialAllocator;
pub use upsert::{DepartmentUpserter, Outcome};
