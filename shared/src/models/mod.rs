//! Data models
//!
//! Input rows supplied by the persistence layer. All rows are read-only to
//! the reporting core.

pub mod job;
pub mod technician;

// Re-exports
pub use job::*;
pub use technician::*;
