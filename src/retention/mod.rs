//! Snapshot retention
//!
//! Grandfather-father-son thinning of a snapshot storage.

pub mod engine;

pub use engine::{mark_snapshots, RetentionEngine};
