//! Core data models for hardsnap
//!
//! This module contains the data structures of the snapshot domain:
//! snapshots, retention interval rules, and local/remote locations.

pub mod interval;
pub mod location;
pub mod snapshot;

pub use interval::{IntervalKind, IntervalRule};
pub use location::Location;
pub use snapshot::{Snapshot, SNAPSHOT_NAME_FORMAT};
