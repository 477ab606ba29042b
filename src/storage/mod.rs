//! Storage layer for hardsnap
//!
//! Provides the filesystem primitives every side effect goes through, and the
//! repository view over snapshot directories.

pub mod filesystem;
pub mod repository;

pub use filesystem::{Access, Filesystem, ShellFilesystem, PRESERVE_FLAGS};
pub use repository::{SnapshotRepository, SortOrder};
