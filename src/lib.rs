//! hardsnap - hardlink-deduplicated snapshot backups
//!
//! Each backup is a full directory tree named after its creation time. rsync
//! fills it, hardlinking every file that did not change since the previous
//! snapshot, so a snapshot costs only the space of what changed. A retention
//! engine thins out old snapshots by hourly, daily, weekly, monthly and yearly
//! rules. Every location may be local or `host:/path` over ssh.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Snapshots, interval rules and locations
//! - `exec`: Local and remote shell command execution
//! - `storage`: Filesystem primitives and the snapshot repository
//! - `retention`: Snapshot retention engine
//! - `backup`: rsync synchronizer, backup transactions and jobs
//! - `display`: Terminal output formatting
//! - `cli`: Command handlers for the `hardsnap` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use hardsnap::config::{paths::HardsnapPaths, settings::Settings};
//!
//! let paths = HardsnapPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod exec;
pub mod models;
pub mod retention;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{HardsnapError, HardsnapResult};
