//! Incremental snapshot backups
//!
//! Every snapshot is a complete directory tree named after its creation time
//! (`YYYY-MM-DD_HH-MM-SS`). Files unchanged since the previous snapshot are
//! hardlinks into it, so each snapshot only costs the space of what changed.
//!
//! # Architecture
//!
//! - `rsync`: builds and runs rsync invocations (`Synchronizer`)
//! - `transaction`: writes one snapshot atomically (`Orchestrator`)
//! - `job`: a full backup cycle including retention (`BackupJob`)
//!
//! # Example
//!
//! ```rust,ignore
//! use hardsnap::backup::{BackupJob, JobConfig, RsyncSynchronizer};
//! use hardsnap::models::Location;
//! use hardsnap::storage::ShellFilesystem;
//!
//! let fs: ShellFilesystem = ShellFilesystem::default();
//! let sync: RsyncSynchronizer = RsyncSynchronizer::default();
//! let config = JobConfig::new(Location::parse("/home/me"), Location::parse("nas:/backups"));
//! let outcome = BackupJob::new(&fs, &sync).run(&config)?;
//! ```

pub mod job;
pub mod rsync;
pub mod transaction;

pub use job::{BackupJob, JobConfig, JobOutcome};
pub use rsync::{changed_from_stats, RsyncSynchronizer, SyncInvocation, SyncOptions, SyncSource, Synchronizer};
pub use transaction::{BackupRequest, Orchestrator};
