//! Backup job
//!
//! One complete backup cycle against a snapshot storage: validate the
//! locations, find the previous snapshot, optionally skip when nothing
//! changed, write the new snapshot, refresh the move record and thin out old
//! snapshots.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::error::{HardsnapError, HardsnapResult};
use crate::models::{IntervalRule, Location, Snapshot};
use crate::retention::RetentionEngine;
use crate::storage::{Access, Filesystem, SnapshotRepository, SortOrder};

use super::rsync::Synchronizer;
use super::transaction::{BackupRequest, Orchestrator};

/// What a backup job should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub source: Location,
    pub storage: Location,
    /// Enables move detection; lives on the source host
    pub move_record: Option<Location>,
    /// Skip the backup when the source equals the previous snapshot
    pub only_if_changed: bool,
    /// Only report whether the source changed
    pub dry_run: bool,
    pub extra_args: String,
    pub verbose: bool,
    /// Retention rules applied after the backup; empty disables cleaning
    pub retention: Vec<IntervalRule>,
}

impl JobConfig {
    pub fn new(source: Location, storage: Location) -> Self {
        Self {
            source,
            storage,
            move_record: None,
            only_if_changed: false,
            dry_run: false,
            extra_args: String::new(),
            verbose: false,
            retention: Vec::new(),
        }
    }
}

/// Result of a backup job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A new snapshot was written; `cleaned` holds the retention decision
    Created {
        snapshot: Snapshot,
        cleaned: Option<Vec<Snapshot>>,
    },
    /// The source did not change since `previous`
    Skipped { previous: Snapshot },
    /// Dry run result
    DryRun { changed: bool },
}

/// Runs backup jobs with one filesystem and synchronizer
pub struct BackupJob<'a, R = StdRng> {
    fs: &'a dyn Filesystem,
    orchestrator: Orchestrator<'a, R>,
}

impl<'a> BackupJob<'a, StdRng> {
    pub fn new(fs: &'a dyn Filesystem, sync: &'a dyn Synchronizer) -> Self {
        Self::with_rng(fs, sync, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> BackupJob<'a, R> {
    pub fn with_rng(fs: &'a dyn Filesystem, sync: &'a dyn Synchronizer, rng: R) -> Self {
        Self {
            fs,
            orchestrator: Orchestrator::with_rng(fs, sync, rng),
        }
    }

    /// Run the job, naming the new snapshot after the current local time
    pub fn run(&mut self, config: &JobConfig) -> HardsnapResult<JobOutcome> {
        self.run_at(config, Snapshot::now())
    }

    /// Run the job, writing the new snapshot as `snapshot`
    pub fn run_at(&mut self, config: &JobConfig, snapshot: Snapshot) -> HardsnapResult<JobOutcome> {
        let source = config.source.trimmed();
        let storage = config.storage.trimmed();
        self.validate(&source, &storage, config.move_record.as_ref())?;

        let repository = SnapshotRepository::new(self.fs, storage.clone());
        let previous = repository.latest()?;
        let previous_location = previous.as_ref().map(|p| repository.location_of(p));
        let destination = repository.location_of(&snapshot);

        let move_record = match &config.move_record {
            Some(record) if self.fs.check_dir(record, Access::Read)? => Some(record.trimmed()),
            Some(record) => {
                info!(move_record = %record, "move record not found, it will be created");
                None
            }
            None => None,
        };

        let request = BackupRequest::new(source.clone(), destination.clone())
            .previous(previous_location)
            .move_record(move_record)
            .extra_args(config.extra_args.clone())
            .verbose(config.verbose);

        if config.dry_run {
            let changed = self.orchestrator.run(&request.simulate(true))?.unwrap_or(true);
            return Ok(JobOutcome::DryRun { changed });
        }

        if config.only_if_changed {
            if let Some(previous) = previous {
                let change_check = request.clone().simulate(true);
                if self.orchestrator.run(&change_check)? == Some(false) {
                    info!(previous = %previous, "source unchanged, skipping backup");
                    return Ok(JobOutcome::Skipped { previous });
                }
            }
        }

        info!(source = %source, destination = %destination, "creating snapshot");
        self.orchestrator.run(&request)?;

        if let Some(record) = &config.move_record {
            info!(move_record = %record, "refreshing move record");
            self.fs.hardlink_clone(&source, &record.trimmed())?;
        }

        let cleaned = if config.retention.is_empty() {
            None
        } else {
            let snapshots = repository.list(SortOrder::Descending)?;
            let engine = RetentionEngine::new(self.fs);
            Some(engine.evaluate(&storage, snapshots, &config.retention, false)?)
        };

        Ok(JobOutcome::Created { snapshot, cleaned })
    }

    fn validate(
        &self,
        source: &Location,
        storage: &Location,
        move_record: Option<&Location>,
    ) -> HardsnapResult<()> {
        if !self.fs.check_dir(source, Access::Read)? {
            return Err(HardsnapError::Precondition(format!(
                "Source '{}' is not a readable directory",
                source
            )));
        }
        if !self.fs.check_dir(storage, Access::Write)? {
            return Err(HardsnapError::Precondition(format!(
                "Storage '{}' is not a writable directory",
                storage
            )));
        }
        if storage.same_as(source) || storage.is_inside(source) {
            return Err(HardsnapError::Precondition(format!(
                "Storage '{}' must not be inside source '{}'",
                storage, source
            )));
        }

        if let Some(record) = move_record {
            if record.host() != source.host() {
                return Err(HardsnapError::Precondition(format!(
                    "Move record '{}' must be on the same host as source '{}'",
                    record, source
                )));
            }
            if record.same_as(source) || record.is_inside(source) {
                return Err(HardsnapError::Precondition(format!(
                    "Move record '{}' must not be inside source '{}'",
                    record, source
                )));
            }
            if record.is_inside(storage) {
                warn!(move_record = %record, "move record is inside the storage directory");
            }
        }

        Ok(())
    }
}
