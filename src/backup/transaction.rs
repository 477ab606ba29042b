//! Backup transaction orchestrator
//!
//! Performs one backup as an all-or-nothing operation. The synchronizer always
//! writes into a temporary destination (`<destination>.tmp`), which is moved to
//! the final destination only after a successful run. Every temporary path is
//! removed on every exit path.
//!
//! # Protocols
//!
//! Without a move record the source is synchronized straight into the
//! temporary destination, which is then renamed.
//!
//! With a move record and a previous snapshot, the source is first hardlink
//! cloned under a random name `NNNNNNNN.tmp` next to it. rsync then receives
//! two sources at once: the contents of the move record (which mirrors the
//! previous snapshot and shares inodes with the source) and the cloned source
//! directory. Because hardlinks are preserved, files that were only renamed or
//! moved since the previous backup are linked to their existing copies rather
//! than transferred again. The result is the subtree `<tmp>/NNNNNNNN.tmp`,
//! which becomes the final destination.
//!
//! Concurrent runs against the same destination are not supported: they race
//! on the temporary destination path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::{HardsnapError, HardsnapResult};
use crate::models::Location;
use crate::storage::Filesystem;

use super::rsync::{changed_from_stats, SyncInvocation, SyncOptions, SyncSource, Synchronizer};

/// Attempts at finding an unused temporary source name
pub const MAX_NAME_ATTEMPTS: usize = 100;

const TEMP_SUFFIX: &str = ".tmp";

/// Parameters of one backup run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    pub source: Location,
    pub destination: Location,
    /// Snapshot to hardlink unchanged files against
    pub previous: Option<Location>,
    /// Mirror of the previous source tree, enables move detection
    pub move_record: Option<Location>,
    /// Dry run: report whether anything changed, write nothing
    pub simulate: bool,
    /// Extra rsync arguments
    pub extra_args: String,
    /// Keep rsync output visible
    pub verbose: bool,
}

impl BackupRequest {
    pub fn new(source: Location, destination: Location) -> Self {
        Self {
            source,
            destination,
            previous: None,
            move_record: None,
            simulate: false,
            extra_args: String::new(),
            verbose: false,
        }
    }

    pub fn previous(mut self, previous: Option<Location>) -> Self {
        self.previous = previous;
        self
    }

    pub fn move_record(mut self, move_record: Option<Location>) -> Self {
        self.move_record = move_record;
        self
    }

    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn extra_args(mut self, extra_args: impl Into<String>) -> Self {
        self.extra_args = extra_args.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// A temporary directory owned by one backup run
///
/// Dropping an armed guard removes the directory on a best-effort basis.
struct ScratchDir<'a> {
    fs: &'a dyn Filesystem,
    location: Location,
    armed: bool,
}

impl<'a> ScratchDir<'a> {
    fn new(fs: &'a dyn Filesystem, location: Location) -> Self {
        Self {
            fs,
            location,
            armed: true,
        }
    }

    fn location(&self) -> &Location {
        &self.location
    }

    /// Remove the directory, reporting failure
    fn release(mut self) -> HardsnapResult<()> {
        self.armed = false;
        self.fs.remove_dir(&self.location)
    }

    /// The directory was moved away; nothing left to clean up
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ScratchDir<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(path = %self.location, "cleaning up temporary directory");
        if let Err(e) = self.fs.remove_dir(&self.location) {
            warn!(path = %self.location, error = %e, "failed to remove temporary directory");
        }
    }
}

/// Runs backup transactions against a filesystem and a synchronizer
pub struct Orchestrator<'a, R = StdRng> {
    fs: &'a dyn Filesystem,
    sync: &'a dyn Synchronizer,
    rng: R,
}

impl<'a> Orchestrator<'a, StdRng> {
    pub fn new(fs: &'a dyn Filesystem, sync: &'a dyn Synchronizer) -> Self {
        Self::with_rng(fs, sync, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> Orchestrator<'a, R> {
    /// Orchestrator drawing temporary names from `rng`
    pub fn with_rng(fs: &'a dyn Filesystem, sync: &'a dyn Synchronizer, rng: R) -> Self {
        Self { fs, sync, rng }
    }

    /// Run one backup
    ///
    /// Returns `Some(changed)` for simulated runs and `None` otherwise. On
    /// failure the destination is left untouched and all temporary
    /// directories are removed before the error is returned.
    pub fn run(&mut self, request: &BackupRequest) -> HardsnapResult<Option<bool>> {
        let source = request.source.trimmed();
        let destination = request.destination.trimmed();
        let previous = request.previous.as_ref().map(Location::trimmed);
        // a dry run must report the true change counts, which move detection would hide
        let move_record = if request.simulate {
            None
        } else {
            request.move_record.as_ref().map(Location::trimmed)
        };

        if !request.simulate && self.fs.exists(&destination)? {
            return Err(HardsnapError::Precondition(format!(
                "Destination '{}' already exists",
                destination
            )));
        }

        let options = SyncOptions {
            dry_run: request.simulate,
            quiet: !request.simulate && !request.verbose,
            extra_args: request.extra_args.clone(),
        };

        let temp_destination = ScratchDir::new(self.fs, destination.with_suffix(TEMP_SUFFIX));
        if let Some(previous) = &previous {
            info!(from = %previous, to = %temp_destination.location(), "hardlinking previous snapshot");
            self.fs.hardlink_clone(previous, temp_destination.location())?;
        }

        let output = match (&move_record, &previous) {
            (Some(record), Some(_)) => {
                self.run_with_move_record(&source, &destination, record, temp_destination, options)?
            }
            _ => {
                if move_record.is_some() {
                    debug!("no previous snapshot, move record not used");
                }
                self.run_direct(&source, &destination, temp_destination, options)?
            }
        };

        if request.simulate {
            let changed = changed_from_stats(&output)?;
            info!(changed, "dry run finished");
            Ok(Some(changed))
        } else {
            info!(destination = %destination, "backup finished");
            Ok(None)
        }
    }

    fn run_direct(
        &mut self,
        source: &Location,
        destination: &Location,
        temp_destination: ScratchDir<'_>,
        options: SyncOptions,
    ) -> HardsnapResult<Vec<String>> {
        let dry_run = options.dry_run;
        let invocation = SyncInvocation {
            sources: vec![SyncSource::contents(source.clone())],
            destination: temp_destination.location().clone(),
            options,
        };
        let output = self.sync.synchronize(&invocation)?;

        if dry_run {
            temp_destination.release()?;
        } else {
            self.fs.move_dir(temp_destination.location(), destination)?;
            temp_destination.disarm();
        }
        Ok(output)
    }

    fn run_with_move_record(
        &mut self,
        source: &Location,
        destination: &Location,
        move_record: &Location,
        temp_destination: ScratchDir<'_>,
        options: SyncOptions,
    ) -> HardsnapResult<Vec<String>> {
        let name = self.temp_source_name(move_record, source)?;
        let temp_source = ScratchDir::new(self.fs, source.parent().join(&name));
        info!(from = %source, to = %temp_source.location(), "hardlinking source");
        self.fs.hardlink_clone(source, temp_source.location())?;

        let invocation = SyncInvocation {
            sources: vec![
                SyncSource::contents(move_record.clone()),
                SyncSource::directory(temp_source.location().clone()),
            ],
            destination: temp_destination.location().clone(),
            options,
        };
        let output = self.sync.synchronize(&invocation)?;

        self.fs
            .move_dir(&temp_destination.location().join(&name), destination)?;

        temp_destination.release()?;
        temp_source.release()?;
        Ok(output)
    }

    /// Random `NNNNNNNN.tmp` name unused in both the move record and the
    /// source's parent directory
    fn temp_source_name(
        &mut self,
        move_record: &Location,
        source: &Location,
    ) -> HardsnapResult<String> {
        let parent = source.parent();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let token: u32 = self.rng.gen_range(10_000_000..=99_999_999);
            let name = format!("{}{}", token, TEMP_SUFFIX);
            if !self.fs.exists(&move_record.join(&name))? && !self.fs.exists(&parent.join(&name))? {
                return Ok(name);
            }
            debug!(name = %name, "temporary source name taken");
        }
        Err(HardsnapError::Exhausted(format!(
            "No free temporary source name after {} attempts",
            MAX_NAME_ATTEMPTS
        )))
    }
}
