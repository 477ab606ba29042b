//! Backup CLI command

use clap::Args;

use crate::backup::{BackupJob, JobConfig, JobOutcome, RsyncSynchronizer};
use crate::config::Settings;
use crate::display::{format_retention_summary, format_snapshot_list};
use crate::error::HardsnapResult;
use crate::models::Location;

use super::{retention_rules, ConnectionArgs};

/// Arguments of `hardsnap backup`
#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    /// Directory to back up, `[host:]path`
    pub source: Location,

    /// Directory holding the snapshots, `[host:]path`
    pub storage: Location,

    /// Move record on the source host, enables move detection
    #[arg(long, value_name = "PATH")]
    pub move_record: Option<Location>,

    /// Only report whether the source changed since the latest snapshot
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the backup when the source did not change
    #[arg(long)]
    pub only_if_changed: bool,

    /// Additional rsync arguments
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub rsync_args: Option<String>,

    /// Remove old snapshots by these rules after the backup, e.g. `day=7,week=4`
    ///
    /// Without this flag, old snapshots are removed only when retention rules
    /// are configured in the settings file.
    #[arg(long, value_name = "RULES")]
    pub keep: Option<String>,

    /// Do not remove old snapshots, even with configured rules
    #[arg(long)]
    pub no_clean: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl BackupArgs {
    /// Merge the flags with the configured defaults
    pub fn job_config(&self, settings: &Settings, verbose: bool) -> HardsnapResult<JobConfig> {
        let retention = if self.no_clean {
            Vec::new()
        } else {
            retention_rules(self.keep.as_deref(), settings)?.unwrap_or_default()
        };

        Ok(JobConfig {
            source: self.source.clone(),
            storage: self.storage.clone(),
            move_record: self.move_record.clone().or_else(|| settings.move_record.clone()),
            only_if_changed: self.only_if_changed || settings.only_if_changed,
            dry_run: self.dry_run,
            extra_args: self
                .rsync_args
                .clone()
                .unwrap_or_else(|| settings.rsync_args.clone()),
            verbose,
            retention,
        })
    }
}

/// Handle `hardsnap backup`
pub fn handle_backup_command(settings: &Settings, args: BackupArgs, verbose: bool) -> HardsnapResult<()> {
    let config = args.job_config(settings, verbose)?;
    let executor = args.connection.executor(settings);
    let fs = args.connection.filesystem(settings);
    let sync = RsyncSynchronizer::new(executor);

    match BackupJob::new(&fs, &sync).run(&config)? {
        JobOutcome::Created { snapshot, cleaned } => {
            println!("Snapshot created: {}", config.storage.trimmed().join(&snapshot.name()));
            if let Some(cleaned) = cleaned {
                println!();
                println!("{}", format_snapshot_list(&cleaned, true));
                println!("{}", format_retention_summary(&cleaned, false));
            }
        }
        JobOutcome::Skipped { previous } => {
            println!("No changes since {}, backup skipped.", previous);
        }
        JobOutcome::DryRun { changed } => {
            if changed {
                println!("Source changed since the latest snapshot.");
            } else {
                println!("Source unchanged since the latest snapshot.");
            }
        }
    }

    Ok(())
}
