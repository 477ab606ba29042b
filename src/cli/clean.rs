//! Clean CLI command
//!
//! Applies retention rules to an existing storage without taking a backup.

use clap::Args;

use crate::config::settings::default_retention;
use crate::config::Settings;
use crate::display::{format_retention_summary, format_snapshot_list};
use crate::error::HardsnapResult;
use crate::models::{IntervalRule, Location};
use crate::retention::RetentionEngine;
use crate::storage::{SnapshotRepository, SortOrder};

use super::{retention_rules, ConnectionArgs};

/// Arguments of `hardsnap clean`
#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Directory holding the snapshots, `[host:]path`
    pub storage: Location,

    /// Retention rules, e.g. `day=7,week=4,month=12`
    ///
    /// Defaults to the configured rules, else hour=24,day=7,week=4,month=12,year=10.
    #[arg(long, value_name = "RULES")]
    pub keep: Option<String>,

    /// Show what would be removed without removing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl CleanArgs {
    /// Rules to apply; falls back to the built-in set when none are chosen
    pub fn rules(&self, settings: &Settings) -> HardsnapResult<Vec<IntervalRule>> {
        Ok(retention_rules(self.keep.as_deref(), settings)?.unwrap_or_else(default_retention))
    }
}

/// Handle `hardsnap clean`
pub fn handle_clean_command(settings: &Settings, args: CleanArgs) -> HardsnapResult<()> {
    let rules = args.rules(settings)?;
    let fs = args.connection.filesystem(settings);
    let repository = SnapshotRepository::new(&fs, args.storage.clone());

    let snapshots = repository.list(SortOrder::Descending)?;
    if snapshots.is_empty() {
        println!("No snapshots found in {}", repository.root());
        return Ok(());
    }

    let engine = RetentionEngine::new(&fs);
    let result = engine.evaluate(repository.root(), snapshots, &rules, args.dry_run)?;

    println!("{}", format_snapshot_list(&result, true));
    println!("{}", format_retention_summary(&result, args.dry_run));
    Ok(())
}
