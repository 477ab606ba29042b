//! List CLI command

use clap::Args;

use crate::config::Settings;
use crate::display::format_snapshot_list;
use crate::error::HardsnapResult;
use crate::models::Location;
use crate::storage::{SnapshotRepository, SortOrder};

use super::ConnectionArgs;

/// Arguments of `hardsnap list`
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Directory holding the snapshots, `[host:]path`
    pub storage: Location,

    /// Show only this snapshot, e.g. `2021-03-01_08-00-00`
    pub snapshot: Option<String>,

    /// Oldest snapshot first
    #[arg(long)]
    pub reverse: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Handle `hardsnap list`
pub fn handle_list_command(settings: &Settings, args: ListArgs) -> HardsnapResult<()> {
    let fs = args.connection.filesystem(settings);
    let repository = SnapshotRepository::new(&fs, args.storage.clone());

    if let Some(name) = &args.snapshot {
        let snapshot = repository.get(name)?;
        println!("{}  {}", snapshot, repository.location_of(&snapshot));
        return Ok(());
    }

    let order = if args.reverse {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    };

    let snapshots = repository.list(order)?;
    if snapshots.is_empty() {
        println!("No snapshots found in {}", repository.root());
        return Ok(());
    }

    println!("Snapshots in {} ({})", repository.root(), snapshots.len());
    println!("{}", format_snapshot_list(&snapshots, false));
    Ok(())
}
