//! Retention engine
//!
//! Decides which snapshots survive a set of interval rules and removes the
//! rest. Rules run from the finest granularity to the coarsest; each keeps at
//! most one snapshot per calendar bucket, walking backwards from the newest
//! snapshot, and a snapshot kept by one rule is no longer a candidate for
//! later rules. The result is dense retention for recent history and sparse
//! retention further back.

use tracing::info;

use crate::display::format_snapshot_list;
use crate::error::{HardsnapError, HardsnapResult};
use crate::models::snapshot::REMOVE_ANNOTATION;
use crate::models::{IntervalRule, Location, Snapshot};
use crate::storage::Filesystem;

/// Mark every snapshot as kept or removed according to `rules`
///
/// The snapshots are returned newest first, annotated with the reason for
/// their fate. Nothing is deleted.
pub fn mark_snapshots(
    mut snapshots: Vec<Snapshot>,
    rules: &[IntervalRule],
) -> HardsnapResult<Vec<Snapshot>> {
    if rules.is_empty() {
        return Err(HardsnapError::Precondition(
            "At least one retention rule is required".into(),
        ));
    }

    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let (newest, oldest) = match (snapshots.first(), snapshots.last()) {
        (Some(newest), Some(oldest)) => (newest.timestamp, oldest.timestamp),
        _ => {
            return Err(HardsnapError::Precondition(
                "Cannot apply retention to an empty snapshot set".into(),
            ))
        }
    };

    let mut rules = rules.to_vec();
    rules.sort_by(|a, b| a.ordering_weight().total_cmp(&b.ordering_weight()));

    for snapshot in &mut snapshots {
        snapshot.marked_for_removal = true;
        snapshot.annotation = REMOVE_ANNOTATION.to_string();
    }

    for rule in &rules {
        let mut cursor = newest;
        let mut kept = 0;

        while cursor >= oldest && kept < rule.max_count {
            // newest unclaimed snapshot in the bucket ending at `cursor`
            if let Some(snapshot) = snapshots
                .iter_mut()
                .find(|s| s.marked_for_removal && rule.contains(cursor, s.timestamp))
            {
                kept += 1;
                snapshot.marked_for_removal = false;
                snapshot.annotation = format!("keep by {}. {}", kept, rule.kind);
            }
            cursor = rule.lower_boundary(cursor);
        }
    }

    Ok(snapshots)
}

/// Applies retention rules to the snapshots of a storage location
pub struct RetentionEngine<'a> {
    fs: &'a dyn Filesystem,
}

impl<'a> RetentionEngine<'a> {
    pub fn new(fs: &'a dyn Filesystem) -> Self {
        Self { fs }
    }

    /// Mark `snapshots` and, unless simulating, delete the ones not kept
    ///
    /// Returns all snapshots, removed ones included, so callers can report
    /// the decision. The first failed removal aborts the pass.
    pub fn evaluate(
        &self,
        storage: &Location,
        snapshots: Vec<Snapshot>,
        rules: &[IntervalRule],
        simulate: bool,
    ) -> HardsnapResult<Vec<Snapshot>> {
        let snapshots = mark_snapshots(snapshots, rules)?;
        info!("retention result:\n{}", format_snapshot_list(&snapshots, true));

        if !simulate {
            for snapshot in snapshots.iter().filter(|s| s.marked_for_removal) {
                let location = storage.join(&snapshot.name());
                info!(snapshot = %location, "removing snapshot");
                self.fs.remove_dir(&location)?;
            }
        }

        Ok(snapshots)
    }
}
