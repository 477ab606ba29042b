//! Snapshot display formatting

use crate::models::Snapshot;

/// Format snapshots one per line, optionally with their retention annotation
pub fn format_snapshot_list(snapshots: &[Snapshot], with_annotation: bool) -> String {
    if snapshots.is_empty() {
        return "  (no snapshots)".to_string();
    }

    snapshots
        .iter()
        .map(|snapshot| {
            if with_annotation && !snapshot.annotation.is_empty() {
                format!("  {} <- {}", snapshot.name(), snapshot.annotation)
            } else {
                format!("  {}", snapshot.name())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of a retention pass
pub fn format_retention_summary(snapshots: &[Snapshot], simulated: bool) -> String {
    let removed = snapshots.iter().filter(|s| s.marked_for_removal).count();
    let kept = snapshots.len() - removed;
    let verb = if simulated { "would remove" } else { "removed" };
    format!("Kept {} snapshot(s), {} {}", kept, verb, removed)
}
