//! Snapshot repository
//!
//! Lists the snapshots stored under a storage location. Only directories whose
//! name is a snapshot timestamp are recognised; everything else is ignored.

use tracing::debug;

use crate::error::{HardsnapError, HardsnapResult};
use crate::models::{Location, Snapshot};

use super::filesystem::Filesystem;

/// Ordering of listed snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

/// Snapshots stored below one storage location
pub struct SnapshotRepository<'a> {
    fs: &'a dyn Filesystem,
    root: Location,
}

impl<'a> SnapshotRepository<'a> {
    pub fn new(fs: &'a dyn Filesystem, root: Location) -> Self {
        Self {
            fs,
            root: root.trimmed(),
        }
    }

    /// Storage location holding the snapshots
    pub fn root(&self) -> &Location {
        &self.root
    }

    /// List all snapshots in the given order
    pub fn list(&self, order: SortOrder) -> HardsnapResult<Vec<Snapshot>> {
        let names = self.fs.list_dirs(&self.root)?;
        let mut snapshots: Vec<Snapshot> = names
            .iter()
            .filter_map(|name| {
                let parsed = Snapshot::parse_name(name);
                if parsed.is_none() {
                    debug!(name = %name, "ignoring non-snapshot directory");
                }
                parsed
            })
            .collect();

        match order {
            SortOrder::Ascending => snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::Descending => snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        }
        snapshots.dedup_by(|a, b| a.timestamp == b.timestamp);

        Ok(snapshots)
    }

    /// The most recent snapshot, if any
    pub fn latest(&self) -> HardsnapResult<Option<Snapshot>> {
        Ok(self.list(SortOrder::Descending)?.into_iter().next())
    }

    /// Look up a snapshot by directory name
    pub fn get(&self, name: &str) -> HardsnapResult<Snapshot> {
        let wanted = Snapshot::parse_name(name)
            .ok_or_else(|| HardsnapError::snapshot_not_found(name))?;
        self.list(SortOrder::Descending)?
            .into_iter()
            .find(|s| s.timestamp == wanted.timestamp)
            .ok_or_else(|| HardsnapError::snapshot_not_found(name))
    }

    /// Directory of a snapshot inside this repository
    pub fn location_of(&self, snapshot: &Snapshot) -> Location {
        self.root.join(&snapshot.name())
    }
}
