//! Snapshot representation
//!
//! A snapshot is one completed backup directory. Its timestamp is both its
//! identity and its directory name.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HardsnapError;

/// strftime format of snapshot directory names
pub const SNAPSHOT_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Length of a snapshot directory name (`YYYY-MM-DD_hh-mm-ss`)
const SNAPSHOT_NAME_LEN: usize = 19;

/// Annotation given to every snapshot at the start of a retention pass
pub const REMOVE_ANNOTATION: &str = "REMOVE";

/// One completed, timestamped backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Creation instant, second precision
    pub timestamp: NaiveDateTime,
    /// Set by the retention engine
    pub marked_for_removal: bool,
    /// Reason for the retention decision
    pub annotation: String,
}

impl Snapshot {
    /// Create a snapshot record for the given instant
    ///
    /// Sub-second precision is dropped.
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            marked_for_removal: false,
            annotation: String::new(),
        }
    }

    /// Create a snapshot for the current local time
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Directory name of this snapshot
    pub fn name(&self) -> String {
        self.timestamp.format(SNAPSHOT_NAME_FORMAT).to_string()
    }

    /// Parse a directory name, returning None unless it matches the name pattern exactly
    pub fn parse_name(name: &str) -> Option<Self> {
        if !is_snapshot_name(name) {
            return None;
        }
        NaiveDateTime::parse_from_str(name, SNAPSHOT_NAME_FORMAT)
            .ok()
            .map(Self::new)
    }

    /// Whether the retention engine decided to keep this snapshot
    pub fn is_kept(&self) -> bool {
        !self.marked_for_removal
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp.format(SNAPSHOT_NAME_FORMAT))
    }
}

impl FromStr for Snapshot {
    type Err = HardsnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_name(s)
            .ok_or_else(|| HardsnapError::Parse(format!("Invalid snapshot name: '{}'", s)))
    }
}

/// Check a name against `^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$`
fn is_snapshot_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() != SNAPSHOT_NAME_LEN {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 | 13 | 16 => *b == b'-',
        10 => *b == b'_',
        _ => b.is_ascii_digit(),
    })
}

fn truncate_to_seconds(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
