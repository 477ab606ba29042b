//! User settings for hardsnap
//!
//! Defaults for every backup: ssh key, extra rsync arguments, retention rules
//! and the move record. Command line flags override them per invocation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::HardsnapPaths;
use crate::error::HardsnapError;
use crate::models::{IntervalRule, Location};

/// User settings for hardsnap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Private key for ssh connections to remote hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<PathBuf>,

    /// Additional rsync arguments, e.g. `--exclude=.cache`
    #[serde(default)]
    pub rsync_args: String,

    /// Retention rules; backups clean up only when these are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<Vec<IntervalRule>>,

    /// Move record used for move detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_record: Option<Location>,

    /// Skip backups when nothing changed
    #[serde(default)]
    pub only_if_changed: bool,
}

fn default_schema_version() -> u32 {
    1
}

/// Rules used by `clean` when none are configured: 24 hourly, 7 daily,
/// 4 weekly, 12 monthly and 10 yearly snapshots
pub fn default_retention() -> Vec<IntervalRule> {
    vec![
        IntervalRule::hour(24),
        IntervalRule::day(7),
        IntervalRule::week(4),
        IntervalRule::month(12),
        IntervalRule::year(10),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            ssh_key: None,
            rsync_args: String::new(),
            retention: None,
            move_record: None,
            only_if_changed: false,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &HardsnapPaths) -> Result<Self, HardsnapError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                HardsnapError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                HardsnapError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &HardsnapPaths) -> Result<(), HardsnapError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            HardsnapError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            HardsnapError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
