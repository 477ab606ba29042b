//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup and retention layers.

pub mod backup;
pub mod clean;
pub mod list;

use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;
use crate::error::HardsnapResult;
use crate::exec::{ConnectionOptions, ShellExecutor};
use crate::models::IntervalRule;
use crate::storage::ShellFilesystem;

pub use backup::{handle_backup_command, BackupArgs};
pub use clean::{handle_clean_command, CleanArgs};
pub use list::{handle_list_command, ListArgs};

/// Connection flags shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Private key for ssh connections to remote locations
    #[arg(long, env = "HARDSNAP_SSH_KEY", value_name = "KEY")]
    pub ssh_key: Option<PathBuf>,
}

impl ConnectionArgs {
    /// Shell executor using the flag, or the configured key
    pub fn executor(&self, settings: &Settings) -> ShellExecutor {
        let key = self.ssh_key.clone().or_else(|| settings.ssh_key.clone());
        ShellExecutor::new(ConnectionOptions::with_ssh_key(key))
    }

    pub fn filesystem(&self, settings: &Settings) -> ShellFilesystem {
        ShellFilesystem::new(self.executor(settings))
    }
}

/// Rules from `--keep`, else the configured ones, else none
pub fn retention_rules(
    keep: Option<&str>,
    settings: &Settings,
) -> HardsnapResult<Option<Vec<IntervalRule>>> {
    match keep {
        Some(raw) => IntervalRule::parse_list(raw).map(Some),
        None => Ok(settings.retention.clone()),
    }
}
