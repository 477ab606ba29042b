//! Filesystem primitives
//!
//! Directory checks, listing, removal, moves and hardlink cloning. Each
//! operation is path-tagged: on a remote location the command runs over ssh.

use tracing::debug;

use crate::error::HardsnapResult;
use crate::exec::{quote, CommandExecutor, ShellExecutor};
use crate::models::Location;

/// rsync flags used for hardlink cloning: recursive, symlinks, permissions,
/// times, group, owner, devices, executability, ACLs, xattrs, whole files,
/// sparse files, hardlinks
pub const PRESERVE_FLAGS: &str = "-rlptgoDEAXWSH";

/// Directory access mode for [`Filesystem::check_dir`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    fn test_flag(&self) -> &'static str {
        match self {
            Self::Read => "-r",
            Self::Write => "-w",
        }
    }
}

/// Side-effecting filesystem operations used by the retention engine and the
/// backup orchestrator
pub trait Filesystem {
    /// Whether `location` is a directory with the given access
    fn check_dir(&self, location: &Location, access: Access) -> HardsnapResult<bool>;

    /// Whether any entry exists at `location`
    fn exists(&self, location: &Location) -> HardsnapResult<bool>;

    /// Names of the direct subdirectories of `location`
    fn list_dirs(&self, location: &Location) -> HardsnapResult<Vec<String>>;

    /// Recursively remove `location`; a missing entry is not an error
    fn remove_dir(&self, location: &Location) -> HardsnapResult<()>;

    /// Move `from` to `to` on the host of `from`
    fn move_dir(&self, from: &Location, to: &Location) -> HardsnapResult<()>;

    /// Clone the tree at `from` into `to`, hardlinking every file
    fn hardlink_clone(&self, from: &Location, to: &Location) -> HardsnapResult<()>;
}

/// [`Filesystem`] implemented with shell commands
#[derive(Debug, Clone, Default)]
pub struct ShellFilesystem<E = ShellExecutor> {
    executor: E,
}

impl<E: CommandExecutor> ShellFilesystem<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    fn test(&self, location: &Location, condition: String) -> HardsnapResult<bool> {
        let command = format!("[[ {} ]] && echo 1 || echo 0", condition);
        let output = self.executor.execute_on(location.host(), &command)?;
        Ok(output.lines == ["1"])
    }
}

impl<E: CommandExecutor> Filesystem for ShellFilesystem<E> {
    fn check_dir(&self, location: &Location, access: Access) -> HardsnapResult<bool> {
        let path = quote(location.path());
        self.test(
            location,
            format!("-d {} && {} {}", path, access.test_flag(), path),
        )
    }

    fn exists(&self, location: &Location) -> HardsnapResult<bool> {
        self.test(location, format!("-e {}", quote(location.path())))
    }

    fn list_dirs(&self, location: &Location) -> HardsnapResult<Vec<String>> {
        let command = format!(
            "cd {} && find . -maxdepth 1 -mindepth 1 -type d | sed 's|^\\./||'",
            quote(location.path())
        );
        let output = self.executor.execute_on(location.host(), &command)?;
        Ok(output.lines)
    }

    fn remove_dir(&self, location: &Location) -> HardsnapResult<()> {
        debug!(path = %location, "removing directory");
        let command = format!("rm -rf {}", quote(location.path()));
        self.executor.execute_on(location.host(), &command)?;
        Ok(())
    }

    fn move_dir(&self, from: &Location, to: &Location) -> HardsnapResult<()> {
        debug!(from = %from, to = %to, "moving directory");
        let command = format!("mv {} {}", quote(from.path()), quote(to.path()));
        self.executor.execute_on(from.host(), &command)?;
        Ok(())
    }

    fn hardlink_clone(&self, from: &Location, to: &Location) -> HardsnapResult<()> {
        debug!(from = %from, to = %to, "hardlink cloning directory");
        let from_dir = format!("{}/", from.trimmed().path());
        let to_dir = format!("{}/", to.trimmed().path());
        let command = format!(
            "rsync {} --delete --link-dest={} {} {}",
            PRESERVE_FLAGS,
            quote(&from_dir),
            quote(&from_dir),
            quote(&to_dir)
        );
        self.executor.execute_on(from.host(), &command)?;
        Ok(())
    }
}
