//! Content synchronizer
//!
//! Builds rsync invocations, runs them through a [`CommandExecutor`] and
//! interprets the `--stats` summary of dry runs.

use tracing::{debug, info};

use crate::error::{HardsnapError, HardsnapResult};
use crate::exec::{quote_rsync_arg, CommandExecutor, ConnectionOptions, ShellExecutor};
use crate::models::Location;
use crate::storage::PRESERVE_FLAGS;

/// Summary lines whose counts indicate that the source differs from the destination
const CHANGE_COUNTERS: [&str; 3] = [
    "Number of created files:",
    "Number of deleted files:",
    "Number of regular files transferred:",
];

/// Prefix of rsync's own error reports
const ERROR_LINE_PREFIX: &str = "rsync:";

/// One source tree of a synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSource {
    pub location: Location,
    /// Copy the directory's contents (`src/`) rather than the directory itself (`src`)
    pub contents_only: bool,
}

impl SyncSource {
    /// Merge the contents of `location` into the destination
    pub fn contents(location: Location) -> Self {
        Self {
            location,
            contents_only: true,
        }
    }

    /// Place `location` as a subdirectory of the destination
    pub fn directory(location: Location) -> Self {
        Self {
            location,
            contents_only: false,
        }
    }
}

/// Flags shared by every synchronization of one backup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// `-n --stats`
    pub dry_run: bool,
    /// `-q`, ignored for dry runs
    pub quiet: bool,
    /// Passed verbatim to rsync
    pub extra_args: String,
}

/// A single synchronizer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncInvocation {
    pub sources: Vec<SyncSource>,
    pub destination: Location,
    pub options: SyncOptions,
}

impl SyncInvocation {
    /// Render the rsync command line
    pub fn command_line(&self, connection: &ConnectionOptions) -> String {
        let mut parts = vec![
            "rsync".to_string(),
            format!("{}v", PRESERVE_FLAGS),
            "--delete".to_string(),
            "--no-inc-recursive".to_string(),
        ];

        let extra = self.options.extra_args.trim();
        if !extra.is_empty() {
            parts.push(extra.to_string());
        }
        if let Some(remote_shell) = connection.rsync_remote_shell() {
            parts.push(remote_shell);
        }

        if self.options.dry_run {
            parts.push("-n --stats".to_string());
        } else if self.options.quiet {
            parts.push("-q".to_string());
        }

        for source in &self.sources {
            parts.push(quote_rsync_arg(
                &source.location.trimmed(),
                source.contents_only,
            ));
        }
        parts.push(quote_rsync_arg(&self.destination.trimmed(), true));

        parts.join(" ")
    }
}

/// Copies source trees into a destination tree
pub trait Synchronizer {
    /// Run the synchronization and return its output lines
    fn synchronize(&self, invocation: &SyncInvocation) -> HardsnapResult<Vec<String>>;
}

/// [`Synchronizer`] backed by the rsync binary
#[derive(Debug, Clone, Default)]
pub struct RsyncSynchronizer<E = ShellExecutor> {
    executor: E,
}

impl<E: CommandExecutor> RsyncSynchronizer<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: CommandExecutor> Synchronizer for RsyncSynchronizer<E> {
    fn synchronize(&self, invocation: &SyncInvocation) -> HardsnapResult<Vec<String>> {
        let command = invocation.command_line(self.executor.connection());
        info!(command = %command, "running rsync");

        // rsync keeps going after reporting some errors; stop it at the first one
        let mut aborted = false;
        let mut on_line = |line: &str| {
            debug!("(rsync) {}", line);
            if line.starts_with(ERROR_LINE_PREFIX) {
                aborted = true;
            }
            !aborted
        };
        let output = self.executor.execute_checked(&command, Some(&mut on_line))?;
        if aborted {
            return Err(HardsnapError::Command {
                command,
                status: output.status,
                output: output.lines,
            });
        }
        Ok(output.lines)
    }
}

/// Whether a dry run's `--stats` summary reports any created, deleted or
/// transferred files
///
/// Lines are scanned from the end, where rsync prints its summary.
pub fn changed_from_stats(lines: &[String]) -> HardsnapResult<bool> {
    for line in lines.iter().rev() {
        let Some(prefix) = CHANGE_COUNTERS.iter().find(|p| line.starts_with(*p)) else {
            continue;
        };
        if parse_count(&line[prefix.len()..])? != 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Parse `" 1,234 (reg: 1,200, dir: 34)"` into `1234`
fn parse_count(raw: &str) -> HardsnapResult<u64> {
    let number = raw.split('(').next().unwrap_or_default().trim().replace(',', "");
    number
        .parse()
        .map_err(|e| HardsnapError::Parse(format!("Invalid rsync count '{}': {}", raw.trim(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{CommandOutput, LineCallback};
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    /// Replays canned output through the line callback
    struct ScriptedExecutor {
        output: Vec<&'static str>,
        status: i32,
        connection: ConnectionOptions,
        commands: RefCell<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn new(output: &[&'static str], status: i32) -> Self {
            Self {
                output: output.to_vec(),
                status,
                connection: ConnectionOptions::default(),
                commands: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandExecutor for ScriptedExecutor {
        fn execute(
            &self,
            command: &str,
            mut on_line: Option<LineCallback<'_>>,
        ) -> HardsnapResult<CommandOutput> {
            self.commands.borrow_mut().push(command.to_string());
            let mut seen = Vec::new();
            for line in &self.output {
                seen.push(line.to_string());
                if let Some(callback) = on_line.as_mut() {
                    if !callback(*line) {
                        break;
                    }
                }
            }
            Ok(CommandOutput {
                status: self.status,
                lines: seen,
            })
        }

        fn connection(&self) -> &ConnectionOptions {
            &self.connection
        }
    }

    #[test]
    fn test_synchronize_returns_output() {
        let executor = ScriptedExecutor::new(&["sending incremental file list", "a.txt"], 0);
        let sync = RsyncSynchronizer::new(executor);
        let output = sync
            .synchronize(&direct_invocation(SyncOptions::default()))
            .unwrap();
        assert_eq!(output, lines(&["sending incremental file list", "a.txt"]));
        assert!(sync.executor.commands.borrow()[0].starts_with("rsync -rlptgoDEAXWSHv"));
    }

    #[test]
    fn test_synchronize_aborts_on_rsync_error_line() {
        let executor = ScriptedExecutor::new(
            &["a.txt", "rsync: send_files failed to open \"b.txt\"", "c.txt"],
            0,
        );
        let sync = RsyncSynchronizer::new(executor);
        let err = sync
            .synchronize(&direct_invocation(SyncOptions::default()))
            .unwrap_err();
        match err {
            HardsnapError::Command { output, .. } => {
                assert_eq!(output.last().unwrap(), "rsync: send_files failed to open \"b.txt\"");
                assert_eq!(output.len(), 2);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_synchronize_fails_on_exit_status() {
        let sync = RsyncSynchronizer::new(ScriptedExecutor::new(&["partial transfer"], 23));
        let err = sync
            .synchronize(&direct_invocation(SyncOptions::default()))
            .unwrap_err();
        assert!(err.is_command());
    }

    fn direct_invocation(options: SyncOptions) -> SyncInvocation {
        SyncInvocation {
            sources: vec![SyncSource::contents(Location::parse("/data/src/"))],
            destination: Location::parse("/store/2020-01-01_00-00-00.tmp"),
            options,
        }
    }

    #[test]
    fn test_quiet_command_line() {
        let invocation = direct_invocation(SyncOptions {
            dry_run: false,
            quiet: true,
            extra_args: String::new(),
        });
        assert_eq!(
            invocation.command_line(&ConnectionOptions::default()),
            "rsync -rlptgoDEAXWSHv --delete --no-inc-recursive -q \"/data/src/\" \"/store/2020-01-01_00-00-00.tmp/\""
        );
    }

    #[test]
    fn test_dry_run_command_line_with_key_and_args() {
        let invocation = direct_invocation(SyncOptions {
            dry_run: true,
            quiet: true,
            extra_args: " --exclude=.cache ".to_string(),
        });
        let connection = ConnectionOptions::with_ssh_key(Some(PathBuf::from("/k")));
        assert_eq!(
            invocation.command_line(&connection),
            "rsync -rlptgoDEAXWSHv --delete --no-inc-recursive --exclude=.cache -e \"ssh -i '/k'\" -n --stats \"/data/src/\" \"/store/2020-01-01_00-00-00.tmp/\""
        );
    }

    #[test]
    fn test_two_source_command_line() {
        let invocation = SyncInvocation {
            sources: vec![
                SyncSource::contents(Location::parse("/data/.record")),
                SyncSource::directory(Location::parse("/data/12345678.tmp/")),
            ],
            destination: Location::parse("nas:/store/new.tmp"),
            options: SyncOptions::default(),
        };
        assert_eq!(
            invocation.command_line(&ConnectionOptions::default()),
            "rsync -rlptgoDEAXWSHv --delete --no-inc-recursive \"/data/.record/\" \"/data/12345678.tmp\" \"nas:/store/new.tmp/\""
        );
    }

    #[test]
    fn test_unchanged_stats() {
        let output = lines(&[
            "Number of files: 1,024 (reg: 1,000, dir: 24)",
            "Number of created files: 0",
            "Number of deleted files: 0",
            "Number of regular files transferred: 0",
            "Total file size: 1,048,576 bytes",
        ]);
        assert!(!changed_from_stats(&output).unwrap());
    }

    #[test]
    fn test_changed_stats() {
        let created = lines(&[
            "Number of created files: 1,203 (reg: 1,200, dir: 3)",
            "Number of deleted files: 0",
            "Number of regular files transferred: 0",
        ]);
        assert!(changed_from_stats(&created).unwrap());

        let transferred = lines(&[
            "Number of created files: 0",
            "Number of deleted files: 0",
            "Number of regular files transferred: 2",
        ]);
        assert!(changed_from_stats(&transferred).unwrap());
    }

    #[test]
    fn test_no_stats_means_unchanged() {
        assert!(!changed_from_stats(&lines(&["sending incremental file list"])).unwrap());
        assert!(!changed_from_stats(&[]).unwrap());
    }

    #[test]
    fn test_malformed_count() {
        let output = lines(&["Number of deleted files: lots"]);
        assert!(matches!(
            changed_from_stats(&output),
            Err(HardsnapError::Parse(_))
        ));
    }
}
