//! Command execution
//!
//! Runs bash command strings, streaming their merged stdout/stderr line by
//! line to an optional callback that can abort the process.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{HardsnapError, HardsnapResult};

use super::shell::ConnectionOptions;

/// Per-line output callback. Returning `false` kills the running process.
pub type LineCallback<'a> = &'a mut dyn FnMut(&str) -> bool;

/// Exit status and non-empty output lines of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `-1` if the process was terminated by a signal
    pub status: i32,
    /// Trimmed output lines, blank lines dropped
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs shell commands locally or, via the connection options, on remote hosts
pub trait CommandExecutor {
    /// Run `command` to completion and report its status
    fn execute(
        &self,
        command: &str,
        on_line: Option<LineCallback<'_>>,
    ) -> HardsnapResult<CommandOutput>;

    /// Options used to reach remote hosts
    fn connection(&self) -> &ConnectionOptions;

    /// Run `command` and fail with [`HardsnapError::Command`] on a nonzero exit
    fn execute_checked(
        &self,
        command: &str,
        on_line: Option<LineCallback<'_>>,
    ) -> HardsnapResult<CommandOutput> {
        let output = self.execute(command, on_line)?;
        if !output.success() {
            return Err(HardsnapError::Command {
                command: command.to_string(),
                status: output.status,
                output: output.lines,
            });
        }
        Ok(output)
    }

    /// Run `command` on `host` (or locally) with strict exit checking
    fn execute_on(&self, host: Option<&str>, command: &str) -> HardsnapResult<CommandOutput> {
        let wrapped = self.connection().wrap_remote(host, command);
        self.execute_checked(&wrapped, None)
    }
}

/// Executes commands with `/bin/bash -c`
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    connection: ConnectionOptions,
}

impl ShellExecutor {
    pub fn new(connection: ConnectionOptions) -> Self {
        Self { connection }
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(
        &self,
        command: &str,
        mut on_line: Option<LineCallback<'_>>,
    ) -> HardsnapResult<CommandOutput> {
        debug!(command = %command, "executing");

        let mut child = Command::new("/bin/bash")
            .arg("-c")
            .arg(format!("exec 2>&1; {}", command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HardsnapError::Io(format!("Starting process of command '{}' failed: {}", command, e))
            })?;

        let mut lines = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            for chunk in reader.split(b'\n') {
                let chunk = chunk.map_err(|e| {
                    HardsnapError::Io(format!("Failed to read output of '{}': {}", command, e))
                })?;
                let line = String::from_utf8_lossy(&chunk).trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let keep_going = match on_line.as_mut() {
                    Some(callback) => callback(&line),
                    None => true,
                };
                lines.push(line);
                if !keep_going {
                    warn!(command = %command, "aborting process on output line");
                    if let Err(e) = child.kill() {
                        warn!(error = %e, "failed to kill process");
                    }
                    break;
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| HardsnapError::Io(format!("Failed to wait for '{}': {}", command, e)))?;

        Ok(CommandOutput {
            status: status.code().unwrap_or(-1),
            lines,
        })
    }

    fn connection(&self) -> &ConnectionOptions {
        &self.connection
    }
}
