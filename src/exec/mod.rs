//! Process execution layer
//!
//! Every external side effect of hardsnap is a bash command string. This
//! module runs those commands, locally or over ssh, and builds their quoting.

pub mod executor;
pub mod shell;

pub use executor::{CommandExecutor, CommandOutput, LineCallback, ShellExecutor};
pub use shell::{quote, quote_rsync_arg, ConnectionOptions};
