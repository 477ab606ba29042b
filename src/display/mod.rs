//! Display formatting for terminal output
//!
//! Renders snapshot listings and retention results for the CLI and for log
//! messages.

pub mod snapshot;

pub use snapshot::{format_retention_summary, format_snapshot_list};
