//! Configuration module for hardsnap
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Persisted backup defaults

pub mod paths;
pub mod settings;

pub use paths::HardsnapPaths;
pub use settings::Settings;
