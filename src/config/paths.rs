//! Path management for hardsnap
//!
//! ## Path Resolution Order
//!
//! 1. `HARDSNAP_CONFIG_DIR` environment variable (if set)
//! 2. `$XDG_CONFIG_HOME/hardsnap`
//! 3. The platform config directory (`~/.config/hardsnap` on Linux)

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::HardsnapError;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "HARDSNAP_CONFIG_DIR";

/// Manages all paths used by hardsnap
#[derive(Debug, Clone)]
pub struct HardsnapPaths {
    base_dir: PathBuf,
}

impl HardsnapPaths {
    /// Resolve the configuration directory
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, HardsnapError> {
        let base_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create HardsnapPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the configuration directory exists
    pub fn ensure_directories(&self) -> Result<(), HardsnapError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            HardsnapError::Io(format!("Failed to create config directory: {}", e))
        })
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, HardsnapError> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("hardsnap"));
    }
    let dirs = BaseDirs::new()
        .ok_or_else(|| HardsnapError::Config("Could not determine home directory".into()))?;
    Ok(dirs.config_dir().join("hardsnap"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = HardsnapPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.config_dir(), temp_dir.path());
        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert!(!paths.is_initialized());
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var(CONFIG_DIR_ENV, temp_dir.path());
        let paths = HardsnapPaths::new().unwrap();
        env::remove_var(CONFIG_DIR_ENV);

        assert_eq!(paths.config_dir(), temp_dir.path());
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = HardsnapPaths::with_base_dir(temp_dir.path().join("nested").join("hardsnap"));

        paths.ensure_directories().unwrap();

        assert!(paths.config_dir().is_dir());
    }
}
