use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::LibraryConfig;

/// Name of the config file that marks a readmark library directory
pub const CONFIG_FILE: &str = "readmark.toml";

/// Error type for config discovery and loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no readmark.toml found in {0} or any parent directory")]
    NotFound(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse readmark.toml: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A loaded config together with the directory it was found in
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub root: PathBuf,
    pub config: LibraryConfig,
}

impl LoadedConfig {
    /// Absolute path of the status file
    pub fn store_path(&self) -> PathBuf {
        self.root.join(&self.config.store.path)
    }
}

/// Walk up from `start` looking for a directory holding readmark.toml.
pub fn discover_config(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotFound(start.to_path_buf()));
        }
    }
}

/// Read and parse readmark.toml from `root`.
pub fn read_config(root: &Path) -> Result<LibraryConfig, ConfigError> {
    let path = root.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Discover and load the config for `start`.
pub fn load_config(start: &Path) -> Result<LoadedConfig, ConfigError> {
    let root = discover_config(start)?;
    let config = read_config(&root)?;
    Ok(LoadedConfig { root, config })
}
