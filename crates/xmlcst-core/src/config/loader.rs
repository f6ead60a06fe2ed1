//! Configuration file discovery and loading

use super::parser_config::ParserConfig;
use crate::error::XmlCstError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// File names probed in each directory, in priority order
const CONFIG_FILE_NAMES: [&str; 2] = ["xmlcst.toml", ".xmlcstrc.toml"];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Starts from the given directory and moves up the directory tree until
    /// a config is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| XmlCstError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<ParserConfig> {
        let content =
            std::fs::read_to_string(path).map_err(|e| XmlCstError::io_error(path, e))?;
        ParserConfig::from_toml_str(&content).map_err(|e| {
            XmlCstError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from path or auto-discover
    ///
    /// An explicit path must exist. Without one, the search starts at
    /// `start_dir` (or the current directory); finding nothing yields the
    /// default configuration.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<ParserConfig> {
        let config_path = if let Some(path) = custom_path {
            if !path.exists() {
                return Err(XmlCstError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path.to_path_buf())
        } else {
            let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
            Self::auto_discover(search_dir)?
        };

        match config_path {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(ParserConfig::default())
            }
        }
    }
}
