//! Unified path management for zipbum configuration files.
//!
//! ```text
//! <config_dir>/zipbum/         # e.g. ~/.config/zipbum on Linux
//! ├── config.toml              # Client configuration
//! └── preferences.toml         # Persisted UI preferences (theme)
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Error, Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    #[error("Cannot find the platform configuration directory")]
    ConfigDirNotFound,
}

impl From<PathError> for zipbum_core::ZipbumError {
    fn from(err: PathError) -> Self {
        zipbum_core::ZipbumError::config(err.to_string())
    }
}

const APP_DIR: &str = "zipbum";

pub struct ZipbumPaths;

impl ZipbumPaths {
    /// Returns the zipbum configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the client configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the preferences file.
    pub fn preferences_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("preferences.toml"))
    }
}
