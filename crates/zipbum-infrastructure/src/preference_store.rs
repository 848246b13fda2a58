//! TOML-backed preference store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use zipbum_core::Result;
use zipbum_core::preference::{PreferenceStore, Theme};

use crate::paths::ZipbumPaths;
use crate::storage::AtomicTomlFile;

/// On-disk shape of `preferences.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct Preferences {
    theme: Theme,
}

/// Persists preferences in `~/.config/zipbum/preferences.toml`.
pub struct TomlPreferenceStore {
    file: AtomicTomlFile<Preferences>,
}

impl TomlPreferenceStore {
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ZipbumPaths::preferences_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn theme(&self) -> Result<Theme> {
        Ok(self.file.load()?.unwrap_or_default().theme)
    }

    fn set_theme(&self, theme: Theme) -> Result<()> {
        self.file
            .update(Preferences::default(), |prefs| prefs.theme = theme)?;
        tracing::debug!(%theme, "Theme preference saved");
        Ok(())
    }
}
