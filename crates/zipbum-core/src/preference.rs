//! User preferences that outlive a single run.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;

/// Color scheme of the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Process-wide key-value preference store.
///
/// Read once at startup and written whenever the user changes a preference.
pub trait PreferenceStore: Send + Sync {
    /// Returns the stored theme, or the default when nothing was stored yet.
    fn theme(&self) -> Result<Theme>;

    fn set_theme(&self, theme: Theme) -> Result<()>;
}
