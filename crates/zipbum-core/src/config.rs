//! Client configuration model.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZipbumError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings read from `config.toml`, environment and command line, in
/// increasing priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL of the chat backend.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP transport. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Default tracing filter when `ZIPBUM_LOG` is unset.
    pub log_level: String,
    /// Login email; the password is never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            email: None,
        }
    }
}

impl ClientConfig {
    /// Checks values that would otherwise fail later at request time.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ZipbumError::config(format!(
                "base_url must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ZipbumError::config("request_timeout_secs must be positive"));
        }
        Ok(())
    }
}
