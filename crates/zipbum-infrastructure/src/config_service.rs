//! Configuration service implementation.
//!
//! Loads `ClientConfig` from `~/.config/zipbum/config.toml` and applies
//! environment overrides on top.

use std::path::PathBuf;

use zipbum_core::Result;
use zipbum_core::config::ClientConfig;

use crate::paths::ZipbumPaths;
use crate::storage::AtomicTomlFile;

pub const ENV_BASE_URL: &str = "ZIPBUM_BASE_URL";
pub const ENV_EMAIL: &str = "ZIPBUM_EMAIL";
pub const ENV_TIMEOUT_SECS: &str = "ZIPBUM_TIMEOUT_SECS";

pub struct ConfigService {
    file: AtomicTomlFile<ClientConfig>,
}

impl ConfigService {
    /// Uses the platform config directory.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ZipbumPaths::config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Loads the file (defaults when missing) and applies process environment overrides.
    pub fn load(&self) -> Result<ClientConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// Same as `load`, reading overrides through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.file.load()?.unwrap_or_default();
        apply_overrides(&mut config, lookup);
        config.validate()?;

        tracing::debug!(
            path = %self.file.path().display(),
            base_url = %config.base_url,
            "Loaded client configuration"
        );
        Ok(config)
    }

    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        self.file.save(config)?;
        Ok(())
    }
}

fn apply_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.base_url = base_url.trim().to_string();
    }
    if let Some(email) = lookup(ENV_EMAIL).filter(|v| !v.trim().is_empty()) {
        config.email = Some(email.trim().to_string());
    }
    if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
        match raw.trim().parse::<u64>() {
            Ok(secs) => config.request_timeout_secs = Some(secs),
            Err(_) => tracing::warn!(value = %raw, "Ignoring unparsable {}", ENV_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use zipbum_core::config::DEFAULT_BASE_URL;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        let config = service.load_with(env(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn environment_overrides_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        service
            .save(&ClientConfig {
                base_url: "http://chat.internal:8080".to_string(),
                email: Some("file@zip.com".to_string()),
                ..ClientConfig::default()
            })
            .unwrap();

        let config = service
            .load_with(env(&[
                (ENV_BASE_URL, "https://zipbum.example"),
                (ENV_TIMEOUT_SECS, "15"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "https://zipbum.example");
        assert_eq!(config.email.as_deref(), Some("file@zip.com"));
        assert_eq!(config.request_timeout_secs, Some(15));
    }

    #[test]
    fn unparsable_timeout_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        let config = service
            .load_with(env(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap();
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        let err = service
            .load_with(env(&[(ENV_BASE_URL, "ftp://nope")]))
            .unwrap_err();
        assert!(err.is_config());
    }
}
