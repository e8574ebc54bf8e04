//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `METROQUEST_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the platform config dir holding our files.
pub const CONFIG_DIR: &str = "metroquest";
/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "METROQUEST";

/// Runtime settings for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the graph service; the city is appended as a path segment.
    pub api_base_url: String,
    /// City loaded at startup.
    pub default_city: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Directory receiving log files.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_string(),
            default_city: crate::city::FALLBACK_CITY.to_string(),
            request_timeout_secs: 10,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Default location of the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load configuration from the default location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path` (optional) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("default_city", defaults.default_city)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default(
                "log_dir",
                defaults.log_dir.to_string_lossy().into_owned(),
            )?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Write a default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let defaults = AppConfig::default();
    let contents = format!(
        "# metroquest configuration\n\
         # Environment variables prefixed with {ENV_PREFIX}_ override these values.\n\n\
         # Graph service base URL; the city id is appended as a path segment.\n\
         api_base_url = \"{}\"\n\n\
         # City loaded at startup (sz, sh, bj, gz, wh, cs).\n\
         default_city = \"{}\"\n\n\
         request_timeout_secs = {}\n\
         log_dir = \"{}\"\n",
        defaults.api_base_url,
        defaults.default_city,
        defaults.request_timeout_secs,
        defaults.log_dir.display(),
    );
    fs::write(path, contents)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let temp = tempdir()?;
        let config = AppConfig::load_from(temp.path().join("absent.toml"))?;
        assert_eq!(config.default_city, "sz");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "api_base_url = \"http://metro.test/api\"\ndefault_city = \"sh\"\n",
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, "http://metro.test/api");
        assert_eq!(config.default_city, "sh");
        assert_eq!(config.request_timeout_secs, 10);
        Ok(())
    }

    #[test]
    fn written_default_round_trips() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.is_file());
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }
}
