//! Application configuration.
//!
//! A single optional TOML file under the user's config directory; every
//! field has a default so a fresh install runs without any setup.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use tracing::info;

use crate::picture::PLACEHOLDER_PICTURE_URL;

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "cardfile";
/// File name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings controlling the picture picker and card rendering.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for images by the profile picture picker.
    pub pictures_root: PathBuf,
    /// Image used on cards when no picture was uploaded.
    pub placeholder_url: String,
    /// Seconds to wait for a picture file read before giving up.
    pub picture_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from the default location, applying defaults for
    /// anything missing. A missing file is fine; a malformed one is not.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from an explicit path (missing file allowed).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .set_default(
                "pictures_root",
                default_pictures_root().to_string_lossy().to_string(),
            )?
            .set_default("placeholder_url", PLACEHOLDER_PICTURE_URL)?
            .set_default("picture_timeout_secs", 5_u64)?
            .add_source(File::from(path).required(false))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Picture read timeout as a [`Duration`].
    pub fn picture_timeout(&self) -> Duration {
        Duration::from_secs(self.picture_timeout_secs)
    }
}

/// Path of the configuration file inside the platform config directory.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Platform config directory for this application.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Write a commented template config on first run; leaves an existing file
/// alone.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let template = format!(
        "# Cardfile configuration. Delete a line to fall back to its default.\n\
         \n\
         # Directory scanned by the profile picture picker.\n\
         pictures_root = {:?}\n\
         \n\
         # Image shown on cards when no picture was uploaded.\n\
         placeholder_url = \"{}\"\n\
         \n\
         # Seconds to wait for a picture file read before giving up.\n\
         picture_timeout_secs = 5\n",
        default_pictures_root().to_string_lossy(),
        PLACEHOLDER_PICTURE_URL,
    );
    fs::write(&path, template).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default config to {}", path.display());
    Ok(())
}

fn default_pictures_root() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_a_file() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.placeholder_url, PLACEHOLDER_PICTURE_URL);
        assert_eq!(config.picture_timeout_secs, 5);
        assert_eq!(config.picture_timeout(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "pictures_root = \"/srv/pics\"\n\
             placeholder_url = \"https://example.com/p.png\"\n\
             picture_timeout_secs = 9\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.pictures_root, PathBuf::from("/srv/pics"));
        assert_eq!(config.placeholder_url, "https://example.com/p.png");
        assert_eq!(config.picture_timeout(), Duration::from_secs(9));
        Ok(())
    }

    #[test]
    fn malformed_files_are_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "picture_timeout_secs = \"soon\"\n")?;
        assert!(AppConfig::load_from(&path).is_err());
        Ok(())
    }
}
