//! Runtime settings: where the store, blueprints and bundled assets live.
//!
//! Values are layered: built-in defaults, then an optional TOML settings
//! file, then command-line flags / environment variables.
//!
//! # Example TOML
//!
//! ```toml
//! data_dir = "~/.local/share/switch-manager"
//! bundle_dir = "/usr/share/switch-manager"
//! # store_path and blueprints_dir default to entries under data_dir
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::path::PathResolver;
use crate::error::{Result, SwmError};

/// Application directory name under the platform data/config dirs.
pub const APP_DIR: &str = "switch-manager";
/// Store file name under `data_dir`.
pub const STORE_FILE: &str = "switch_manager.db";
/// Writable blueprint directory name under `data_dir`.
pub const BLUEPRINTS_DIR: &str = "blueprints";
/// Bundled asset directory name under `data_dir` when none is configured.
pub const BUNDLE_DIR: &str = "bundle";

/// On-disk settings file; every entry is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub blueprints_dir: Option<PathBuf>,
    #[serde(default)]
    pub bundle_dir: Option<PathBuf>,
}

impl SettingsFile {
    /// Parse settings TOML, resolving relative paths against `path`'s directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SwmError::SettingsNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SwmError::Io(e)
            }
        })?;

        let raw: Self = toml::from_str(&text)
            .map_err(|e| SwmError::SettingsInvalid(format!("{}: {e}", path.display())))?;

        let resolver = PathResolver::new(path)?;
        let resolve = |p: Option<PathBuf>| p.map(|p| resolver.resolve(&p)).transpose();
        Ok(Self {
            data_dir: resolve(raw.data_dir)?,
            store_path: resolve(raw.store_path)?,
            blueprints_dir: resolve(raw.blueprints_dir)?,
            bundle_dir: resolve(raw.bundle_dir)?,
        })
    }
}

/// Command-line / environment overrides.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Explicit settings file; must exist when given.
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub bundle_dir: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub store_path: PathBuf,
    pub blueprints_dir: PathBuf,
    pub bundle_dir: PathBuf,
}

impl Settings {
    /// Settings rooted at `data_dir` with the standard layout beneath it.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>, bundle_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            store_path: data_dir.join(STORE_FILE),
            blueprints_dir: data_dir.join(BLUEPRINTS_DIR),
            bundle_dir: bundle_dir.into(),
            data_dir,
        }
    }

    /// Default data directory (`~/.local/share/switch-manager` on Linux).
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| SwmError::SettingsInvalid("Could not determine data directory".into()))
    }

    /// Default settings file location, whether or not it exists.
    pub fn default_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Resolve settings from defaults, the settings file and overrides.
    #[instrument(skip_all)]
    pub fn load(overrides: &SettingsOverrides) -> Result<Self> {
        let file = match &overrides.config {
            Some(path) => SettingsFile::load(path)?,
            None => match Self::default_settings_path() {
                Some(path) if path.is_file() => SettingsFile::load(&path)?,
                _ => {
                    debug!("No settings file, using defaults");
                    SettingsFile::default()
                }
            },
        };

        let data_dir = match overrides.data_dir.clone().or(file.data_dir) {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };

        let settings = Self {
            store_path: file.store_path.unwrap_or_else(|| data_dir.join(STORE_FILE)),
            blueprints_dir: file
                .blueprints_dir
                .unwrap_or_else(|| data_dir.join(BLUEPRINTS_DIR)),
            bundle_dir: overrides
                .bundle_dir
                .clone()
                .or(file.bundle_dir)
                .unwrap_or_else(|| data_dir.join(BUNDLE_DIR)),
            data_dir,
        };

        info!(
            data_dir = %settings.data_dir.display(),
            bundle_dir = %settings.bundle_dir.display(),
            "Settings resolved"
        );
        Ok(settings)
    }
}
