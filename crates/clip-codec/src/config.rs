// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Clipboard settings behind a storage port.
//!
//! Settings live in `ClipboardSettings.json`. A copy in the project
//! directory overrides the global one in the platform config directory;
//! with neither present, defaults apply and point the content directory at
//! the platform data directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clip_core::SerializedVector;
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Key under which [`ClipSettings`] are stored.
pub const SETTINGS_KEY: &str = "ClipboardSettings";

/// Byte storage for settings documents, keyed by logical name.
pub trait ConfigStore {
    /// Bytes stored under `key`; `NotFound` when nothing is.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the bytes under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Delete a blob. Deleting a missing key succeeds.
    fn remove_raw(&self, key: &str) -> Result<(), ConfigError>;
}

/// Failure loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("not found")]
    NotFound,
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored JSON did not match the settings shape.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Anything else, such as an unresolvable platform directory.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values and delegates storage to a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Decodes the value under `key`; `Ok(None)` when absent or empty.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Encodes `value` as pretty JSON under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Drop the value stored for `key`.
    pub fn remove(&self, key: &str) -> Result<(), ConfigError> {
        self.store.remove_raw(key)
    }
}

/// User preferences of the clipboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClipSettings {
    /// Gzip new entries.
    pub save_compressed: bool,
    /// Width of preview thumbnails in pixels.
    pub preview_thumbnail_width: u32,
    /// Where previews are staged, away from the visible scene.
    pub preview_offset: SerializedVector,
    /// Directory holding entries; the platform default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_directory: Option<PathBuf>,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            save_compressed: true,
            preview_thumbnail_width: 200,
            preview_offset: SerializedVector {
                x: -10000.0,
                y: -10000.0,
                z: -10000.0,
            },
            content_directory: None,
        }
    }
}

/// Which file the active settings came from and are saved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsLocation {
    /// `ClipboardSettings.json` in the project directory.
    Project,
    /// The platform config directory.
    Global,
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("dev", "flyingrobots", "Clip")
        .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))
}

/// Default entry directory: `Content` under the platform data directory.
pub fn default_content_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().join("Content"))
}

/// Settings as `<key>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store in the platform config directory (e.g. `~/.config/Clip`), created if missing.
    pub fn new() -> Result<Self, ConfigError> {
        let base = project_dirs()?.config_dir().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Create a store over an existing directory, such as a project root.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory holding the files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<(), ConfigError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }
}

/// Active settings with their project and global backing stores.
#[derive(Debug)]
pub struct Settings<P, G> {
    project: ConfigService<P>,
    global: ConfigService<G>,
    default_content: PathBuf,
    data: ClipSettings,
    location: SettingsLocation,
}

impl<P, G> Settings<P, G>
where
    P: ConfigStore,
    G: ConfigStore,
{
    /// Loads the project file if present, else the global file, else
    /// defaults with `default_content` as the content directory.
    pub fn load(project: P, global: G, default_content: PathBuf) -> Result<Self, ConfigError> {
        let mut settings = Self {
            project: ConfigService::new(project),
            global: ConfigService::new(global),
            default_content,
            data: ClipSettings::default(),
            location: SettingsLocation::Global,
        };
        settings.reload()?;
        Ok(settings)
    }

    /// Re-reads the backing files.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        if let Some(data) = self.project.load(SETTINGS_KEY)? {
            self.data = data;
            self.location = SettingsLocation::Project;
        } else if let Some(data) = self.global.load(SETTINGS_KEY)? {
            self.data = data;
            self.location = SettingsLocation::Global;
        } else {
            self.data = ClipSettings {
                content_directory: Some(self.default_content.clone()),
                ..ClipSettings::default()
            };
            self.location = SettingsLocation::Global;
        }
        debug!(location = ?self.location, "settings loaded");
        Ok(())
    }

    /// Current values.
    pub fn data(&self) -> &ClipSettings {
        &self.data
    }

    /// Mutable values; persist with [`Settings::save`].
    pub fn data_mut(&mut self) -> &mut ClipSettings {
        &mut self.data
    }

    /// Where the values came from.
    pub fn location(&self) -> SettingsLocation {
        self.location
    }

    /// Entry directory in effect.
    pub fn content_directory(&self) -> PathBuf {
        self.data
            .content_directory
            .clone()
            .unwrap_or_else(|| self.default_content.clone())
    }

    /// Writes the values back to the active location.
    pub fn save(&self) -> Result<(), ConfigError> {
        match self.location {
            SettingsLocation::Project => self.project.save(SETTINGS_KEY, &self.data),
            SettingsLocation::Global => self.global.save(SETTINGS_KEY, &self.data),
        }
    }

    /// Switches to a project-local copy of the current values.
    pub fn make_local(&mut self) -> Result<(), ConfigError> {
        self.location = SettingsLocation::Project;
        self.save()?;
        info!("settings made project-local");
        Ok(())
    }

    /// Deletes the project-local copy and falls back to the global values.
    pub fn remove_local(&mut self) -> Result<(), ConfigError> {
        self.project.remove(SETTINGS_KEY)?;
        info!("project-local settings removed");
        self.reload()
    }
}
