use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const LOG_FILENAME: &str = "pagelens.log";
const APP_NAME: &str = "pagelens";

const SETTINGS_HEADER: &str = "\
# pagelens configuration
#
# service_url: base URL of a remote document service; when unset, payloads
#              are read from documents_dir as <key>.json files
# request_timeout_secs: how long to wait for the service before giving up
";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_render_cache_size")]
    pub render_cache_size: usize,

    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_documents_dir() -> PathBuf {
    dirs::data_dir()
        .map(|data| data.join(APP_NAME).join("documents"))
        .unwrap_or_else(|| PathBuf::from("documents"))
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_render_cache_size() -> usize {
    16
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_notification_secs() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            service_url: None,
            documents_dir: default_documents_dir(),
            request_timeout_secs: default_request_timeout_secs(),
            render_cache_size: default_render_cache_size(),
            export_dir: default_export_dir(),
            log_level: default_log_level(),
            notification_secs: default_notification_secs(),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    #[must_use]
    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Default log file, under the user's state (or local data) directory.
///
/// Falls back to the working directory when neither is known.
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join(APP_NAME).join(LOG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(LOG_FILENAME))
}

/// Load settings from the user config directory, writing defaults if absent
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Replace the global settings with the contents of `path`.
///
/// Older versions are migrated and written back. On failure the current
/// settings are kept.
pub fn load_settings_from_path(path: &Path) {
    match read_settings_file(path) {
        Ok(settings) => {
            debug!("Loaded settings from {path:?}");
            if let Ok(mut global) = SETTINGS.write() {
                *global = settings;
            }
        }
        Err(e) => error!("{e}"),
    }
}

/// Parse a settings file, migrating it in place when outdated
pub fn read_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut settings: Settings =
        serde_yaml::from_str(&content).map_err(|source| SettingsError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
        save_settings_to_file(&settings, path);
    }

    Ok(settings)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let body = match serde_yaml::to_string(settings) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, format!("{SETTINGS_HEADER}\n{body}")) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

// Public API for accessing/modifying settings

#[must_use]
pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Apply an in-memory change, e.g. command line overrides. Not persisted.
pub fn update_settings(change: impl FnOnce(&mut Settings)) {
    if let Ok(mut settings) = SETTINGS.write() {
        change(&mut settings);
    }
}
