//! Data directory layout and settings persistence.
//!
//! Everything lives under one directory, `~/.focus-timer` by default or
//! `$FOCUS_TIMER_HOME` when set:
//!
//! - `focus-timer.sock`: daemon IPC socket
//! - `settings.json`: timer settings
//! - `sessions.jsonl`: completed session history

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::types::Settings;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "FOCUS_TIMER_HOME";

const DEFAULT_DIR_NAME: &str = ".focus-timer";
const SOCKET_FILE: &str = "focus-timer.sock";
const SETTINGS_FILE: &str = "settings.json";
const SESSIONS_FILE: &str = "sessions.jsonl";

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    data_dir: PathBuf,
}

impl Paths {
    /// Resolves the data directory from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the home directory is unknown.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::new(home.join(DEFAULT_DIR_NAME)))
    }

    /// Uses `data_dir` as the data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir.join(SOCKET_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_FILE)
    }
}

/// Loads settings from `path`, falling back to defaults when the file is absent.
///
/// Missing fields take their default values. Stored values are not
/// validated here; the engine clamps them on use.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read settings: {}", path.display()))
        }
    };

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings: {}", path.display()))
}

/// Writes settings to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write settings: {}", path.display()))?;

    debug!(path = %path.display(), "settings saved");
    Ok(())
}
