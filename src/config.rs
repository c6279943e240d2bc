// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Read once at startup from `<config dir>/camera-session/config.json`.
//! A missing file gives the defaults; a file that cannot be parsed is
//! reported and replaced by the defaults as well.

use crate::constants::{self, recorder, storage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Recorder encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Target bitrate in bits per second
    pub bitrate_bps: u32,
    /// Frames per second
    pub frame_rate: u32,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            bitrate_bps: recorder::DEFAULT_BITRATE_BPS,
            frame_rate: recorder::DEFAULT_FRAME_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recorder bitrate and frame rate
    pub recorder: RecorderSettings,
    /// Folder created under the picture and video directories
    pub media_folder_name: String,
    /// Override for where stills are saved (the folder name is not appended)
    pub picture_dir: Option<PathBuf>,
    /// Override for where recordings are saved (the folder name is not appended)
    pub video_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recorder: RecorderSettings::default(),
            media_folder_name: storage::MEDIA_FOLDER_NAME.to_string(),
            picture_dir: None,
            video_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::CONFIG_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Load the config from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory on this platform, using defaults");
                Self::default()
            }
        }
    }

    /// Load the config from `path`, falling back to the defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config.sanitized()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Replace values the recorder cannot use with defaults
    fn sanitized(mut self) -> Self {
        let defaults = RecorderSettings::default();
        if self.recorder.bitrate_bps == 0 {
            warn!("Recorder bitrate of 0 in config, using default");
            self.recorder.bitrate_bps = defaults.bitrate_bps;
        }
        if self.recorder.frame_rate == 0 {
            warn!("Recorder frame rate of 0 in config, using default");
            self.recorder.frame_rate = defaults.frame_rate;
        }
        if self.media_folder_name.trim().is_empty() {
            self.media_folder_name = storage::MEDIA_FOLDER_NAME.to_string();
        }
        self
    }

    /// Directory stills are written to
    pub fn picture_dir(&self) -> PathBuf {
        self.picture_dir.clone().unwrap_or_else(|| {
            base_dir(dirs::picture_dir()).join(&self.media_folder_name)
        })
    }

    /// Directory recordings are written to
    pub fn video_dir(&self) -> PathBuf {
        self.video_dir
            .clone()
            .unwrap_or_else(|| base_dir(dirs::video_dir()).join(&self.media_folder_name))
    }
}

fn base_dir(preferred: Option<PathBuf>) -> PathBuf {
    preferred.unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
}
