use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use facetag_core::shared::constants::{DEFAULT_MATCH_TOLERANCE, DEFAULT_WORKER_COUNT};

/// Directory layout and tuning shared by every subcommand.
///
/// Missing fields take their default, so older settings files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub known_people_directory: PathBuf,
    pub identity_store: PathBuf,
    pub workers: usize,
    pub tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("videos"),
            output_directory: PathBuf::from("output_videos"),
            known_people_directory: PathBuf::from("known_people"),
            identity_store: PathBuf::from("face_encodings.json"),
            workers: DEFAULT_WORKER_COUNT,
            tolerance: DEFAULT_MATCH_TOLERANCE,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facetag").join("settings.json"))
    }

    /// Loads settings from `explicit`, or from the per-user config file.
    ///
    /// When the per-user file does not exist yet it is created with the
    /// defaults so there is something to edit.
    pub fn load(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(&path);
            return settings;
        }
        Self::load_from(&path)
    }

    /// Reads `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Cannot read settings {}: {e}, using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Invalid settings {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Cannot create settings directory {}: {e}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    log::warn!("Cannot write settings {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Cannot serialise settings: {e}"),
        }
    }
}
