//! Settings parser for .vibecast/config.toml

use std::path::Path;

use super::types::Settings;
use vibecast_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const VIBECAST_DIR: &str = ".vibecast";

/// Load settings from .vibecast/config.toml
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = project_path.join(VIBECAST_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Save settings to .vibecast/config.toml
///
/// Writes a temp file and renames it over the old one.
pub fn save_settings(project_path: &Path, settings: &Settings) -> Result<()> {
    let vibecast_dir = project_path.join(VIBECAST_DIR);

    if !vibecast_dir.exists() {
        std::fs::create_dir_all(&vibecast_dir)
            .map_err(|e| Error::config(format!("Failed to create .vibecast dir: {}", e)))?;
    }

    let config_path = vibecast_dir.join(CONFIG_FILENAME);
    let temp_path = vibecast_dir.join(".config.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# VibeCast Configuration\n\n{}", content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}
