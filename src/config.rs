use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Template location relative to the executable's directory
pub const DEFAULT_TEMPLATE: &str = "template/HTD_TEMPLATE_V1.2.xlsx";

/// Persistent settings for htd2xlsx
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Excel template every output workbook starts from
    pub template: PathBuf,
    /// Put each workbook and its images into a folder named after the document
    pub create_folder: bool,
    /// Copy the Word file into that folder as well
    pub copy_word_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            template: default_template(),
            create_folder: false,
            copy_word_file: false,
        }
    }
}

impl Settings {
    /// Load settings from the config directory
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                let content = fs::read_to_string(&config_path)
                    .with_context(|| format!("reading {}", config_path.display()))?;
                let settings: Settings = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", config_path.display()))?;
                return Ok(settings);
            }
        }

        // Return defaults if no config found
        Ok(Settings::default())
    }

    /// Save settings to the config directory, returning the file written
    pub fn save(&self) -> Result<Option<PathBuf>> {
        let Some(config_path) = Self::get_config_path() else {
            return Ok(None);
        };
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(Some(config_path))
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("htd2xlsx").join("config.toml"))
    }

    /// Write a config file holding the defaults
    pub fn init_default() -> Result<Option<PathBuf>> {
        Settings::default().save()
    }
}

/// The bundled template next to the executable, or relative to the working
/// directory when the executable path is unknown
pub fn default_template() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_TEMPLATE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE))
}
