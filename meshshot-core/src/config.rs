//! Configuration file loading

use crate::settings::Settings;
use crate::{Error, Result};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Load settings from a YAML document.
///
/// A missing file (or no path at all) yields the defaults. Only a document
/// that exists but cannot be parsed, or whose root is not a mapping, is an
/// error.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    if !path.exists() {
        log::info!("No configuration at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    if path.is_dir() {
        return Err(Error::Parse(format!("{}: is a directory", path.display())));
    }
    let text = String::from_utf8(fs::read(path)?)
        .map_err(|e| Error::Parse(format!("{}: not UTF-8 text: {}", path.display(), e)))?;
    let mut settings = Settings::from_yaml_str(&text)
        .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
    settings.config_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf);

    log::info!("Loaded configuration from {}", path.display());
    Ok(settings)
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Settings::default());
        }

        match serde_yaml::from_str::<Value>(text)? {
            Value::Null => Ok(Settings::default()),
            Value::Mapping(root) => Ok(Settings::from_mapping(&root)),
            _ => Err(Error::Parse("Configuration root must be a mapping".to_string())),
        }
    }
}
