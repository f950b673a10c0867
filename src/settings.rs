//! Persisted user settings
//!
//! Stored as TOML in the user's config directory:
//! - Linux: ~/.config/Clipboard2Image/settings.toml
//! - macOS: ~/Library/Application Support/Clipboard2Image/settings.toml
//! - Windows: %APPDATA%\Clipboard2Image\settings.toml
//!
//! A file that can't be parsed is thrown away and rewritten with defaults.

use iced::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const APP_DIR: &str = "Clipboard2Image";
const FILE_NAME: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no config directory on this system")]
    NoConfigDir,
    #[error("settings I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Theme choice as written to disk
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ThemeSetting {
    /// Stable identifier, e.g. "tokyo_night"
    pub id: String,
    /// Display name, e.g. "Tokyo Night"
    pub name: String,
}

impl ThemeSetting {
    pub fn from_theme(theme: &Theme) -> Self {
        let name = theme.to_string();
        Self {
            id: slug(&name),
            name,
        }
    }

    /// The matching built-in theme, if the name (or id) is still known
    pub fn to_theme(&self) -> Option<Theme> {
        find_theme(&self.name).or_else(|| find_theme(&self.id))
    }
}

impl Default for ThemeSetting {
    fn default() -> Self {
        Self::from_theme(&Theme::Light)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub theme: ThemeSetting,
}

impl Settings {
    /// Where settings live on this machine
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let mut path = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        path.push(APP_DIR);
        path.push(FILE_NAME);
        Ok(path)
    }

    /// Read settings from `path`, creating the file with defaults if it is
    /// missing and replacing it with defaults if it is corrupt
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save(path)?;
            tracing::info!(path = %path.display(), "created default settings");
            return Ok(settings);
        }

        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match Self::from_toml(&text) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable settings");
                let settings = Settings::default();
                settings.save(path)?;
                Ok(settings)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// The iced theme to use, falling back to Light for unknown names
    pub fn theme(&self) -> Theme {
        self.theme.to_theme().unwrap_or(Theme::Light)
    }
}

/// Look up a built-in theme by a loose name: case, dashes and underscores
/// don't matter ("tokyo-night", "Tokyo_Night" and "tokyo night" all match)
pub fn find_theme(query: &str) -> Option<Theme> {
    let wanted = normalize(query);
    Theme::ALL
        .iter()
        .find(|theme| normalize(&theme.to_string()) == wanted)
        .cloned()
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn slug(name: &str) -> String {
    normalize(name).replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_is_light() {
        let settings = Settings::default();
        assert_eq!(settings.theme.id, "light");
        assert_eq!(settings.theme.name, "Light");
        assert_eq!(settings.theme(), Theme::Light);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings {
            theme: ThemeSetting::from_theme(&Theme::TokyoNight),
        };
        let text = settings.to_toml().unwrap();
        assert!(text.contains("[theme]"));
        assert!(text.contains("id = \"tokyo_night\""));
        assert_eq!(Settings::from_toml(&text).unwrap(), settings);
    }

    #[test]
    fn test_find_theme_is_forgiving() {
        assert_eq!(find_theme("tokyo-night"), Some(Theme::TokyoNight));
        assert_eq!(find_theme("Tokyo_Night"), Some(Theme::TokyoNight));
        assert_eq!(find_theme("  DARK "), Some(Theme::Dark));
        assert_eq!(find_theme("no such theme"), None);
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let settings = Settings {
            theme: ThemeSetting {
                id: "light_blue".into(),
                name: "Light Blue".into(),
            },
        };
        assert_eq!(settings.theme(), Theme::Light);
    }

    #[test]
    fn test_missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let settings = Settings {
            theme: ThemeSetting::from_theme(&Theme::Dracula),
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load_or_create(&path).unwrap(), settings);
    }

    #[test]
    fn test_corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "theme = [[[ not toml").unwrap();

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings, Settings::default());

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Settings::from_toml(&rewritten).unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_keys_count_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[theme]\nname = \"Dark\"\n").unwrap();

        assert_eq!(Settings::load_or_create(&path).unwrap(), Settings::default());
    }
}
