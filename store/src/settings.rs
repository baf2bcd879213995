use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sweeper_core::{CellCount, Coord, GameConfig};
use thiserror::Error;

use crate::ServiceError;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not read settings: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Preset {name:?} is not a valid board")]
    InvalidPreset { name: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub limits: Limits,
    pub presets: BTreeMap<String, Preset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            limits: Limits::default(),
            presets: default_presets(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn preset(&self, name: &str) -> Option<GameConfig> {
        self.presets.get(name).and_then(|preset| preset.config().ok())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (name, preset) in &self.presets {
            if preset.config().is_err() {
                return Err(SettingsError::InvalidPreset { name: name.clone() });
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Records,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: Backend,
    /// Directory for record rows; records stay in memory when unset.
    pub data_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_width: Coord,
    pub max_height: Coord,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_width: Coord::MAX,
            max_height: Coord::MAX,
        }
    }
}

impl Limits {
    pub fn check(&self, config: &GameConfig) -> Result<(), ServiceError> {
        let (width, height) = config.size;
        if width > self.max_width || height > self.max_height {
            Err(ServiceError::TooLarge {
                width,
                height,
                max_width: self.max_width,
                max_height: self.max_height,
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl Preset {
    pub const fn new(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    pub fn config(&self) -> sweeper_core::Result<GameConfig> {
        GameConfig::new((self.width, self.height), self.mines)
    }
}

fn default_presets() -> BTreeMap<String, Preset> {
    BTreeMap::from([
        ("beginner".to_owned(), Preset::new(9, 9, 10)),
        ("intermediate".to_owned(), Preset::new(16, 16, 40)),
        ("expert".to_owned(), Preset::new(30, 16, 99)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();

        assert_eq!(settings.store.backend, Backend::Memory);
        assert_eq!(settings.limits, Limits::default());
        assert_eq!(
            settings.preset("expert"),
            Some(GameConfig::new_unchecked((30, 16), 99))
        );
    }

    #[test]
    fn parses_every_section() {
        let settings = Settings::from_toml_str(
            r#"
            [store]
            backend = "records"
            data_dir = "games"

            [limits]
            max_width = 50

            [presets]
            tiny = { width = 3, height = 3, mines = 1 }
            "#,
        )
        .unwrap();

        assert_eq!(settings.store.backend, Backend::Records);
        assert_eq!(settings.store.data_dir, Some(PathBuf::from("games")));
        assert_eq!(settings.limits.max_width, 50);
        assert_eq!(settings.limits.max_height, Coord::MAX);
        assert_eq!(settings.preset("beginner"), None);
        assert_eq!(
            settings.preset("tiny"),
            Some(GameConfig::new_unchecked((3, 3), 1))
        );
    }

    #[test]
    fn rejects_impossible_presets() {
        let result = Settings::from_toml_str(
            r#"
            [presets]
            broken = { width = 2, height = 2, mines = 5 }
            "#,
        );
        assert!(matches!(
            result,
            Err(SettingsError::InvalidPreset { name }) if name == "broken"
        ));
    }

    #[test]
    fn limits_reject_large_boards() {
        let limits = Limits {
            max_width: 10,
            max_height: 10,
        };
        assert!(limits.check(&GameConfig::new_unchecked((10, 10), 5)).is_ok());
        assert!(matches!(
            limits.check(&GameConfig::new_unchecked((11, 10), 5)),
            Err(ServiceError::TooLarge { width: 11, .. })
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
