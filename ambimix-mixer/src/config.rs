//! Runtime configuration for the mixer daemon
//!
//! Merges command-line overrides over the bootstrap TOML file.

use crate::error::Result;
use ambimix_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use ambimix_common::Catalog;
use std::path::{Path, PathBuf};
use tracing::info;

/// Values supplied on the command line (or their env equivalents)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub audio_folder: Option<PathBuf>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Folder holding the persisted preset document
    pub root_folder: PathBuf,
    pub port: u16,
    pub audio_folder: Option<PathBuf>,
    pub verify_files: bool,
    pub initial_master_volume: u8,
    pub catalog: Catalog,
    /// Default tracing filter level when `RUST_LOG` is unset
    pub log_level: String,
}

impl MixerConfig {
    /// Resolve configuration from an already parsed TOML config
    ///
    /// Loads and validates the catalog file if one is configured.
    pub fn resolve(toml: TomlConfig, overrides: Overrides) -> Result<Self> {
        let root_folder =
            resolve_root_folder(overrides.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml);

        let catalog = match &toml.catalog {
            Some(path) => {
                info!("Loading catalog from {}", path.display());
                Catalog::load(path)?
            }
            None => Catalog::builtin(),
        };

        Ok(Self {
            root_folder,
            port: overrides.port.unwrap_or(toml.port),
            audio_folder: overrides.audio_folder.or(toml.audio_folder),
            verify_files: toml.verify_files,
            initial_master_volume: toml.initial_master_volume,
            catalog,
            log_level: toml.logging.level,
        })
    }

    /// Load the TOML file (explicit path or platform default) and resolve
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let toml = TomlConfig::load_or_default(config_file)?;
        Self::resolve(toml, overrides)
    }

    /// Tracing filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> String {
        format!("ambimix_mixer={},tower_http={}", self.log_level, self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_priority() {
        let toml = TomlConfig::from_toml(
            r#"
            port = 6000
            audio_folder = "/srv/sounds"
            "#,
        )
        .unwrap();
        let overrides = Overrides {
            root_folder: Some(PathBuf::from("/tmp/ambimix")),
            port: Some(7000),
            audio_folder: None,
        };

        let config = MixerConfig::resolve(toml, overrides).unwrap();
        assert_eq!(config.root_folder, PathBuf::from("/tmp/ambimix"));
        assert_eq!(config.port, 7000);
        assert_eq!(config.audio_folder, Some(PathBuf::from("/srv/sounds")));
        assert_eq!(config.initial_master_volume, 100);
        assert_eq!(config.catalog.tracks.len(), Catalog::builtin().tracks.len());
    }

    #[test]
    fn test_missing_catalog_file_is_an_error() {
        let toml = TomlConfig::from_toml(r#"catalog = "/nonexistent/catalog.toml""#).unwrap();
        let overrides = Overrides {
            root_folder: Some(PathBuf::from("/tmp")),
            ..Default::default()
        };
        assert!(MixerConfig::resolve(toml, overrides).is_err());
    }

    #[test]
    fn test_default_log_filter() {
        let toml = TomlConfig::from_toml("[logging]\nlevel = \"debug\"").unwrap();
        let overrides = Overrides {
            root_folder: Some(PathBuf::from("/tmp")),
            ..Default::default()
        };
        let config = MixerConfig::resolve(toml, overrides).unwrap();
        assert_eq!(
            config.default_log_filter(),
            "ambimix_mixer=debug,tower_http=debug"
        );
    }
}
