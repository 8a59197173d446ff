//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file; everything else about
//! the mixer (presets, volumes) lives in the root folder at runtime.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "AMBIMIX_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Folder holding persisted presets (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Folder holding the audio resources named in the catalog
    #[serde(default)]
    pub audio_folder: Option<PathBuf>,

    /// Reject tracks whose audio file is missing from `audio_folder`
    #[serde(default)]
    pub verify_files: bool,

    /// Master volume on startup (0-100)
    #[serde(default = "default_master_volume")]
    pub initial_master_volume: u8,

    /// Catalog file replacing the built-in track and preset table
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    5760
}

fn default_master_volume() -> u8 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            audio_folder: None,
            verify_files: false,
            initial_master_volume: default_master_volume(),
            catalog: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        if config.initial_master_volume > 100 {
            return Err(Error::Config(format!(
                "initial_master_volume must be 0-100, got {}",
                config.initial_master_volume
            )));
        }
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load the explicit file if given, else the platform config file,
    /// else fall back to defaults
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        match find_config_file() {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => {
                warn!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config value
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Locate the platform configuration file, if any exists
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ambimix").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/ambimix/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/ambimix
        dirs::data_local_dir()
            .map(|d| d.join("ambimix"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/ambimix"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/ambimix
        dirs::data_dir()
            .map(|d| d.join("ambimix"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/ambimix"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\ambimix
        dirs::data_local_dir()
            .map(|d| d.join("ambimix"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\ambimix"))
    } else {
        PathBuf::from("./ambimix_data")
    }
}
