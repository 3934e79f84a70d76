//! Configuration loading and root folder resolution
//!
//! Missing or unreadable configuration never stops a service: every key has a
//! compiled default and problems are reported as warnings.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TILAWA_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "tilawa.db";

/// Default content API base URL
pub const DEFAULT_CONTENT_API_URL: &str = "https://api.quran.com/api/v4";

/// Default translation resource (Saheeh International)
pub const DEFAULT_TRANSLATION_ID: i64 = 20;

/// Default HTTP port for the bookmark service
pub const DEFAULT_PORT: u16 = 5830;

/// Contents of `tilawa.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub log_level: Option<String>,
    pub port: Option<u16>,
    pub content_api_url: Option<String>,
    pub translation_id: Option<i64>,
    /// Translation text used when a fetched verse carries no translation
    pub fallback_translation: Option<String>,
}

impl TomlConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from `path`.
    ///
    /// A missing or invalid file logs a warning and yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!(
                    "Config file {} not readable ({}), using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn content_api_url(&self) -> &str {
        self.content_api_url
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_API_URL)
    }

    pub fn translation_id(&self) -> i64 {
        self.translation_id.unwrap_or(DEFAULT_TRANSLATION_ID)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
        }
    }
}

/// Default location of `tilawa.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tilawa").join("tilawa.toml"))
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `TILAWA_ROOT_FOLDER` environment variable
/// 3. `root_folder` in the TOML config
/// 4. OS-dependent compiled default
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, toml: &TomlConfig) -> Self {
        self.toml = Some(toml.clone());
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("[{}] Root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.toml.as_ref().and_then(|t| t.root_folder.clone()) {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/tilawa
        dirs::data_local_dir()
            .map(|d| d.join("tilawa"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/tilawa"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("tilawa"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/tilawa"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("tilawa"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\tilawa"))
    } else {
        PathBuf::from("./tilawa_data")
    }
}
