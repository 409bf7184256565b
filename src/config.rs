// Configuration management
//
// Host settings read from `retro-host.toml` in the working directory. The
// file is optional and never written: a missing file means defaults, a
// broken one is reported and also means defaults.

use crate::input::InputConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default configuration file path
pub const CONFIG_FILE: &str = "retro-host.toml";

/// Host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Video settings
    pub video: VideoConfig,

    /// Audio settings
    pub audio: AudioSettings,

    /// Input settings
    pub input: InputConfig,

    /// Directories answered to the core
    pub paths: PathsConfig,

    /// `env_logger` filter, overrides `RUST_LOG` when set
    pub log_filter: Option<String>,
}

/// Video configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Window scale applied to the aspect-corrected base geometry (1-8)
    pub scale: u32,

    /// Enable VSync
    pub vsync: bool,

    /// Start in borderless fullscreen
    pub fullscreen: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scale: 3,
            vsync: true,
            fullscreen: false,
        }
    }
}

impl VideoConfig {
    /// Scale clamped to the supported range
    pub fn scale(&self) -> u32 {
        self.scale.clamp(1, 8)
    }
}

/// Audio configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Enable audio
    pub enabled: bool,

    /// Sample queue length in milliseconds
    pub buffer_ms: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_ms: 100,
        }
    }
}

/// Directories the core may ask for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// BIOS and system files
    pub system_directory: PathBuf,

    /// Save data
    pub save_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            system_directory: PathBuf::from("."),
            save_directory: PathBuf::from("."),
        }
    }
}

impl HostConfig {
    /// Load configuration from `path`, or defaults
    ///
    /// A missing file is normal. An unreadable or invalid one is logged.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retro_host::config::{HostConfig, CONFIG_FILE};
    ///
    /// let config = HostConfig::load_or_default(CONFIG_FILE);
    /// ```
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.as_ref().display());
                config
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(
                    "Could not load {} ({}), using defaults",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Returns
    ///
    /// Result containing the configuration or an error
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self, io::Error> {
        toml::from_str(contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
