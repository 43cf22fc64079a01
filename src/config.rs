//! Configuration for termfiles.
//!
//! The configuration file is located at `~/.termfiles/config.toml`:
//!
//! ```toml
//! # Log level for ~/.termfiles/termfiles.log (error, warn, info, debug, trace)
//! log_level = "info"
//!
//! [kvp]
//! separator = "="
//! comment_prefixes = ["#"]
//! strip_quotes = true
//!
//! [macros]
//! # "strict": one bad key fails the whole file
//! # "skip":   bad keys are logged and skipped
//! key_policy = "strict"
//! name_template = "Macro {}"
//! ```
//!
//! Missing fields take their defaults. A missing or unreadable file means
//! the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kvp::Grammar;
use crate::macros::{KeyPolicy, MacroNaming};
use crate::open::FileOpener;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config path")]
    NoPath,

    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config: {0}")]
    Write(#[source] std::io::Error),
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level for the log file
    pub log_level: String,
    /// Key-value file grammar
    pub kvp: KvpConfig,
    /// Macro file handling
    pub macros: MacrosConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            kvp: KvpConfig::default(),
            macros: MacrosConfig::default(),
        }
    }
}

/// Key-value grammar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvpConfig {
    pub separator: char,
    pub comment_prefixes: Vec<String>,
    pub strip_quotes: bool,
}

impl Default for KvpConfig {
    fn default() -> Self {
        let grammar = Grammar::default();
        Self {
            separator: grammar.separator,
            comment_prefixes: grammar.comment_prefixes,
            strip_quotes: grammar.strip_quotes,
        }
    }
}

/// Macro settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacrosConfig {
    pub key_policy: KeyPolicy,
    pub name_template: String,
}

impl Default for MacrosConfig {
    fn default() -> Self {
        Self {
            key_policy: KeyPolicy::Strict,
            name_template: MacroNaming::default().to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(config) = Self::load_from(&path) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoPath)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Get config file path
    pub fn get_config_path() -> Option<PathBuf> {
        app_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn grammar(&self) -> Grammar {
        Grammar {
            separator: self.kvp.separator,
            comment_prefixes: self.kvp.comment_prefixes.clone(),
            strip_quotes: self.kvp.strip_quotes,
        }
    }

    /// File opener configured from this config
    pub fn opener(&self) -> FileOpener {
        FileOpener::new(
            self.grammar(),
            self.macros.key_policy,
            MacroNaming::new(self.macros.name_template.clone()),
        )
    }
}

/// `~/.termfiles`, created on first use
pub fn app_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".termfiles");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
