//! Configuration loading for the composer.
//!
//! [`ConfigLoader`] locates the configuration file, deserializes it from TOML,
//! applies defaults and validates the result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use novade_core::config::ConfigLoader;
//!
//! match ConfigLoader::load() {
//!     Ok(config) => println!("Logging level: {}", config.logging.level),
//!     Err(e) => {
//!         novade_core::logging::init_minimal_logging();
//!         tracing::error!("Configuration loading failed: {}", e);
//!     }
//! }
//! ```
//!
//! ## Configuration File Location
//!
//! `ConfigLoader::load()` reads the file named by the `NOVADE_COMPOSER_CONFIG`
//! environment variable, falling back to `/etc/novade/composer.toml`. A missing
//! file is not an error: the defaults are used instead.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::defaults::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crate::config::ComposerConfig;
use crate::error::{ConfigError, CoreError};

/// `ConfigLoader` provides static methods to load and validate `ComposerConfig`.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates the configuration from the standard location.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ReadError`] if the file exists but cannot be read.
    /// - [`ConfigError::ParseError`] if it is not valid TOML for the schema.
    /// - [`ConfigError::ValidationError`] if a value is out of range.
    pub fn load() -> Result<ComposerConfig, CoreError> {
        let path = Self::config_path();
        match fs::read_to_string(&path) {
            Ok(content) => Self::load_from_str(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No composer configuration file, using defaults");
                let mut config = ComposerConfig::default();
                Self::validate_config(&mut config)?;
                Ok(config)
            }
            Err(e) => Err(CoreError::Config(ConfigError::ReadError { path, source: e })),
        }
    }

    /// Loads and validates the configuration from an explicit file.
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is reported as
    /// [`ConfigError::NotFound`].
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<ComposerConfig, CoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConfigError::NotFound {
                    locations: vec![path.to_path_buf()],
                }
            } else {
                ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::load_from_str(&content)
    }

    /// Parses and validates configuration text. Blank input yields the defaults.
    pub fn load_from_str(content: &str) -> Result<ComposerConfig, CoreError> {
        let mut config: ComposerConfig = if content.trim().is_empty() {
            ComposerConfig::default()
        } else {
            toml::from_str(content).map_err(ConfigError::ParseError)?
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    fn config_path() -> PathBuf {
        env::var_os(CONFIG_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Normalizes level and format to lower case and checks value domains.
    fn validate_config(config: &mut ComposerConfig) -> Result<(), CoreError> {
        let level_lower = config.logging.level.to_lowercase();
        match level_lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {
                config.logging.level = level_lower;
            }
            _ => {
                return Err(CoreError::Config(ConfigError::ValidationError(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                ))));
            }
        }

        let format_lower = config.logging.format.to_lowercase();
        match format_lower.as_str() {
            "text" | "json" => {
                config.logging.format = format_lower;
            }
            _ => {
                return Err(CoreError::Config(ConfigError::ValidationError(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                ))));
            }
        }

        if config.buffer_cache.max_imported_buffers == 0 {
            return Err(CoreError::Config(ConfigError::ValidationError(
                "buffer_cache.max_imported_buffers must be greater than zero".to_string(),
            )));
        }

        if config.writeback.thread_name_prefix.trim().is_empty() {
            return Err(CoreError::Config(ConfigError::ValidationError(
                "writeback.thread_name_prefix must not be empty".to_string(),
            )));
        }

        Ok(())
    }
}
