//! Configuration structures for the composer.
//!
//! - [`ComposerConfig`]: the root configuration object.
//! - [`LoggingConfig`]: settings for the logging subsystem.
//! - [`BufferCacheConfig`]: slot cache and importer sizing.
//! - [`WritebackConfig`]: capture worker settings.
//! - [`ClientConfig`]: client lifecycle settings.
//!
//! All structs reject unknown fields during deserialization via
//! `#[serde(deny_unknown_fields)]` and fill missing values from
//! [`super::defaults`].

use super::defaults;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration settings for the logging subsystem.
///
/// # Examples
///
/// ```
/// use novade_core::config::LoggingConfig;
/// use std::path::PathBuf;
///
/// let default_log_config = LoggingConfig::default();
/// assert_eq!(default_log_config.level, "info");
/// assert_eq!(default_log_config.file_path, None);
/// assert_eq!(default_log_config.format, "text");
///
/// let toml_str = r#"
/// level = "debug"
/// file_path = "/var/log/novade/composer.log"
/// format = "json"
/// "#;
/// let log_config: LoggingConfig = toml::from_str(toml_str).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.file_path, Some(PathBuf::from("/var/log/novade/composer.log")));
/// assert_eq!(log_config.format, "json");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// The minimum log level to record.
    /// Valid values (case-insensitive): "trace", "debug", "info", "warn", "error".
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional path to a file where logs should be written.
    /// If `None`, file logging is disabled.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// Valid values (case-insensitive): "text", "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Sizing of buffer slot caches and the handle importer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferCacheConfig {
    /// Client target slots given to a physical display when it is connected.
    #[serde(default = "defaults::default_initial_client_target_slot_count")]
    pub initial_client_target_slot_count: u32,
    /// Upper bound on simultaneously imported buffers. Must be non-zero.
    #[serde(default = "defaults::default_max_imported_buffers")]
    pub max_imported_buffers: usize,
}

impl Default for BufferCacheConfig {
    fn default() -> Self {
        defaults::default_buffer_cache_config()
    }
}

/// Settings for the per-display capture (writeback) workers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WritebackConfig {
    /// Worker threads are named `<prefix>-<display>`. Must not be empty.
    #[serde(default = "defaults::default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

impl Default for WritebackConfig {
    fn default() -> Self {
        defaults::default_writeback_config()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// How long `create_client` waits for a previous client to be dropped.
    #[serde(default = "defaults::default_handover_timeout_ms")]
    pub handover_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        defaults::default_client_config()
    }
}

/// Root configuration of the composer.
///
/// # Examples
///
/// ```
/// use novade_core::config::ComposerConfig;
///
/// let config = ComposerConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert_eq!(config.buffer_cache.max_imported_buffers, 4096);
/// assert_eq!(config.writeback.thread_name_prefix, "novade-cwb");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposerConfig {
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    #[serde(default = "defaults::default_buffer_cache_config")]
    pub buffer_cache: BufferCacheConfig,
    #[serde(default = "defaults::default_writeback_config")]
    pub writeback: WritebackConfig,
    #[serde(default = "defaults::default_client_config")]
    pub client: ClientConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            buffer_cache: BufferCacheConfig::default(),
            writeback: WritebackConfig::default(),
            client: ClientConfig::default(),
        }
    }
}
