//! Default configuration values for the composer.
//!
//! These functions are used by `serde`'s `default` attribute in the configuration
//! structures to provide values when they are not specified in the configuration
//! file.

use crate::config::{BufferCacheConfig, ClientConfig, LoggingConfig, WritebackConfig};
use std::path::PathBuf;

/// Location read by [`crate::config::ConfigLoader::load`] when no override is set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/novade/composer.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "NOVADE_COMPOSER_CONFIG";

/// Returns the default `LoggingConfig`.
///
/// Used by `ComposerConfig` if the `logging` section is missing.
pub(super) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

/// Returns the default log level string (`"info"`).
pub(super) fn default_log_level() -> String {
    "info".to_string()
}

/// Returns the default log file path (`None`, file logging disabled).
pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}

/// Returns the default log format string (`"text"`).
pub(super) fn default_log_format() -> String {
    "text".to_string()
}

pub(super) fn default_buffer_cache_config() -> BufferCacheConfig {
    BufferCacheConfig {
        initial_client_target_slot_count: default_initial_client_target_slot_count(),
        max_imported_buffers: default_max_imported_buffers(),
    }
}

/// Physical displays start without client target slots; clients size them.
pub(super) fn default_initial_client_target_slot_count() -> u32 {
    0
}

pub(super) fn default_max_imported_buffers() -> usize {
    4096
}

pub(super) fn default_writeback_config() -> WritebackConfig {
    WritebackConfig {
        thread_name_prefix: default_thread_name_prefix(),
    }
}

pub(super) fn default_thread_name_prefix() -> String {
    "novade-cwb".to_string()
}

pub(super) fn default_client_config() -> ClientConfig {
    ClientConfig {
        handover_timeout_ms: default_handover_timeout_ms(),
    }
}

/// Returns how long a new client waits for the previous one to go away (1 s).
pub(super) fn default_handover_timeout_ms() -> u64 {
    1000
}
