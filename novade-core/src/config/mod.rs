//! Configuration management for the composer.
//!
//! - [`types`]: the configuration schema ([`ComposerConfig`] and its sections).
//! - [`defaults`]: default values used when the file or a field is missing.
//! - [`loader`]: [`ConfigLoader`], which reads TOML and validates it.
//!
//! # Examples
//!
//! ```rust
//! use novade_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::load_from_str("[logging]\nlevel = \"WARN\"\n").unwrap();
//! assert_eq!(config.logging.level, "warn");
//! ```

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{BufferCacheConfig, ClientConfig, ComposerConfig, LoggingConfig, WritebackConfig};
