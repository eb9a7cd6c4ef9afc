//! # NovaDE Core Library (`novade-core`)
//!
//! Ambient services shared by the display composer crates:
//!
//! - **Error Handling**: [`CoreError`] and its specific error types
//!   [`ConfigError`] and [`LoggingError`].
//! - **Configuration Management**: TOML loading and validation through
//!   [`ConfigLoader`] into a [`ComposerConfig`].
//! - **Logging**: `tracing` based console and file logging.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use novade_core::config::ConfigLoader;
//! use novade_core::logging::init_logging;
//! use novade_core::error::CoreError;
//!
//! fn main() -> Result<(), CoreError> {
//!     let config = ConfigLoader::load()?;
//!     init_logging(&config.logging, false)?;
//!     tracing::info!("Composer configuration loaded.");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ComposerConfig, ConfigLoader, LoggingConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
