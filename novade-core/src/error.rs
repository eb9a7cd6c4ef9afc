//! Error handling for the NovaDE core layer.
//!
//! The main error type for this crate is [`CoreError`], which wraps the more
//! specific [`ConfigError`] and [`LoggingError`]. All of them are defined with
//! `thiserror` so callers can match on variants and still get readable
//! `Display` output.
//!
//! # Examples
//!
//! ```rust
//! use novade_core::error::{ConfigError, CoreError};
//!
//! fn check_prefix(prefix: &str) -> Result<(), CoreError> {
//!     if prefix.is_empty() {
//!         return Err(ConfigError::ValidationError("empty prefix".to_string()).into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_prefix("").is_err());
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type shared by the composer crates for ambient concerns.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while setting up the `tracing` subscriber.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Filesystem errors that are not covered by a more specific variant.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// General I/O errors.
    #[error("I/O Error: {0}")]
    Io(#[from] io::Error),

    /// Invalid input provided to a function or method.
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    /// Catch-all for unexpected internal errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Error type for configuration-related operations.
///
/// Typically wrapped by [`CoreError::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed for a reason other than absence.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Parsing succeeded but a value is out of its allowed domain.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found at expected locations: {locations:?}")]
    NotFound { locations: Vec<PathBuf> },
}

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The global subscriber could not be installed or the configuration was invalid.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    /// A filter directive could not be parsed.
    #[error("Failed to set log filter: {0}")]
    FilterError(String),

    /// Writing to a log sink failed.
    #[error("Logging I/O error: {0}")]
    IoError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_core_error_config_variant() {
        let core_err = CoreError::Config(ConfigError::ValidationError("Test validation".to_string()));

        assert_eq!(
            format!("{}", core_err),
            "Configuration Error: Configuration validation failed: Test validation"
        );
        match core_err.source().and_then(|s| s.downcast_ref::<ConfigError>()) {
            Some(ConfigError::ValidationError(msg)) => assert_eq!(msg, "Test validation"),
            other => panic!("Incorrect source for CoreError::Config: {:?}", other),
        }
    }

    #[test]
    fn test_core_error_logging_variant() {
        let core_err: CoreError = LoggingError::InitializationFailure("already set".to_string()).into();
        assert_eq!(
            format!("{}", core_err),
            "Logging Error: Failed to initialize logging: already set"
        );
        assert!(core_err.source().is_some());
    }

    #[test]
    fn test_core_error_filesystem_variant() {
        let path = PathBuf::from("/tmp/composer.log");
        let core_err = CoreError::Filesystem {
            message: "Could not create log directory".to_string(),
            path: path.clone(),
            source: IoError::new(ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(
            format!("{}", core_err),
            format!("Filesystem Error: Could not create log directory (Path: {:?})", path)
        );
        let source = core_err.source().and_then(|s| s.downcast_ref::<IoError>());
        assert_eq!(source.map(|e| e.kind()), Some(ErrorKind::PermissionDenied));
    }

    #[test]
    fn test_config_error_read_error_keeps_source() {
        let err = ConfigError::ReadError {
            path: PathBuf::from("/etc/novade/composer.toml"),
            source: IoError::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert!(format!("{}", err).contains("/etc/novade/composer.toml"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_parse_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(format!("{}", err).starts_with("Failed to parse configuration file"));
    }

    #[test]
    fn test_config_error_not_found_lists_locations() {
        let err = ConfigError::NotFound {
            locations: vec![PathBuf::from("/a.toml"), PathBuf::from("/b.toml")],
        };
        let text = format!("{}", err);
        assert!(text.contains("/a.toml") && text.contains("/b.toml"));
    }
}
