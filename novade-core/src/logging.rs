//! Logging setup for the composer.
//!
//! Built on the `tracing` ecosystem: a console layer plus an optional daily
//! rolling file layer, each in text or JSON format.

use crate::config::LoggingConfig;
use crate::error::{CoreError, LoggingError};

use once_cell::sync::Lazy;
use std::fs;
use std::io::stdout;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initializes a minimal logging setup, directing messages to `stderr`.
///
/// Intended for tests and early startup before the configuration is loaded.
/// Filters with `RUST_LOG`, defaulting to `info`. Errors (for instance a
/// subscriber that is already installed) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

/// Creates the file logging layer and its flush guard.
///
/// The parent directory is created if needed. Files roll daily.
fn create_file_layer(log_path: &Path, format: &str) -> Result<(BoxedLayer, WorkerGuard), CoreError> {
    let parent = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|source| CoreError::Filesystem {
            message: "Could not create log directory".to_string(),
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("composer.log"));
    let file_appender = tracing_appender::rolling::daily(parent, file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let layer = match format.to_lowercase().as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .boxed(),
        _ => fmt::layer().with_writer(non_blocking_writer).with_ansi(false).boxed(),
    };
    Ok((layer, guard))
}

/// Keeps the file writer alive so buffered lines are flushed on exit.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Initializes the global logging system from a [`LoggingConfig`].
///
/// With `is_reload` set, a subscriber that is already installed is not an
/// error: the file guard is still swapped and the call returns `Ok`.
///
/// # Errors
///
/// [`LoggingError::InitializationFailure`] for an invalid level, or when a
/// subscriber is already installed on a first initialization.
pub fn init_logging(config: &LoggingConfig, is_reload: bool) -> Result<(), CoreError> {
    let level = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        invalid_level => {
            return Err(CoreError::Logging(LoggingError::InitializationFailure(format!(
                "Invalid log level in config: {}",
                invalid_level
            ))));
        }
    };
    let level_filter_str = level.to_string();

    let stdout_filter = EnvFilter::try_new(&level_filter_str)
        .map_err(|e| LoggingError::FilterError(e.to_string()))?;
    let stdout_layer = match config.format.to_lowercase().as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(stdout)
            .with_ansi(false)
            .with_filter(stdout_filter)
            .boxed(),
        _ => fmt::layer()
            .with_writer(stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_filter(stdout_filter)
            .boxed(),
    };

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer];
    let mut new_file_guard: Option<WorkerGuard> = None;
    if let Some(log_path) = &config.file_path {
        let file_filter = EnvFilter::try_new(&level_filter_str)
            .map_err(|e| LoggingError::FilterError(e.to_string()))?;
        let (file_layer, guard) = create_file_layer(log_path, &config.format)?;
        new_file_guard = Some(guard);
        layers.push(file_layer.with_filter(file_filter).boxed());
    }

    let result = Registry::default().with(layers).try_init();

    match LOG_WORKER_GUARD.lock() {
        Ok(mut guard_slot) => {
            // The previous guard drops here and flushes its file.
            *guard_slot = new_file_guard;
        }
        Err(e) => {
            eprintln!(
                "[ERROR] Failed to lock LOG_WORKER_GUARD to update: {}. Log flushing may be affected.",
                e
            );
        }
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) if is_reload => {
            eprintln!(
                "[INFO] Re-initializing logging configuration attempted. Previous logger may persist. Error: {}",
                e
            );
            Ok(())
        }
        Err(e) => Err(CoreError::Logging(LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {}",
            e
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // The global subscriber can be installed once per test binary, so these
    // tests only assert on outcomes that do not depend on test ordering.

    #[test]
    fn test_init_minimal_logging_runs_without_panic() {
        init_minimal_logging();
        init_minimal_logging();
        tracing::info!("Minimal logging test: Info message after init_minimal_logging.");
    }

    #[test]
    fn test_create_file_layer_text_format() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("composer_text.log");

        let result = create_file_layer(&log_path, "text");
        assert!(result.is_ok(), "create_file_layer failed for text format: {:?}", result.err());
    }

    #[test]
    fn test_create_file_layer_json_format() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("composer_json.log");

        let result = create_file_layer(&log_path, "json");
        assert!(result.is_ok(), "create_file_layer failed for json format: {:?}", result.err());
    }

    #[test]
    fn test_create_file_layer_ensures_parent_dir_exists() {
        let temp_dir = TempDir::new().unwrap();
        let nested_log_path = temp_dir.path().join("new_parent_dir/nested.log");
        assert!(!nested_log_path.parent().unwrap().exists());

        let result = create_file_layer(&nested_log_path, "text");
        assert!(result.is_ok(), "create_file_layer failed: {:?}", result.err());
        assert!(nested_log_path.parent().unwrap().exists(), "Parent directory was not created");
    }

    #[test]
    fn test_init_logging_invalid_level_returns_error() {
        let config = LoggingConfig {
            level: "supertrace".to_string(),
            file_path: None,
            format: "text".to_string(),
        };
        match init_logging(&config, false) {
            Err(CoreError::Logging(LoggingError::InitializationFailure(msg))) => {
                assert!(msg.contains("Invalid log level in config: supertrace"));
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    // Guard state is global, so everything touching it lives in one test.
    #[test]
    fn test_log_worker_guard_and_reinitialization() {
        let temp_dir = TempDir::new().unwrap();
        let with_file = LoggingConfig {
            level: "info".to_string(),
            file_path: Some(temp_dir.path().join("guard_test.log")),
            format: "text".to_string(),
        };
        init_logging(&with_file, true).expect("init_logging with file failed");
        assert!(LOG_WORKER_GUARD.lock().unwrap().is_some(), "Guard should be kept while file logging is on");

        let without_file = LoggingConfig {
            file_path: None,
            ..with_file
        };
        init_logging(&without_file, true).expect("init_logging without file failed");
        assert!(LOG_WORKER_GUARD.lock().unwrap().is_none(), "Guard should be dropped when file logging is off");

        // A subscriber is installed by now, so a first-time init must fail.
        match init_logging(&without_file, false) {
            Err(CoreError::Logging(LoggingError::InitializationFailure(msg))) => {
                assert!(msg.contains("Failed to set global tracing subscriber"));
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
