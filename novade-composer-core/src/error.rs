//! Composer status codes.

use novade_buffer_manager::BufferError;
use thiserror::Error;

/// Errors reported by the composer and by display drivers.
///
/// The discriminants match the status codes clients see in command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ComposerError {
    #[error("bad config")]
    BadConfig,
    /// The display id does not name a live display.
    #[error("bad display")]
    BadDisplay,
    /// The layer id does not name a live layer of the display.
    #[error("bad layer")]
    BadLayer,
    /// An argument is out of its allowed domain.
    #[error("bad parameter")]
    BadParameter,
    /// A resource (buffer import, client slot, worker) could not be acquired.
    #[error("no resources")]
    NoResources,
    /// The display must be validated before this request.
    #[error("not validated")]
    NotValidated,
    #[error("unsupported")]
    Unsupported,
}

impl ComposerError {
    /// Numeric status code written into command results.
    pub const fn code(self) -> i32 {
        match self {
            ComposerError::BadConfig => 1,
            ComposerError::BadDisplay => 2,
            ComposerError::BadLayer => 3,
            ComposerError::BadParameter => 4,
            ComposerError::NoResources => 6,
            ComposerError::NotValidated => 7,
            ComposerError::Unsupported => 8,
        }
    }
}

impl From<BufferError> for ComposerError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::SlotOutOfRange { .. } => ComposerError::BadParameter,
            BufferError::InvalidHandle(..) | BufferError::ImportFailed { .. } | BufferError::CapacityExceeded { .. } => {
                ComposerError::NoResources
            }
        }
    }
}

pub type ComposerResult<T> = Result<T, ComposerError>;
