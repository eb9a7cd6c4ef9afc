//! # Novade Composer Core
//!
//! Command processing core of the Novade display composer.
//!
//! A client submits batches of per-display commands. Each batch is applied
//! against a [`driver::DisplayDriver`], buffers are resolved through
//! per-display and per-layer slot caches, and the outcome is reported as a
//! list of [`result::CommandResultPayload`]s. Captures of a display's output
//! are queued in the [`writeback`] pipeline and reported in posting order.
//!
//! The main entry points are [`composer::Composer`] and
//! [`client::ComposerClient`].

pub mod buffer_cache;
pub mod client;
pub mod command;
mod commit;
pub mod composer;
pub mod display;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod result;
pub mod types;
pub mod writeback;

pub use client::ComposerClient;
pub use composer::Composer;
pub use driver::{CommitOutcome, CommitStatus, DisplayDriver};
pub use engine::CommandEngine;
pub use error::{ComposerError, ComposerResult};
pub use result::CommandResultPayload;
pub use types::{DisplayId, LayerId};
pub use writeback::{CaptureCallback, CaptureConfig, CaptureStatus};
