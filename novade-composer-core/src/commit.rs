//! Validate / present handling for the commit command of a display entry.

use tracing::{debug, warn};

use crate::command::CommitCommand;
use crate::display::CommitState;
use crate::driver::{query_sized, CommitOutcome, CommitStatus};
use crate::engine::CommandEngine;
use crate::error::ComposerResult;
use crate::result::{LayerRequestEntry, PresentOrValidateResult};
use crate::types::{DimmingStage, DisplayId, DisplayRequest, Fence};

/// Brightness reported with the client target property.
const CLIENT_TARGET_BRIGHTNESS: f32 = 1.0;

impl CommandEngine<'_> {
    pub(crate) fn execute_commit(&mut self, display: DisplayId, command: CommitCommand, expected_present_time: Option<i64>) {
        match command {
            CommitCommand::Validate => {
                self.forward_expected_present_time(display, expected_present_time);
                let result = self.validate_display(display);
                self.record(display, "validate_display", result);
            }
            CommitCommand::AcceptChanges => {
                let result = self.accept_display_changes(display);
                self.record(display, "accept_display_changes", result);
            }
            CommitCommand::Present => {
                let result = self.present_display(display);
                self.record(display, "present_display", result);
            }
            CommitCommand::PresentOrValidate => {
                self.forward_expected_present_time(display, expected_present_time);
                self.present_or_validate_display(display);
            }
        }
    }

    /// Forwards the expected present time when the command carries one.
    /// Negative times are clamped to zero.
    fn forward_expected_present_time(&mut self, display: DisplayId, expected_present_time: Option<i64>) {
        let Some(time) = expected_present_time else {
            return;
        };
        let timestamp = u64::try_from(time).unwrap_or(0);
        let result = self.driver.set_expected_present_time(display, timestamp);
        self.record(display, "set_expected_present_time", result);
    }

    fn set_commit_state(&self, display: DisplayId, state: CommitState) {
        // The display can vanish mid-frame on hotplug; nothing to track then.
        let _ = self.registry.update_commit(display, |tracker| tracker.state = state);
    }

    /// Back to idle after a failed validation. Changes of an earlier
    /// validation are void.
    fn reset_commit(&self, display: DisplayId) {
        let _ = self.registry.update_commit(display, |tracker| {
            tracker.state = CommitState::Idle;
            tracker.pending_changes = false;
        });
    }

    fn validate_display(&mut self, display: DisplayId) -> ComposerResult<()> {
        self.set_commit_state(display, CommitState::Validating);
        let outcome = match self.driver.commit_or_prepare(display, true) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.reset_commit(display);
                return Err(err);
            }
        };
        let result = self.post_validate_display(display, outcome.status);
        if result.is_err() {
            self.reset_commit(display);
        }
        result
    }

    /// Collects the validation results and writes them, even when empty.
    fn post_validate_display(&mut self, display: DisplayId, status: CommitStatus) -> ComposerResult<()> {
        let display_id = display.0;
        let changed = query_sized(|out| self.driver.changed_composition_types(display, out))?;

        let (mask, count) = self.driver.display_requests(display, None)?;
        let (mask, layer_requests) = if count == 0 {
            (mask, Vec::new())
        } else {
            let mut entries = vec![LayerRequestEntry::default(); count];
            match self.driver.display_requests(display, Some(&mut entries)) {
                Ok((mask, filled)) => {
                    entries.truncate(filled.min(count));
                    (mask, entries)
                }
                Err(err) => {
                    warn!(display = display_id, error = %err, "Failed to fill display requests");
                    (DisplayRequest::empty(), Vec::new())
                }
            }
        };

        let property = self.driver.client_target_property(display)?;

        let pending_changes = status == CommitStatus::HasChanges || !changed.is_empty();
        debug!(
            display = display_id,
            changed = changed.len(),
            requests = layer_requests.len(),
            pending_changes,
            "Display validated"
        );
        self.writer.set_changed_composition_types(display, changed);
        self.writer.set_display_requests(display, mask, layer_requests);
        self.writer
            .set_client_target_property(display, property, CLIENT_TARGET_BRIGHTNESS, DimmingStage::None);

        let _ = self.registry.update_commit(display, |tracker| {
            tracker.pending_changes = pending_changes;
            tracker.state = if pending_changes {
                CommitState::ValidatedWithChanges
            } else {
                CommitState::Validated
            };
        });
        Ok(())
    }

    /// Accepts the composition changes of the last validation. Without
    /// pending changes this is a no-op.
    fn accept_display_changes(&mut self, display: DisplayId) -> ComposerResult<()> {
        let tracker = self.registry.commit_tracker(display)?;
        if !tracker.pending_changes {
            let display_id = display.0;
            debug!(display = display_id, "No pending changes to accept");
            return Ok(());
        }
        self.driver.accept_display_changes(display)?;
        self.registry.update_commit(display, |tracker| {
            tracker.pending_changes = false;
            tracker.state = CommitState::Validated;
        })
    }

    fn present_display(&mut self, display: DisplayId) -> ComposerResult<()> {
        self.set_commit_state(display, CommitState::Presenting);
        match self.driver.present_display(display) {
            Ok(fence) => {
                self.post_present_display(display, fence);
                Ok(())
            }
            Err(err) => {
                self.set_commit_state(display, CommitState::Idle);
                Err(err)
            }
        }
    }

    /// Writes the present fence and the release fences. Release fences are
    /// best effort: when they cannot be collected nothing is written.
    fn post_present_display(&mut self, display: DisplayId, present_fence: Option<Fence>) {
        let _ = self.registry.update_commit(display, |tracker| {
            tracker.pending_changes = false;
            tracker.state = CommitState::Presented;
        });
        match query_sized(|out| self.driver.release_fences(display, out)) {
            Ok(release_fences) => {
                self.writer.set_present_fence(display, present_fence);
                self.writer.set_release_fences(display, &release_fences);
            }
            Err(err) => {
                let display_id = display.0;
                warn!(display = display_id, error = %err, "Failed to get release fences");
            }
        }
    }

    fn present_or_validate_display(&mut self, display: DisplayId) {
        self.set_commit_state(display, CommitState::Validating);
        let CommitOutcome {
            status,
            needs_commit,
            present_fence,
        } = match self.driver.commit_or_prepare(display, false) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.reset_commit(display);
                self.record(display, "present_or_validate_display", Err(err));
                return;
            }
        };

        if needs_commit {
            let result = self.post_validate_display(display, status);
            match result {
                Ok(()) => self
                    .writer
                    .set_present_or_validate_result(display, PresentOrValidateResult::Validated),
                Err(err) => {
                    self.reset_commit(display);
                    self.record(display, "present_or_validate_display", Err(err));
                }
            }
            return;
        }

        // The driver already committed the frame: fences follow the result.
        if status == CommitStatus::HasChanges {
            if self.post_validate_display(display, status).is_ok() {
                if let Err(err) = self.driver.accept_display_changes(display) {
                    let display_id = display.0;
                    warn!(display = display_id, error = %err, "Failed to accept display changes");
                }
            }
            self.writer
                .set_present_or_validate_result(display, PresentOrValidateResult::ValidatedWithChanges);
        } else {
            self.writer
                .set_present_or_validate_result(display, PresentOrValidateResult::Presented);
        }
        self.post_present_display(display, present_fence);
    }
}
