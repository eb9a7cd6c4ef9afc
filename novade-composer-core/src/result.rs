//! Result payloads produced while executing a command batch.

use crate::error::ComposerError;
use crate::types::{ClientTargetProperty, Composition, DimmingStage, DisplayId, DisplayRequest, Fence, LayerId, LayerRequest};

/// Failure of one command, tagged with the index of its display entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandError {
    pub command_index: usize,
    pub error: ComposerError,
}

impl CommandError {
    pub fn error_code(&self) -> i32 {
        self.error.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangedCompositionLayer {
    pub layer: LayerId,
    pub composition: Composition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerRequestEntry {
    pub layer: LayerId,
    pub mask: LayerRequest,
}

/// Release fence of one layer. Layers without a fence are left out of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReleaseFence {
    pub layer: LayerId,
    pub fence: Option<Fence>,
}

/// Outcome of a Present-or-Validate commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentOrValidateResult {
    Validated,
    Presented,
    ValidatedWithChanges,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandResultPayload {
    Error(CommandError),
    ChangedCompositionTypes {
        display: DisplayId,
        layers: Vec<ChangedCompositionLayer>,
    },
    DisplayRequest {
        display: DisplayId,
        mask: DisplayRequest,
        layer_requests: Vec<LayerRequestEntry>,
    },
    PresentFence {
        display: DisplayId,
        fence: Fence,
    },
    ReleaseFences {
        display: DisplayId,
        layers: Vec<(LayerId, Fence)>,
    },
    PresentOrValidateResult {
        display: DisplayId,
        result: PresentOrValidateResult,
    },
    ClientTargetProperty {
        display: DisplayId,
        property: ClientTargetProperty,
        brightness: f32,
        dimming_stage: DimmingStage,
    },
}

/// Accumulates payloads in the order they are produced.
#[derive(Debug, Default)]
pub struct ResultWriter {
    results: Vec<CommandResultPayload>,
}

impl ResultWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&mut self, command_index: usize, error: ComposerError) {
        self.results
            .push(CommandResultPayload::Error(CommandError { command_index, error }));
    }

    pub fn set_changed_composition_types(&mut self, display: DisplayId, layers: Vec<ChangedCompositionLayer>) {
        self.results
            .push(CommandResultPayload::ChangedCompositionTypes { display, layers });
    }

    pub fn set_display_requests(
        &mut self,
        display: DisplayId,
        mask: DisplayRequest,
        layer_requests: Vec<LayerRequestEntry>,
    ) {
        self.results.push(CommandResultPayload::DisplayRequest {
            display,
            mask,
            layer_requests,
        });
    }

    /// Writes nothing when the driver returned no fence.
    pub fn set_present_fence(&mut self, display: DisplayId, fence: Option<Fence>) {
        if let Some(fence) = fence {
            self.results.push(CommandResultPayload::PresentFence { display, fence });
        }
    }

    /// Layers without a fence are skipped.
    pub fn set_release_fences(&mut self, display: DisplayId, fences: &[ReleaseFence]) {
        let layers = fences
            .iter()
            .filter_map(|entry| entry.fence.map(|fence| (entry.layer, fence)))
            .collect();
        self.results
            .push(CommandResultPayload::ReleaseFences { display, layers });
    }

    pub fn set_present_or_validate_result(&mut self, display: DisplayId, result: PresentOrValidateResult) {
        self.results
            .push(CommandResultPayload::PresentOrValidateResult { display, result });
    }

    pub fn set_client_target_property(
        &mut self,
        display: DisplayId,
        property: ClientTargetProperty,
        brightness: f32,
        dimming_stage: DimmingStage,
    ) {
        self.results.push(CommandResultPayload::ClientTargetProperty {
            display,
            property,
            brightness,
            dimming_stage,
        });
    }

    /// Hands out everything written so far and leaves the writer empty.
    pub fn take_pending_results(&mut self) -> Vec<CommandResultPayload> {
        std::mem::take(&mut self.results)
    }
}
