mod common;

use std::sync::Arc;

use common::{importer, native, FakeDriver};
use novade_buffer_manager::BufferId;
use novade_composer_core::buffer_cache::{BufferKind, BufferSlotCache};
use novade_composer_core::command::{Buffer, DisplayCommand, LayerCommand};
use novade_composer_core::display::DisplayRegistry;
use novade_composer_core::engine::CommandEngine;
use novade_composer_core::error::ComposerError;
use novade_composer_core::types::{DisplayId, LayerId};
use pretty_assertions::assert_eq;

const DISPLAY: DisplayId = DisplayId(0);
const LAYER: LayerId = LayerId(1);

fn layer_buffer(buffer: Buffer) -> DisplayCommand {
    DisplayCommand {
        layers: vec![LayerCommand {
            buffer: Some(buffer),
            ..LayerCommand::new(LAYER)
        }],
        ..DisplayCommand::new(DISPLAY)
    }
}

#[test]
fn test_slot_holds_exactly_one_buffer() {
    common::init_logging();
    let driver = FakeDriver::new();
    let registry = Arc::new(DisplayRegistry::new());
    registry.add_display(DISPLAY, false, 1, 0);
    registry.add_layer(DISPLAY, LAYER, 2).unwrap();
    let importer = importer();
    let cache = BufferSlotCache::new(registry.clone(), importer.clone());
    let mut engine = CommandEngine::new(driver.as_ref(), &registry, &cache);

    engine.execute(&[layer_buffer(Buffer::new(0, native(1)))]).unwrap();
    engine.execute(&[layer_buffer(Buffer::new(1, native(2)))]).unwrap();
    assert_eq!(importer.live_buffers(), 2);

    // Replacing slot 0 releases what it held.
    engine.execute(&[layer_buffer(Buffer::new(0, native(3)))]).unwrap();
    assert_eq!(importer.ref_count(BufferId::new(1)), 0);
    assert_eq!(importer.ref_count(BufferId::new(2)), 1);
    assert_eq!(importer.ref_count(BufferId::new(3)), 1);

    // Reusing slot 0 neither imports nor frees.
    let results = engine.execute(&[layer_buffer(Buffer::cached(0))]).unwrap();
    assert!(results.is_empty());
    assert_eq!(importer.live_buffers(), 2);
    assert_eq!(
        driver.state().buffers.last().copied(),
        Some(("set_layer_buffer", Some(BufferId::new(3))))
    );
}

#[test]
fn test_shrinking_slots_releases_orphans() {
    let registry = Arc::new(DisplayRegistry::new());
    registry.add_display(DISPLAY, false, 3, 0);
    registry.add_layer(DISPLAY, LAYER, 3).unwrap();
    let importer = importer();
    let cache = BufferSlotCache::new(registry.clone(), importer.clone());

    for (slot, id) in [(0, 10), (2, 12)] {
        let resolved = cache
            .lookup(DISPLAY, BufferKind::ClientTarget, slot, false, Some(&native(id)))
            .unwrap();
        cache.update(DISPLAY, BufferKind::ClientTarget, slot, false, resolved).unwrap();
    }
    assert_eq!(importer.live_buffers(), 2);

    cache.set_client_target_slot_count(DISPLAY, 1).unwrap();
    assert_eq!(importer.ref_count(BufferId::new(12)), 0);
    assert_eq!(importer.ref_count(BufferId::new(10)), 1);

    // Growing again yields empty slots.
    cache.set_client_target_slot_count(DISPLAY, 3).unwrap();
    let cached = cache.lookup(DISPLAY, BufferKind::ClientTarget, 2, true, None).unwrap();
    assert_eq!(cached.native(), None);
}

#[test]
fn test_removing_display_releases_everything() {
    let registry = Arc::new(DisplayRegistry::new());
    registry.add_display(DISPLAY, false, 1, 0);
    registry.add_layer(DISPLAY, LAYER, 1).unwrap();
    let importer = importer();
    let cache = BufferSlotCache::new(registry.clone(), importer.clone());

    for kind in [BufferKind::ClientTarget, BufferKind::LayerBuffer(LAYER)] {
        let id = match kind {
            BufferKind::ClientTarget => 20,
            _ => 21,
        };
        let resolved = cache.lookup(DISPLAY, kind, 0, false, Some(&native(id))).unwrap();
        cache.update(DISPLAY, kind, 0, false, resolved).unwrap();
    }
    assert_eq!(importer.live_buffers(), 2);

    registry.remove_display(DISPLAY).unwrap();
    assert_eq!(importer.live_buffers(), 0);
    assert_eq!(
        cache.set_layer_buffer_slot_count(DISPLAY, LAYER, 4),
        Err(ComposerError::BadDisplay)
    );
}
