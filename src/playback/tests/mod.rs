//! Tests for the playback engine.
//!
//! Every test drives the engine through [`ManualBackend`], so no audio
//! hardware is needed.

use super::{EngineConfig, ManualBackend, ManualDevice, PlaybackEngine};

mod concurrency_tests;

/// Helper function to create an engine with a small ring
pub(crate) fn small_engine(
    buffer_multiplier: u32,
) -> (PlaybackEngine<ManualBackend>, ManualDevice) {
    let (backend, device) = ManualBackend::new();
    let config = EngineConfig::default().with_buffer_multiplier(buffer_multiplier);
    (PlaybackEngine::with_config(backend, config), device)
}

/// Helper function to create a recognisable byte pattern
pub(crate) fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_add((i as u8).wrapping_mul(3)))
        .collect()
}
