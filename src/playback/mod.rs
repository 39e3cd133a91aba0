//! Real-time playback of streamed PCM chunks.
//!
//! This module bridges a producer that delivers irregular chunks of 16-bit
//! PCM at arbitrary times with a device that pulls fixed-size buffers at a
//! strict cadence:
//! - [`PlaybackEngine`] owns the ring buffer and the device lifecycle
//! - [`HardwareQueue`] cycles primed hardware buffers through the [`Renderer`]
//! - [`OutputBackend`] is the seam to a device: [`CpalBackend`] for real
//!   hardware (feature `playback`), [`ManualBackend`] for headless use
//!
//! # Example
//!
//! ```rust
//! use realtime_audio_player::playback::{EngineConfig, ManualBackend, PlaybackEngine};
//!
//! let (backend, device) = ManualBackend::new();
//! let engine = PlaybackEngine::with_config(backend, EngineConfig::low_latency());
//! engine.initialize(4, 48_000.0, 1).unwrap();
//!
//! assert!(engine.enqueue(&[1, 0, 2, 0]).unwrap().is_accepted());
//!
//! // Two primed silent buffers play before the queued audio.
//! assert_eq!(device.play(12).unwrap(), vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 2, 0]);
//! engine.deinitialize();
//! ```

pub mod config;
pub mod engine;
pub mod hardware_queue;
pub mod manual;
pub mod traits;

#[cfg(feature = "playback")]
pub mod cpal_backend;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::{Enqueued, PlaybackEngine};
pub use hardware_queue::{HardwareQueue, Renderer};
pub use manual::{ManualBackend, ManualDevice, ManualStream};
pub use traits::{EngineState, EngineStats, OutputBackend, OutputStream, StreamFormat};

#[cfg(feature = "playback")]
pub use cpal_backend::{CpalBackend, CpalStream};
