// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![cfg_attr(not(test), warn(clippy::unwrap_used))] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![deny(missing_docs)] // Documentation is a must for release

//! # realtime_audio_player
//!
//! Continuous, low-latency playback of linear PCM that arrives as a stream of
//! irregularly sized chunks (typically off a network socket) through an audio
//! device that pulls fixed-size buffers at a strict cadence.
//!
//! ## Overview
//!
//! Two components do the work:
//!
//! - [`RingBuffer`]: a fixed-capacity byte ring with all-or-nothing writes
//!   and reads. It is the only state shared between the feed path and the
//!   device callback.
//! - [`PlaybackEngine`]: owns one ring at a time and the device lifecycle
//!   (`Uninitialized -> Active -> Stopped`, re-initializable). Chunks that do
//!   not fit are dropped whole, and a callback that finds less than a full
//!   hardware buffer plays silence. Neither path ever blocks on the other.
//!
//! The format is always 16-bit signed integer, packed, interleaved PCM at the
//! sample rate and channel count given to `initialize`.
//!
//! ## Features
//!
//! - `playback`: hardware output through `cpal` ([`playback::CpalBackend`])
//!
//! Without features the crate still builds the full engine; drive it with
//! [`playback::ManualBackend`] or a custom [`playback::OutputBackend`].
//!
//! ## Quick Start
//!
//! ```rust
//! use realtime_audio_player::{EngineState, PlaybackEngine, PlaybackError};
//! use realtime_audio_player::playback::ManualBackend;
//!
//! let (backend, device) = ManualBackend::new();
//! let engine = PlaybackEngine::new(backend);
//!
//! // 4096-byte hardware buffers, 44.1 kHz stereo
//! engine.initialize(4096, 44100.0, 2).unwrap();
//! assert_eq!(engine.state(), EngineState::Active);
//!
//! let chunk = vec![0u8; 1500];
//! assert!(engine.enqueue(&chunk).unwrap().is_accepted());
//!
//! // The device pulls whole hardware buffers.
//! let buffer = device.play_buffer().unwrap();
//! assert_eq!(buffer.len(), 4096);
//!
//! engine.deinitialize();
//! assert!(matches!(engine.enqueue(&chunk), Err(PlaybackError::NotInitialized)));
//! ```
//!
//! ## Error Handling
//!
//! Everything fallible returns [`PlaybackResult`]. Feed-path errors are
//! local and recoverable; overflow is reported as [`Enqueued::Dropped`]
//! rather than an error, and underruns only show up in
//! [`EngineStats`](playback::EngineStats).

pub mod encoded;
mod error;
pub mod playback;
pub mod ring_buffer;

pub use crate::encoded::decode_chunk;
pub use crate::error::{PlaybackError, PlaybackResult};
pub use crate::playback::{EngineConfig, EngineState, Enqueued, PlaybackEngine, StreamFormat};
pub use crate::ring_buffer::RingBuffer;
