//! Core types and traits at the seam between the engine and an output device.

use super::hardware_queue::{HardwareQueue, Renderer};
use crate::error::{PlaybackError, PlaybackResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bytes per sample: PCM is always 16-bit signed integer.
pub const BYTES_PER_SAMPLE: usize = 2;

/// An output device implementation the engine can start and stop.
///
/// `open` receives a queue that has already been primed with silent hardware
/// buffers. The device must play those buffers first and hand every played
/// buffer back to the [`Renderer`] for refilling before re-submitting it.
pub trait OutputBackend: Send {
    /// Handle to a running device stream
    type Stream: OutputStream;

    /// Start a device stream for `format`.
    fn open(
        &mut self,
        format: &StreamFormat,
        queue: HardwareQueue,
        renderer: Renderer,
    ) -> PlaybackResult<Self::Stream>;
}

/// A running device stream.
pub trait OutputStream: Send {
    /// Stop the stream and release its device resources.
    fn close(self) -> PlaybackResult<()>;
}

/// Device format: 16-bit signed integer, packed, interleaved, native-endian PCM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Frames per second
    pub sample_rate: f64,
    /// Interleaved channels per frame
    pub channels: u32,
    /// Bytes the device requests on each callback
    pub hardware_buffer_byte_size: usize,
}

impl StreamFormat {
    /// Create a new format specification
    pub const fn new(hardware_buffer_byte_size: usize, sample_rate: f64, channels: u32) -> Self {
        Self {
            sample_rate,
            channels,
            hardware_buffer_byte_size,
        }
    }

    /// Get the frame size (all channels for one sample) in bytes
    pub const fn bytes_per_frame(&self) -> usize {
        BYTES_PER_SAMPLE * self.channels as usize
    }

    /// Whole frames carried by one hardware buffer
    pub const fn frames_per_buffer(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.hardware_buffer_byte_size / self.bytes_per_frame()
    }

    /// Time between two device callbacks.
    pub fn callback_period(&self) -> Duration {
        self.duration_of(self.hardware_buffer_byte_size)
    }

    /// Playback time represented by `bytes` of audio in this format.
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let bytes_per_second = self.sample_rate * self.bytes_per_frame() as f64;
        if bytes_per_second <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(bytes as f64 / bytes_per_second)
    }

    /// Sample rate rounded to the whole frames per second a device accepts.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidFormat`] when the rate is not a
    /// positive number or rounds to more than `u32::MAX`.
    pub fn device_sample_rate(&self) -> PlaybackResult<u32> {
        let rounded = self.sample_rate.round();
        if !rounded.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
            return Err(PlaybackError::InvalidFormat(format!(
                "sample rate must be between 1 and {} Hz, got {}",
                u32::MAX,
                self.sample_rate
            )));
        }
        Ok(rounded as u32)
    }

    /// Check that the format can drive a device.
    pub fn validate(&self) -> PlaybackResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(PlaybackError::InvalidFormat(format!(
                "sample rate must be a positive number, got {}",
                self.sample_rate
            )));
        }
        self.device_sample_rate()?;
        if self.channels == 0 {
            return Err(PlaybackError::InvalidFormat(
                "channel count must be at least 1".to_string(),
            ));
        }
        if self.hardware_buffer_byte_size == 0 {
            return Err(PlaybackError::InvalidFormat(
                "hardware buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle state of a [`PlaybackEngine`](super::PlaybackEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Constructed, never initialized
    Uninitialized,
    /// Device running, feed accepted
    Active,
    /// Torn down; may be initialized again
    Stopped,
}

impl EngineState {
    /// Check if the engine accepts audio
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Snapshot of engine counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Chunks written into the ring
    pub chunks_accepted: u64,
    /// Chunks dropped on overflow
    pub chunks_dropped: u64,
    /// Bytes written into the ring
    pub bytes_accepted: u64,
    /// Bytes dropped on overflow
    pub bytes_dropped: u64,
    /// Device callbacks served
    pub callbacks: u64,
    /// Callbacks that found too little data and played silence
    pub underruns: u64,
    /// Bytes reported back to the device
    pub bytes_rendered: u64,
    /// Bytes currently queued in the ring
    pub buffered_bytes: usize,
    /// Ring capacity in bytes (zero when not active)
    pub capacity: usize,
}

impl EngineStats {
    /// Current ring fill level (0.0 to 1.0)
    pub fn buffer_level(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.buffered_bytes as f64 / self.capacity as f64
        }
    }

    /// Fraction of callbacks that played silence
    pub fn underrun_rate(&self) -> f64 {
        if self.callbacks == 0 {
            0.0
        } else {
            self.underruns as f64 / self.callbacks as f64
        }
    }
}
