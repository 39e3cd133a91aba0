//! Engine configuration.

use crate::error::{PlaybackError, PlaybackResult};
use serde::{Deserialize, Serialize};

/// Hardware buffers' worth of audio the ring can queue ahead by default.
pub const DEFAULT_BUFFER_MULTIPLIER: u32 = 1000;

/// Silent buffers submitted before the first device callback.
pub const MIN_PRIMED_BUFFERS: usize = 2;

/// Tunables that stay fixed across `initialize` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ring capacity as a multiple of the hardware buffer byte size
    pub buffer_multiplier: u32,

    /// Number of hardware buffers cycled by the device, all primed with silence
    pub primed_buffers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_multiplier: DEFAULT_BUFFER_MULTIPLIER,
            primed_buffers: MIN_PRIMED_BUFFERS,
        }
    }
}

impl EngineConfig {
    /// Create configuration optimized for low latency
    pub const fn low_latency() -> Self {
        Self {
            buffer_multiplier: 16,
            primed_buffers: MIN_PRIMED_BUFFERS,
        }
    }

    /// Create configuration optimized for bursty, jittery producers
    pub const fn jitter_tolerant() -> Self {
        Self {
            buffer_multiplier: DEFAULT_BUFFER_MULTIPLIER,
            primed_buffers: 3,
        }
    }

    /// Set the ring capacity multiplier
    pub const fn with_buffer_multiplier(mut self, buffer_multiplier: u32) -> Self {
        self.buffer_multiplier = buffer_multiplier;
        self
    }

    /// Set the number of primed hardware buffers
    pub const fn with_primed_buffers(mut self, primed_buffers: usize) -> Self {
        self.primed_buffers = primed_buffers;
        self
    }

    /// Ring capacity for a given hardware buffer size.
    pub fn ring_capacity(&self, hardware_buffer_byte_size: usize) -> PlaybackResult<usize> {
        hardware_buffer_byte_size
            .checked_mul(self.buffer_multiplier as usize)
            .ok_or_else(|| {
                PlaybackError::InvalidCapacity(format!(
                    "{} bytes x {} overflows",
                    hardware_buffer_byte_size, self.buffer_multiplier
                ))
            })
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> PlaybackResult<()> {
        if self.buffer_multiplier == 0 {
            return Err(PlaybackError::InvalidConfig(
                "buffer_multiplier must be at least 1".to_string(),
            ));
        }
        if self.primed_buffers < MIN_PRIMED_BUFFERS {
            return Err(PlaybackError::InvalidConfig(format!(
                "primed_buffers must be at least {}, got {}",
                MIN_PRIMED_BUFFERS, self.primed_buffers
            )));
        }
        Ok(())
    }
}
