//! Error types for the feed, device and configuration paths.

/// Playback-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Feed or teardown invoked before a successful `initialize`
    #[error("Playback engine is not initialized")]
    NotInitialized,

    /// Chunk could not be decoded at the transport boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Chunk is larger than the free space in the ring buffer
    #[error("Buffer overflow: {requested} bytes requested, {available} bytes free")]
    Overflow {
        /// Bytes the producer tried to write
        requested: usize,
        /// Free bytes at the time of the write
        available: usize,
    },

    /// Ring buffer capacity is zero or does not fit in memory
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Sample rate, channel count or hardware buffer size is unusable
    #[error("Invalid stream format: {0}")]
    InvalidFormat(String),

    /// Engine configuration is out of range
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Named output device is not present
    #[error("Device not found: {device_name}")]
    DeviceNotFound {
        /// Name that was looked up
        device_name: String,
    },

    /// Host has no output device at all
    #[error("No output devices available")]
    NoDevicesAvailable,

    /// Backend-specific errors (CPAL, etc.)
    #[error("Backend error: {backend} - {details}")]
    Backend {
        /// Backend that produced the error
        backend: &'static str,
        /// Backend error message
        details: String,
    },
}

impl PlaybackError {
    /// Create an overflow error
    pub const fn overflow(requested: usize, available: usize) -> Self {
        Self::Overflow {
            requested,
            available,
        }
    }

    /// Create a device not found error
    pub fn device_not_found(device_name: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device_name: device_name.into(),
        }
    }

    /// Create a backend error
    pub fn backend(backend: &'static str, details: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            details: details.into(),
        }
    }

    /// Check if this is a recoverable error.
    ///
    /// Feed-path errors never take the engine down; the caller may simply
    /// carry on with the next chunk.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::InvalidInput(_) | Self::Overflow { .. }
        )
    }

    /// Check if this error indicates a device problem
    pub const fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. } | Self::NoDevicesAvailable | Self::Backend { .. }
        )
    }
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

#[cfg(feature = "playback")]
impl From<cpal::BuildStreamError> for PlaybackError {
    fn from(err: cpal::BuildStreamError) -> Self {
        Self::backend("cpal", format!("Failed to build stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PlayStreamError> for PlaybackError {
    fn from(err: cpal::PlayStreamError) -> Self {
        Self::backend("cpal", format!("Failed to play stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PauseStreamError> for PlaybackError {
    fn from(err: cpal::PauseStreamError) -> Self {
        Self::backend("cpal", format!("Failed to pause stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::DevicesError> for PlaybackError {
    fn from(err: cpal::DevicesError) -> Self {
        Self::backend("cpal", format!("Failed to enumerate devices: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_errors_are_recoverable() {
        assert!(PlaybackError::NotInitialized.is_recoverable());
        assert!(PlaybackError::InvalidInput("bad".to_string()).is_recoverable());
        assert!(PlaybackError::overflow(20, 10).is_recoverable());
        assert!(!PlaybackError::InvalidCapacity("zero".to_string()).is_recoverable());
    }

    #[test]
    fn test_device_errors_are_not_recoverable() {
        assert!(!PlaybackError::backend("cpal", "stream died").is_recoverable());
        assert!(!PlaybackError::NoDevicesAvailable.is_recoverable());
    }

    #[test]
    fn test_overflow_message() {
        let err = PlaybackError::overflow(20, 10);
        assert_eq!(
            err.to_string(),
            "Buffer overflow: 20 bytes requested, 10 bytes free"
        );
    }

    #[test]
    fn test_device_error_classification() {
        assert!(PlaybackError::device_not_found("USB DAC").is_device_error());
        assert!(PlaybackError::NoDevicesAvailable.is_device_error());
        assert!(!PlaybackError::NotInitialized.is_device_error());
    }
}
