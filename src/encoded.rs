//! Text-safe chunk transport at the application boundary.
//!
//! Application layers that can only pass strings hand PCM chunks over as
//! standard base64. Chunks are decoded here, before the engine sees them.

use crate::error::{PlaybackError, PlaybackResult};
use crate::playback::{Enqueued, OutputBackend, PlaybackEngine};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Decode a base64 chunk into raw PCM bytes.
///
/// # Errors
///
/// Returns [`PlaybackError::InvalidInput`] when `encoded` is not valid base64.
pub fn decode_chunk(encoded: &str) -> PlaybackResult<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|err| PlaybackError::InvalidInput(format!("Invalid base64 string: {}", err)))
}

impl<B: OutputBackend> PlaybackEngine<B> {
    /// Decode a base64 chunk and queue it for playback.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::NotInitialized`] when the engine is not active,
    /// checked before decoding; [`PlaybackError::InvalidInput`] when the
    /// payload does not decode.
    pub fn enqueue_base64(&self, encoded: &str) -> PlaybackResult<Enqueued> {
        if !self.accepts_feed() {
            return Err(PlaybackError::NotInitialized);
        }
        let data = decode_chunk(encoded)?;
        self.enqueue(&data)
    }
}
