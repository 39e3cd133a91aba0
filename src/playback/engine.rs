//! Playback engine: lifecycle, feed policy and device wiring.

use super::{
    config::EngineConfig,
    hardware_queue::{Counters, HardwareQueue, Renderer, Session},
    traits::{EngineState, EngineStats, OutputBackend, OutputStream, StreamFormat},
};
use crate::error::{PlaybackError, PlaybackResult};
use crate::ring_buffer::RingBuffer;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a feed call on an active engine.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Every byte of the chunk is queued for playback
    Accepted,
    /// The chunk did not fit and was discarded in full
    Dropped,
}

impl Enqueued {
    /// Check if the chunk made it into the ring
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

struct Lifecycle<B: OutputBackend> {
    backend: B,
    state: EngineState,
    stream: Option<B::Stream>,
}

/// What the feed path writes into.
///
/// Swapped under a short write lock and never held across device calls, so
/// `enqueue` does not wait for a device to open or close.
#[derive(Clone)]
enum Feed {
    /// Not initialized, or stopped
    Idle,
    /// Active, with the old device going down and the new one coming up
    Reconfiguring,
    Live {
        session: Arc<Session>,
        format: StreamFormat,
    },
}

/// Streams irregular PCM chunks into a device that pulls fixed-size buffers.
///
/// The feed path ([`enqueue`](Self::enqueue)) never blocks on buffer space
/// or on the device: chunks that do not fit are dropped whole, and opening
/// or closing the device happens outside the lock the feed path takes. The
/// device path plays silence whenever a full hardware buffer is not
/// available. All methods take `&self`, so the engine can be shared between
/// a transport thread feeding audio and a control thread driving the
/// lifecycle.
pub struct PlaybackEngine<B: OutputBackend> {
    config: EngineConfig,
    counters: Arc<Counters>,
    feed: RwLock<Feed>,
    lifecycle: Mutex<Lifecycle<B>>,
}

impl<B: OutputBackend> PlaybackEngine<B> {
    /// Create an uninitialized engine with default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    /// Create an uninitialized engine with the specified configuration.
    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        Self {
            config,
            counters: Arc::new(Counters::default()),
            feed: RwLock::new(Feed::Idle),
            lifecycle: Mutex::new(Lifecycle {
                backend,
                state: EngineState::Uninitialized,
                stream: None,
            }),
        }
    }

    /// Configure the device and start playback.
    ///
    /// Sizes a fresh ring at `hardware_buffer_byte_size` times the configured
    /// multiplier and opens the device with primed silent buffers. Calling
    /// this while active tears the current device and ring down first; any
    /// audio still queued is discarded, and chunks fed while the new device
    /// is opening are dropped.
    ///
    /// # Errors
    ///
    /// Invalid format or configuration is rejected before anything is torn
    /// down. Device failures leave the engine stopped.
    pub fn initialize(
        &self,
        hardware_buffer_byte_size: u32,
        sample_rate: f64,
        channel_count: u32,
    ) -> PlaybackResult<()> {
        let format = StreamFormat::new(hardware_buffer_byte_size as usize, sample_rate, channel_count);
        format.validate()?;
        self.config.validate()?;
        let capacity = self.config.ring_capacity(format.hardware_buffer_byte_size)?;

        if format.hardware_buffer_byte_size % format.bytes_per_frame() != 0 {
            warn!(
                "Hardware buffer of {} bytes is not a whole number of {}-byte frames",
                format.hardware_buffer_byte_size,
                format.bytes_per_frame()
            );
        }

        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state.is_active() {
            debug!("Reconfiguring active playback engine");
            self.teardown(&mut lifecycle, Feed::Reconfiguring);
        }

        let ring = RingBuffer::new(capacity)?;
        let session = Arc::new(Session::new(
            ring,
            format.hardware_buffer_byte_size,
            Arc::clone(&self.counters),
        ));
        let queue = HardwareQueue::primed(format.hardware_buffer_byte_size, self.config.primed_buffers);
        let renderer = Renderer::new(Arc::clone(&session));

        let stream = match lifecycle.backend.open(&format, queue, renderer) {
            Ok(stream) => stream,
            Err(err) => {
                session.retire();
                *self.feed.write() = Feed::Idle;
                if lifecycle.state != EngineState::Uninitialized {
                    lifecycle.state = EngineState::Stopped;
                }
                return Err(err);
            }
        };

        lifecycle.stream = Some(stream);
        lifecycle.state = EngineState::Active;
        *self.feed.write() = Feed::Live { session, format };

        info!(
            "Playback engine active: {} Hz, {} channel(s), {} byte hardware buffers, {} byte ring",
            sample_rate, channel_count, hardware_buffer_byte_size, capacity
        );
        Ok(())
    }

    /// Queue a chunk of raw PCM bytes for playback.
    ///
    /// Returns [`Enqueued::Dropped`] when the chunk is larger than the free
    /// space, or when the device is being reconfigured; nothing of it is
    /// queued and no waiting happens.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NotInitialized`] when the engine is not active.
    pub fn enqueue(&self, data: &[u8]) -> PlaybackResult<Enqueued> {
        // A session retired under the write is retried against whatever
        // replaced it.
        for _ in 0..2 {
            let feed = self.feed.read().clone();
            let session = match feed {
                Feed::Live { session, .. } => session,
                Feed::Reconfiguring => return Ok(self.drop_chunk(data, "device is being reconfigured")),
                Feed::Idle => {
                    warn!("Audio queue is not active, ignoring {} byte chunk", data.len());
                    return Err(PlaybackError::NotInitialized);
                }
            };

            match session.write(data) {
                Some(Ok(())) => {
                    self.counters.chunks_accepted.fetch_add(1, Ordering::Relaxed);
                    self.counters
                        .bytes_accepted
                        .fetch_add(data.len() as u64, Ordering::Relaxed);
                    return Ok(Enqueued::Accepted);
                }
                Some(Err(err)) => return Ok(self.drop_chunk(data, err)),
                None => continue,
            }
        }

        warn!("Audio queue stopped during feed, ignoring {} byte chunk", data.len());
        Err(PlaybackError::NotInitialized)
    }

    fn drop_chunk(&self, data: &[u8], reason: impl std::fmt::Display) -> Enqueued {
        warn!("Dropping audio chunk: {}", reason);
        self.counters.chunks_dropped.fetch_add(1, Ordering::Relaxed);
        self.counters
            .bytes_dropped
            .fetch_add(data.len() as u64, Ordering::Relaxed);
        Enqueued::Dropped
    }

    /// Stop the device and release the ring. Does nothing when not active.
    pub fn deinitialize(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            EngineState::Active => {
                self.teardown(&mut lifecycle, Feed::Idle);
                lifecycle.state = EngineState::Stopped;
                info!("Playback engine stopped");
            }
            EngineState::Uninitialized => debug!("Deinitialize on an engine that was never initialized"),
            EngineState::Stopped => {}
        }
    }

    // The feed is switched away and the session retired before the stream is
    // closed, so a callback racing with teardown either finishes its copy
    // first or sees it retired, and the feed path never waits on `close`.
    fn teardown(&self, lifecycle: &mut Lifecycle<B>, next: Feed) {
        let previous = std::mem::replace(&mut *self.feed.write(), next);
        if let Feed::Live { session, .. } = previous {
            session.retire();
        }
        if let Some(stream) = lifecycle.stream.take() {
            if let Err(err) = stream.close() {
                warn!("Failed to close output stream cleanly: {}", err);
            }
        }
    }

    /// Current lifecycle state.
    ///
    /// Waits for an `initialize` or `deinitialize` in progress on another
    /// thread to finish.
    pub fn state(&self) -> EngineState {
        self.lifecycle.lock().state
    }

    /// Check if the engine accepts audio
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Check if a chunk fed now would reach a device, without waiting on the
    /// lifecycle lock.
    pub(crate) fn accepts_feed(&self) -> bool {
        !matches!(*self.feed.read(), Feed::Idle)
    }

    /// Device format while active
    pub fn format(&self) -> Option<StreamFormat> {
        match &*self.feed.read() {
            Feed::Live { format, .. } => Some(*format),
            _ => None,
        }
    }

    /// Engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn session(&self) -> Option<Arc<Session>> {
        match &*self.feed.read() {
            Feed::Live { session, .. } => Some(Arc::clone(session)),
            _ => None,
        }
    }

    /// Bytes queued and not yet handed to the device
    pub fn buffered_bytes(&self) -> usize {
        self.session().map_or(0, |session| session.buffered_bytes())
    }

    /// Bytes that can be queued before chunks start being dropped
    pub fn free_bytes(&self) -> usize {
        self.session().map_or(0, |session| session.free_bytes())
    }

    /// Ring capacity in bytes, zero when not active
    pub fn capacity(&self) -> usize {
        self.session().map_or(0, |session| session.capacity())
    }

    /// Playback time of the queued audio
    pub fn buffered_duration(&self) -> Duration {
        let feed = self.feed.read().clone();
        match feed {
            Feed::Live { session, format } => format.duration_of(session.buffered_bytes()),
            _ => Duration::ZERO,
        }
    }

    /// Snapshot of the engine counters.
    ///
    /// Counters accumulate across reconfigurations; buffered bytes and
    /// capacity describe the current ring only.
    pub fn stats(&self) -> EngineStats {
        let counters = &self.counters;
        let (buffered_bytes, capacity) = self
            .session()
            .map_or((0, 0), |session| (session.buffered_bytes(), session.capacity()));

        EngineStats {
            chunks_accepted: counters.chunks_accepted.load(Ordering::Relaxed),
            chunks_dropped: counters.chunks_dropped.load(Ordering::Relaxed),
            bytes_accepted: counters.bytes_accepted.load(Ordering::Relaxed),
            bytes_dropped: counters.bytes_dropped.load(Ordering::Relaxed),
            callbacks: counters.callbacks.load(Ordering::Relaxed),
            underruns: counters.underruns.load(Ordering::Relaxed),
            bytes_rendered: counters.bytes_rendered.load(Ordering::Relaxed),
            buffered_bytes,
            capacity,
        }
    }
}

impl<B: OutputBackend> Drop for PlaybackEngine<B> {
    fn drop(&mut self) {
        self.deinitialize();
    }
}
