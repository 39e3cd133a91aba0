//! Hardware buffer queue and the render callback that refills it.
//!
//! A device plays a small, fixed set of hardware buffers in submission order.
//! Every buffer is zero-filled (primed) before the device starts, so the first
//! callbacks play silence while the feed path has not produced anything yet.
//! When a buffer has been played completely it goes to the [`Renderer`], which
//! copies the next block out of the ring (or silence), and is re-submitted at
//! the tail of the queue.

use crate::error::PlaybackResult;
use crate::ring_buffer::RingBuffer;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters shared by every session of one engine.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) chunks_accepted: AtomicU64,
    pub(crate) chunks_dropped: AtomicU64,
    pub(crate) bytes_accepted: AtomicU64,
    pub(crate) bytes_dropped: AtomicU64,
    pub(crate) callbacks: AtomicU64,
    pub(crate) underruns: AtomicU64,
    pub(crate) bytes_rendered: AtomicU64,
}

/// State owned by one `initialize` .. `deinitialize` span.
///
/// The ring lives here, behind a single lock taken by both the feed path and
/// the render path. `live` is cleared under that lock at teardown, so once
/// teardown returns no callback can touch the ring again.
#[derive(Debug)]
pub(crate) struct Session {
    ring: Mutex<RingBuffer>,
    live: AtomicBool,
    hardware_buffer_byte_size: usize,
    counters: Arc<Counters>,
}

impl Session {
    pub(crate) fn new(
        ring: RingBuffer,
        hardware_buffer_byte_size: usize,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            ring: Mutex::new(ring),
            live: AtomicBool::new(true),
            hardware_buffer_byte_size,
            counters,
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Break the callback's path to the ring.
    pub(crate) fn retire(&self) {
        let _ring = self.ring.lock();
        self.live.store(false, Ordering::Release);
    }

    /// Feed-path write. `None` means the session was retired concurrently.
    pub(crate) fn write(&self, data: &[u8]) -> Option<PlaybackResult<()>> {
        let mut ring = self.ring.lock();
        if !self.is_live() {
            return None;
        }
        Some(ring.write(data))
    }

    pub(crate) fn buffered_bytes(&self) -> usize {
        self.ring.lock().available()
    }

    pub(crate) fn free_bytes(&self) -> usize {
        self.ring.lock().free()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    pub(crate) fn counters(&self) -> &Counters {
        &self.counters
    }
}

/// The device's handle back into the engine.
///
/// Holding a `Renderer` never keeps a session "live": after teardown every
/// call to [`render`](Self::render) returns `None` without touching the ring.
#[derive(Debug, Clone)]
pub struct Renderer {
    session: Arc<Session>,
}

impl Renderer {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Bytes requested from the engine on every callback.
    pub fn buffer_byte_size(&self) -> usize {
        self.session.hardware_buffer_byte_size
    }

    /// Whether the engine behind this renderer is still active.
    pub fn is_live(&self) -> bool {
        self.session.is_live()
    }

    /// Fill one hardware buffer.
    ///
    /// Copies `out.len()` bytes from the ring when that many are buffered,
    /// otherwise fills `out` with silence. Either way the full length is
    /// reported. Returns `None` once the engine has been torn down, in which
    /// case `out` is left untouched.
    pub fn render(&self, out: &mut [u8]) -> Option<usize> {
        if !self.session.is_live() {
            return None;
        }

        // Counters are updated under the ring lock so nothing is recorded
        // for a session once teardown has returned.
        let mut ring = self.session.ring.lock();
        if !self.session.is_live() {
            return None;
        }

        let counters = self.session.counters();
        if !ring.read_into(out) {
            out.fill(0);
            counters.underruns.fetch_add(1, Ordering::Relaxed);
        }
        counters.callbacks.fetch_add(1, Ordering::Relaxed);
        counters
            .bytes_rendered
            .fetch_add(out.len() as u64, Ordering::Relaxed);

        Some(out.len())
    }
}

#[derive(Debug)]
struct HardwareBuffer {
    data: Box<[u8]>,
    len: usize,
}

/// Fixed set of hardware buffers cycled by a device.
///
/// All memory is allocated in [`primed`](Self::primed); [`pull`](Self::pull)
/// only copies.
#[derive(Debug)]
pub struct HardwareQueue {
    buffers: Box<[HardwareBuffer]>,
    current: usize,
    cursor: usize,
}

impl HardwareQueue {
    /// Allocate `count` buffers of `byte_size` bytes, each submitted full of silence.
    pub fn primed(byte_size: usize, count: usize) -> Self {
        let buffers = (0..count)
            .map(|_| HardwareBuffer {
                data: vec![0u8; byte_size].into_boxed_slice(),
                len: byte_size,
            })
            .collect();

        Self {
            buffers,
            current: 0,
            cursor: 0,
        }
    }

    /// Number of buffers cycled by the queue.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of buffers still submitted to the device.
    pub fn submitted(&self) -> usize {
        self.buffers.iter().filter(|buffer| buffer.len > 0).count()
    }

    /// Play `out.len()` bytes out of the queue.
    ///
    /// Buffers are recycled through `renderer` as soon as they have been
    /// played out. Once the queue has drained (after teardown) the rest of
    /// `out` is silence.
    pub fn pull(&mut self, out: &mut [u8], renderer: &Renderer) {
        let mut written = 0;

        while written < out.len() {
            let Some(buffer) = self.buffers.get(self.current) else {
                break;
            };
            if buffer.len == 0 {
                break;
            }

            let count = (buffer.len - self.cursor).min(out.len() - written);
            out[written..written + count]
                .copy_from_slice(&buffer.data[self.cursor..self.cursor + count]);
            self.cursor += count;
            written += count;

            if self.cursor == buffer.len {
                self.recycle(renderer);
            }
        }

        out[written..].fill(0);
    }

    fn recycle(&mut self, renderer: &Renderer) {
        let buffer = &mut self.buffers[self.current];
        buffer.len = renderer.render(&mut buffer.data).unwrap_or(0);

        self.cursor = 0;
        self.current = (self.current + 1) % self.buffers.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(capacity: usize, buffer_size: usize) -> Arc<Session> {
        Arc::new(Session::new(
            RingBuffer::new(capacity).unwrap(),
            buffer_size,
            Arc::new(Counters::default()),
        ))
    }

    #[test]
    fn test_render_with_data() {
        let session = session(100, 4);
        session.write(&[1, 2, 3, 4, 5]).unwrap().unwrap();
        let renderer = Renderer::new(Arc::clone(&session));

        let mut out = [0u8; 4];
        assert_eq!(renderer.render(&mut out), Some(4));
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(session.buffered_bytes(), 1);
    }

    #[test]
    fn test_render_underrun_is_silence() {
        let session = session(100, 50);
        let renderer = Renderer::new(Arc::clone(&session));

        let mut out = [0xAAu8; 50];
        assert_eq!(renderer.render(&mut out), Some(50));
        assert_eq!(out, [0u8; 50]);
        assert_eq!(session.counters().underruns.load(Ordering::Relaxed), 1);
        assert_eq!(session.counters().callbacks.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_render_after_retire_touches_nothing() {
        let session = session(100, 4);
        session.write(&[1, 2, 3, 4]).unwrap().unwrap();
        let renderer = Renderer::new(Arc::clone(&session));
        session.retire();

        let mut out = [0xAAu8; 4];
        assert_eq!(renderer.render(&mut out), None);
        assert_eq!(out, [0xAAu8; 4]);
        assert!(!renderer.is_live());
        assert_eq!(session.buffered_bytes(), 4);
        assert!(session.write(&[5]).is_none());
    }

    #[test]
    fn test_primed_buffers_play_silence_first() {
        let session = session(100, 4);
        session.write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap().unwrap();
        let renderer = Renderer::new(Arc::clone(&session));
        let mut queue = HardwareQueue::primed(4, 2);

        let mut out = [0xAAu8; 16];
        queue.pull(&mut out, &renderer);
        assert_eq!(out, [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_pull_in_uneven_pieces() {
        let session = session(100, 4);
        session.write(&[1, 2, 3, 4]).unwrap().unwrap();
        let renderer = Renderer::new(Arc::clone(&session));
        let mut queue = HardwareQueue::primed(4, 2);

        let mut played = Vec::new();
        for size in [3, 5, 1, 3] {
            let mut out = vec![0xAAu8; size];
            queue.pull(&mut out, &renderer);
            played.extend(out);
        }
        assert_eq!(played, [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_queue_drains_after_teardown() {
        let session = session(100, 4);
        session.write(&[9; 8]).unwrap().unwrap();
        let renderer = Renderer::new(Arc::clone(&session));
        let mut queue = HardwareQueue::primed(4, 2);

        // Both primers are refilled with data before teardown.
        let mut out = [0u8; 8];
        queue.pull(&mut out, &renderer);
        assert_eq!(queue.submitted(), 2);

        session.retire();
        let mut out = [0xAAu8; 12];
        queue.pull(&mut out, &renderer);
        assert_eq!(out, [9, 9, 9, 9, 9, 9, 9, 9, 0, 0, 0, 0]);
        assert_eq!(queue.submitted(), 0);
    }
}
