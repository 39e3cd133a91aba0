//! Output backend without hardware, driven by hand.
//!
//! [`ManualBackend`] plugs into a [`PlaybackEngine`](super::PlaybackEngine)
//! like any device; the paired [`ManualDevice`] plays the hardware queue on
//! demand. Useful for headless hosts, offline rendering and tests.

use super::{
    hardware_queue::{HardwareQueue, Renderer},
    traits::{OutputBackend, OutputStream, StreamFormat},
};
use crate::error::PlaybackResult;
use parking_lot::Mutex;
use std::sync::Arc;

struct Attached {
    queue: HardwareQueue,
    renderer: Renderer,
    format: StreamFormat,
}

#[derive(Default)]
struct DeviceSlot {
    attached: Option<Attached>,
    last_renderer: Option<Renderer>,
    open_count: usize,
}

/// Backend half handed to the engine.
pub struct ManualBackend {
    slot: Arc<Mutex<DeviceSlot>>,
}

/// Device half kept by the caller to drive playback.
#[derive(Clone)]
pub struct ManualDevice {
    slot: Arc<Mutex<DeviceSlot>>,
}

/// Stream handle returned by [`ManualBackend::open`](OutputBackend::open).
pub struct ManualStream {
    slot: Arc<Mutex<DeviceSlot>>,
}

impl ManualBackend {
    /// Create a backend and the device handle that drives it.
    pub fn new() -> (Self, ManualDevice) {
        let slot = Arc::new(Mutex::new(DeviceSlot::default()));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            ManualDevice { slot },
        )
    }
}

impl OutputBackend for ManualBackend {
    type Stream = ManualStream;

    fn open(
        &mut self,
        format: &StreamFormat,
        queue: HardwareQueue,
        renderer: Renderer,
    ) -> PlaybackResult<Self::Stream> {
        let mut slot = self.slot.lock();
        slot.last_renderer = Some(renderer.clone());
        slot.attached = Some(Attached {
            queue,
            renderer,
            format: *format,
        });
        slot.open_count += 1;

        Ok(ManualStream {
            slot: Arc::clone(&self.slot),
        })
    }
}

impl OutputStream for ManualStream {
    fn close(self) -> PlaybackResult<()> {
        drop(self);
        Ok(())
    }
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        self.slot.lock().attached = None;
    }
}

impl ManualDevice {
    /// Check if a stream is currently open
    pub fn is_running(&self) -> bool {
        self.slot.lock().attached.is_some()
    }

    /// Number of streams opened so far
    pub fn open_count(&self) -> usize {
        self.slot.lock().open_count
    }

    /// Format of the open stream
    pub fn format(&self) -> Option<StreamFormat> {
        self.slot.lock().attached.as_ref().map(|attached| attached.format)
    }

    /// Play `byte_count` bytes out of the hardware queue.
    ///
    /// Returns `None` when no stream is open.
    pub fn play(&self, byte_count: usize) -> Option<Vec<u8>> {
        let mut slot = self.slot.lock();
        let attached = slot.attached.as_mut()?;
        let mut out = vec![0u8; byte_count];
        attached.queue.pull(&mut out, &attached.renderer);
        Some(out)
    }

    /// Play exactly one hardware buffer.
    pub fn play_buffer(&self) -> Option<Vec<u8>> {
        let byte_count = self.format()?.hardware_buffer_byte_size;
        self.play(byte_count)
    }

    /// Invoke the render callback once, bypassing the queue.
    ///
    /// Uses the most recent renderer even after its stream was closed, the
    /// way a late callback can still arrive while a device is being torn
    /// down. Returns `None` when the callback declined to touch the ring.
    pub fn fire_callback(&self) -> Option<Vec<u8>> {
        let renderer = self.slot.lock().last_renderer.clone()?;
        let mut out = vec![0u8; renderer.buffer_byte_size()];
        let reported = renderer.render(&mut out)?;
        out.truncate(reported);
        Some(out)
    }
}
