//! Tests with the feed path and the device path on separate threads.

use super::small_engine;
use crate::error::{PlaybackError, PlaybackResult};
use crate::playback::{
    EngineConfig, EngineState, Enqueued, HardwareQueue, OutputBackend, OutputStream,
    PlaybackEngine, Renderer, StreamFormat,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Backend whose device takes a while to open and to close.
struct SlowBackend {
    open_delay: Duration,
    close_delay: Duration,
}

struct SlowStream {
    close_delay: Duration,
}

impl OutputBackend for SlowBackend {
    type Stream = SlowStream;

    fn open(
        &mut self,
        _format: &StreamFormat,
        _queue: HardwareQueue,
        _renderer: Renderer,
    ) -> PlaybackResult<SlowStream> {
        thread::sleep(self.open_delay);
        Ok(SlowStream {
            close_delay: self.close_delay,
        })
    }
}

impl OutputStream for SlowStream {
    fn close(self) -> PlaybackResult<()> {
        thread::sleep(self.close_delay);
        Ok(())
    }
}

fn slow_engine(open_delay: Duration, close_delay: Duration) -> Arc<PlaybackEngine<SlowBackend>> {
    let backend = SlowBackend {
        open_delay,
        close_delay,
    };
    Arc::new(PlaybackEngine::with_config(backend, EngineConfig::low_latency()))
}

/// Spin until the engine's ring has been switched out by a lifecycle call
/// running on another thread.
fn wait_for_ring_release<B: OutputBackend>(engine: &PlaybackEngine<B>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.capacity() != 0 {
        assert!(Instant::now() < deadline, "ring was never released");
        thread::yield_now();
    }
}

#[test]
fn test_concurrent_feed_and_playback_preserve_order() {
    const CHUNKS: usize = 400;
    const BUFFER: usize = 32;

    let (engine, device) = small_engine(64);
    engine.initialize(BUFFER as u32, 48000.0, 2).unwrap();
    let engine = Arc::new(engine);
    let done = Arc::new(AtomicBool::new(false));

    // Producer writes a running counter in irregular chunks and retries
    // dropped chunks, so the played stream must be that counter in order.
    let producer = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut next = 0u8;
            let mut sent = 0usize;
            for index in 0..CHUNKS {
                let size = 1 + (index * 7) % 45;
                let chunk: Vec<u8> = (0..size)
                    .map(|offset| next.wrapping_add(offset as u8))
                    .collect();
                while !engine.enqueue(&chunk).unwrap().is_accepted() {
                    thread::yield_now();
                }
                next = next.wrapping_add(size as u8);
                sent += size;
            }
            done.store(true, Ordering::Release);
            sent
        })
    };

    let mut played = Vec::new();
    loop {
        let finished = done.load(Ordering::Acquire);
        played.extend(device.play_buffer().unwrap());
        // A tail shorter than one hardware buffer is never played.
        if finished && engine.buffered_bytes() < BUFFER {
            for _ in 0..4 {
                played.extend(device.play_buffer().unwrap());
            }
            break;
        }
    }

    let sent = producer.join().unwrap();
    assert_eq!(engine.stats().bytes_accepted as usize, sent);

    // Underruns show up as whole hardware buffers of silence; without them
    // the audio must be the producer's counter, in order, without loss.
    let audio: Vec<u8> = played
        .chunks(BUFFER)
        .filter(|buffer| buffer.iter().any(|&byte| byte != 0))
        .flatten()
        .copied()
        .collect();
    assert_eq!(audio.len() + engine.buffered_bytes(), sent);
    for (index, &byte) in audio.iter().enumerate() {
        assert_eq!(byte, index as u8, "mismatch at byte {}", index);
    }
}

#[test]
fn test_teardown_while_device_thread_is_rendering() {
    let (engine, device) = small_engine(16);
    engine.initialize(64, 48000.0, 2).unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let player = {
        let device = device.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut late_callbacks = 0usize;
            while !stop.load(Ordering::Acquire) {
                if device.fire_callback().is_none() {
                    late_callbacks += 1;
                }
            }
            late_callbacks
        })
    };

    for _ in 0..50 {
        let _ = engine.enqueue(&[1u8; 100]);
    }
    engine.deinitialize();
    let rendered_after_stop = engine.stats().bytes_rendered;
    thread::sleep(std::time::Duration::from_millis(5));
    stop.store(true, Ordering::Release);

    player.join().unwrap();
    assert_eq!(engine.stats().bytes_rendered, rendered_after_stop);
    assert!(engine.enqueue(&[1u8; 4]).is_err());
}

#[test]
fn test_enqueue_does_not_wait_for_device_close() {
    let engine = slow_engine(Duration::ZERO, Duration::from_millis(300));
    engine.initialize(64, 48000.0, 2).unwrap();

    let control = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.deinitialize())
    };
    wait_for_ring_release(&engine);

    let started = Instant::now();
    let result = engine.enqueue(&[1u8; 8]);
    let waited = started.elapsed();

    assert!(matches!(result, Err(PlaybackError::NotInitialized)));
    assert!(waited < Duration::from_millis(100), "enqueue waited {:?}", waited);

    control.join().unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn test_enqueue_during_reconfigure_drops_without_waiting() {
    let engine = slow_engine(Duration::from_millis(200), Duration::ZERO);
    engine.initialize(64, 48000.0, 2).unwrap();

    let control = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.initialize(32, 48000.0, 2))
    };
    wait_for_ring_release(&engine);

    let started = Instant::now();
    let result = engine.enqueue(&[1u8; 8]).unwrap();
    let waited = started.elapsed();

    // The engine stays active across a reconfiguration; the chunk has no
    // ring to land in and is dropped like an overflow.
    assert_eq!(result, Enqueued::Dropped);
    assert!(waited < Duration::from_millis(100), "enqueue waited {:?}", waited);

    control.join().unwrap().unwrap();
    assert_eq!(engine.state(), EngineState::Active);
    assert!(engine.enqueue(&[1u8; 8]).unwrap().is_accepted());

    let stats = engine.stats();
    assert_eq!(stats.chunks_dropped, 1);
    assert_eq!(stats.chunks_accepted, 1);
    assert_eq!(stats.capacity, 32 * 16);
}
