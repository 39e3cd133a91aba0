//! Streams a 440 Hz tone to the default output device in irregular chunks,
//! the way a socket client would deliver audio.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example stream_tone --features playback
//! ```

use realtime_audio_player::playback::{CpalBackend, EngineConfig, PlaybackEngine};
use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: f64 = 48_000.0;
const CHANNELS: u32 = 2;
const HARDWARE_BUFFER_BYTES: u32 = 4096;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = PlaybackEngine::with_config(CpalBackend::new(), EngineConfig::jitter_tolerant());
    engine.initialize(HARDWARE_BUFFER_BYTES, SAMPLE_RATE, CHANNELS)?;

    let started = Instant::now();
    let mut phase = 0.0f64;
    let mut chunk_index = 0usize;

    while started.elapsed() < Duration::from_secs(3) {
        // 5 to 45 ms of audio per chunk, delivered roughly in real time.
        let frames = (SAMPLE_RATE as usize / 1000) * (5 + (chunk_index * 17) % 41);
        let mut chunk = Vec::with_capacity(frames * CHANNELS as usize * 2);
        for _ in 0..frames {
            let sample = ((phase.sin() * 0.2) * i16::MAX as f64) as i16;
            phase = (phase + TAU * 440.0 / SAMPLE_RATE) % TAU;
            for _ in 0..CHANNELS {
                chunk.extend_from_slice(&sample.to_ne_bytes());
            }
        }

        if !engine.enqueue(&chunk)?.is_accepted() {
            tracing::warn!("chunk {} dropped", chunk_index);
        }
        chunk_index += 1;
        thread::sleep(Duration::from_secs_f64(frames as f64 / SAMPLE_RATE * 0.9));
    }

    thread::sleep(engine.buffered_duration());
    let stats = engine.stats();
    tracing::info!(
        "Sent {} chunks, {} callbacks, {} underruns, {} dropped",
        stats.chunks_accepted + stats.chunks_dropped,
        stats.callbacks,
        stats.underruns,
        stats.chunks_dropped
    );

    engine.deinitialize();
    Ok(())
}
