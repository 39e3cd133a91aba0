//! Cost of the ring buffer operations on the feed and render paths.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use realtime_audio_player::RingBuffer;
use realtime_audio_player::playback::{EngineConfig, ManualBackend, PlaybackEngine};

fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer_write_read");

    for &chunk in &[256usize, 4096, 65536] {
        let data = vec![0x5Au8; chunk];
        let mut out = vec![0u8; chunk];
        let mut ring = RingBuffer::new(chunk * 3 + 17).unwrap();

        group.throughput(Throughput::Bytes(chunk as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, _| {
            b.iter(|| {
                ring.write(black_box(&data)).unwrap();
                assert!(ring.read_into(black_box(&mut out)));
            });
        });
    }

    group.finish();
}

fn bench_render_callback(c: &mut Criterion) {
    let (backend, device) = ManualBackend::new();
    let engine = PlaybackEngine::with_config(backend, EngineConfig::low_latency());
    engine.initialize(4096, 48000.0, 2).unwrap();
    let chunk = vec![0x11u8; 4096];

    c.bench_function("enqueue_and_render_4096", |b| {
        b.iter(|| {
            let _ = engine.enqueue(black_box(&chunk)).unwrap();
            black_box(device.fire_callback().unwrap());
        });
    });
}

criterion_group!(benches, bench_write_read, bench_render_callback);
criterion_main!(benches);
