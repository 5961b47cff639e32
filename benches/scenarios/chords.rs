//! Rendering chords through the realtime path.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavesketch::{synth, Engine, EngineConfig, WaveShape, Waveform};

use crate::BLOCK_SIZES;

const CHORD: &[f32] = &[261.63, 329.63, 392.0, 493.88, 587.33, 698.46, 880.0, 1046.5];

pub fn bench_chords(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chords");

    for &voices in &[1usize, 4, 8] {
        let config = EngineConfig::default();
        let (backend, mut renderer) = synth::channel(&config, 48_000.0);
        let mut engine = Engine::new(backend, config);
        if let Ok(saw) = Waveform::from_shape(WaveShape::Saw, 2048) {
            let _ = engine.set_waveform(saw);
        }
        for &frequency in &CHORD[..voices] {
            engine.play(frequency);
        }

        for &size in BLOCK_SIZES {
            let mut buffer = vec![0.0f32; size];
            renderer.render_block(&mut buffer);

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), size),
                &size,
                |b, _| b.iter(|| renderer.render_block(black_box(&mut buffer))),
            );
        }
    }

    group.finish();
}
