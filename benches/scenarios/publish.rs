//! Cost of one canvas edit: analysis plus the monitor wavetable.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavesketch::{synth, AnalysisStrategy, Engine, EngineConfig, WaveShape, Waveform};

pub fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/publish");
    let mut drain = [0.0f32; 64];

    for (name, analysis) in [("fft", AnalysisStrategy::Fft), ("direct", AnalysisStrategy::direct())] {
        let config = EngineConfig::default().with_analysis(analysis);
        let (backend, mut renderer) = synth::channel(&config, 48_000.0);
        let mut engine = Engine::new(backend, config);
        let Ok(waveform) = Waveform::from_shape(WaveShape::Triangle, 2048) else {
            continue;
        };

        group.bench_with_input(BenchmarkId::new("set_waveform", name), &name, |b, _| {
            b.iter(|| {
                let spectrum = engine.set_waveform(black_box(waveform.clone()));
                // Consume the monitor update so the message ring never fills
                renderer.render_block(&mut drain);
                spectrum
            })
        });
    }

    group.finish();
}
