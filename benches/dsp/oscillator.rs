//! Benchmarks for wavetable construction and playback.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use wavesketch::dsp::{PeriodicOscillator, Wavetable};
use wavesketch::{AnalysisStrategy, WaveShape, Waveform};

use crate::BLOCK_SIZES;

pub fn bench_wavetable(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavetable");

    let Some(spectrum) = Waveform::from_shape(WaveShape::Square, 2048)
        .ok()
        .and_then(|wf| AnalysisStrategy::Fft.synthesize(wf.samples()))
    else {
        return;
    };

    // Band-limiting keeps fewer harmonics as the note rises
    for &frequency in &[55.0f32, 440.0, 3520.0] {
        group.bench_with_input(
            BenchmarkId::new("build", frequency as u32),
            &frequency,
            |b, &frequency| b.iter(|| Wavetable::from_spectrum(black_box(&spectrum), frequency, 48_000.0)),
        );
    }

    let table = Arc::new(Wavetable::from_spectrum(&spectrum, 440.0, 48_000.0));
    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let mut osc = PeriodicOscillator::new(Arc::clone(&table), 440.0, 48_000.0);
        group.bench_with_input(BenchmarkId::new("render", size), &size, |b, _| {
            b.iter(|| osc.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
