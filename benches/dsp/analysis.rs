//! Benchmarks for the FFT and harmonic synthesis.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavesketch::dsp::fft::fft;
use wavesketch::{AnalysisStrategy, WaveShape, Waveform};

pub fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/fft");

    for &size in &[256usize, 1024, 2048, 8192] {
        let signal: Vec<f64> = (0..size)
            .map(|i| (std::f64::consts::TAU * 5.0 * i as f64 / size as f64).sin())
            .collect();
        let mut re = signal.clone();
        let mut im = vec![0.0f64; size];

        group.bench_with_input(BenchmarkId::new("forward", size), &size, |b, _| {
            b.iter(|| {
                re.copy_from_slice(&signal);
                im.fill(0.0);
                fft(black_box(&mut re), black_box(&mut im));
            })
        });
    }

    group.finish();
}

pub fn bench_harmonics(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/harmonics");

    for &size in &[512usize, 2048] {
        let Ok(saw) = Waveform::from_shape(WaveShape::Saw, size) else {
            continue;
        };

        // O(N log N), all N/2 harmonics
        let strategy = AnalysisStrategy::Fft;
        group.bench_with_input(BenchmarkId::new("fft", size), &size, |b, _| {
            b.iter(|| strategy.synthesize(black_box(saw.samples())))
        });

        // O(N * H) correlation against the first 64 harmonics
        let strategy = AnalysisStrategy::direct();
        group.bench_with_input(BenchmarkId::new("direct", size), &size, |b, _| {
            b.iter(|| strategy.synthesize(black_box(saw.samples())))
        });
    }

    group.finish();
}
