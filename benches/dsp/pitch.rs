//! Benchmarks for pitch detection and scope alignment.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavesketch::dsp::{
    align::{aligned_period, find_alignment},
    detect_pitch,
};

const SAMPLE_RATE: f32 = 48_000.0;

fn sine(frequency: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (std::f32::consts::TAU * frequency * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

pub fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pitch");

    // A 500ms take, the length of one microphone capture
    let take_len = (SAMPLE_RATE * 0.5) as usize;
    for &frequency in &[110.0f32, 220.0, 880.0] {
        let take = sine(frequency, take_len);
        group.bench_with_input(
            BenchmarkId::new("autocorrelation", frequency as u32),
            &frequency,
            |b, _| b.iter(|| detect_pitch(black_box(&take), SAMPLE_RATE)),
        );
    }

    group.finish();
}

pub fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/align");

    // One 440Hz period against a scope window that trails it by a quarter cycle
    let period = (SAMPLE_RATE / 440.0) as usize;
    let reference = sine(440.0, period);
    let captured: Vec<f32> = (0..period)
        .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / SAMPLE_RATE + 1.57).sin())
        .collect();
    let mut out = Vec::with_capacity(period);

    for &limit in &[period / 4, period] {
        group.bench_with_input(BenchmarkId::new("find", limit), &limit, |b, &limit| {
            b.iter(|| find_alignment(black_box(&reference), black_box(&captured), limit))
        });
    }

    group.bench_function("aligned_period", |b| {
        b.iter(|| aligned_period(black_box(&reference), black_box(&captured), period, &mut out))
    });

    group.finish();
}
