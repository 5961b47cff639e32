//! Benchmarks for analysis and synthesis primitives.

mod analysis;
mod oscillator;
mod pitch;

pub use analysis::{bench_fft, bench_harmonics};
pub use oscillator::bench_wavetable;
pub use pitch::{bench_align, bench_pitch};
