//! Real-world scenario benchmarks.
//!
//! These model what the application does: republishing a waveform while
//! the user draws, and rendering chords in the audio callback.

mod chords;
mod publish;

pub use chords::bench_chords;
pub use publish::bench_publish;
