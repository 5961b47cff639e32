//! Signal-processing primitives behind the waveform pipeline.
//!
//! Everything here is plain math over slices: no engine state, no logging on
//! the hot paths, and (except for wavetable construction) no allocation per
//! sample. The engine and the scope driver compose these into the draw/record
//! → spectrum → playback → display flow.

/// Scope alignment by circular cross-correlation.
pub mod align;
/// Single-cycle extraction and resampling of recordings.
pub mod cycle;
/// In-place radix-2 FFT and its inverse.
pub mod fft;
/// Waveform → Fourier-series coefficients.
pub mod harmonics;
/// Band-limited wavetable oscillator built from a spectrum.
pub mod oscillator;
/// Autocorrelation pitch detection.
pub mod pitch;

pub use harmonics::AnalysisStrategy;
pub use oscillator::{PeriodicOscillator, Wavetable};
pub use pitch::{detect_pitch, PitchEstimate};
