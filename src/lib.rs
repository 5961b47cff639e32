pub mod config;
pub mod dsp; // Transform, analysis, and oscillator primitives
pub mod engine;
pub mod error;
pub mod io;
pub mod scope; // Oscilloscope alignment and frame pacing
pub mod synth; // Voice pool and realtime rendering
pub mod waveform;

pub use config::{EngineConfig, GainPolicy, ScopeSource};
pub use dsp::harmonics::AnalysisStrategy;
pub use engine::Engine;
pub use error::{ErrorKind, Result, WaveError};
pub use waveform::{SpectralCoefficients, WaveShape, Waveform};

/// Canonical single-cycle length used for drawn and captured waveforms.
pub const WAVEFORM_RESOLUTION: usize = 2048;
pub const MAX_BLOCK_SIZE: usize = 2048;
