//! Error types for the waveform pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, WaveError>;

/// Errors surfaced by the engine and its collaborators.
///
/// Expected DSP edge cases (silence, no detectable pitch) are not errors: the
/// analysis functions return `None` and the pipeline degrades instead.
#[derive(Debug, Error)]
pub enum WaveError {
    /// Waveform shorter than two samples.
    #[error("waveform needs at least 2 samples, got {len}")]
    TooShort {
        /// Offending length.
        len: usize,
    },

    /// FFT synthesis requested on a length that is not a power of two.
    #[error("waveform length {len} is not a power of two")]
    NotPowerOfTwo {
        /// Offending length.
        len: usize,
    },

    /// A recording carried no samples or an unusable sample rate.
    #[error("recording is empty or has an invalid sample rate ({sample_rate} Hz)")]
    EmptyRecording {
        /// Reported sample rate.
        sample_rate: f32,
    },

    /// Captured audio could not be decoded.
    #[error("could not decode audio: {0}")]
    Decode(#[from] hound::Error),

    /// An input device or the audio engine is not available.
    #[error("{what} unavailable: {reason}")]
    Unavailable {
        /// Which resource.
        what: &'static str,
        /// Why it could not be acquired.
        reason: String,
    },
}

/// Coarse classification used by callers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad waveform; the prior spectrum stays in effect.
    InvalidInput,
    /// Capture could not be decoded; the session returns to its pre-capture state.
    DecodeFailure,
    /// Device or engine missing; the user gets a retry action.
    ResourceUnavailable,
}

impl WaveError {
    /// Creates a resource-unavailable error.
    pub fn unavailable(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            what,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WaveError::TooShort { .. } | WaveError::NotPowerOfTwo { .. } => ErrorKind::InvalidInput,
            WaveError::EmptyRecording { .. } | WaveError::Decode(_) => ErrorKind::DecodeFailure,
            WaveError::Unavailable { .. } => ErrorKind::ResourceUnavailable,
        }
    }
}
