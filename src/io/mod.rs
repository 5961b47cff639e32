// Purpose - getting sound and notes into the engine

pub mod keyboard;
pub mod wav;

use crate::error::{Result, WaveError};

/// Decoded mono PCM handed over by a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl Recording {
    /// Fails with [`WaveError::EmptyRecording`] when there is nothing to analyse.
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Result<Self> {
        if samples.is_empty() || !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(WaveError::EmptyRecording { sample_rate });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Length in seconds.
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate
    }
}
