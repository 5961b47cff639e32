//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::harmonics::AnalysisStrategy, WAVEFORM_RESOLUTION};

/// How voice gains are assigned as polyphony changes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GainPolicy {
    /// Every voice plays at `master_gain`. Heavy chords can clip.
    Fixed,
    /// Every voice plays at `master_gain / active_voices`, recomputed on each
    /// play/stop, so the summed output never exceeds `master_gain`.
    #[default]
    Normalized,
}

/// What the live tap feeding the oscilloscope carries.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeSource {
    /// A silent oscillator at the display frequency playing the current spectrum.
    #[default]
    Monitor,
    /// The mixed output of all sounding voices.
    Output,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Samples per drawn/captured cycle (power of two for FFT analysis).
    pub resolution: usize,
    pub analysis: AnalysisStrategy,
    pub gain_policy: GainPolicy,
    /// Output ceiling shared by all voices (0.0–1.0).
    pub master_gain: f32,
    /// Frequency (Hz) whose period the oscilloscope shows.
    pub display_frequency: f32,
    /// Length of the live tap window read each frame.
    pub scope_window: usize,
    /// Upper bound on alignment offsets tried per frame.
    pub search_limit: usize,
    pub scope_source: ScopeSource,
    /// Voice slots preallocated in the renderer.
    pub max_voices: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: WAVEFORM_RESOLUTION,
            analysis: AnalysisStrategy::Fft,
            gain_policy: GainPolicy::Normalized,
            master_gain: 0.2,
            display_frequency: 440.0,
            scope_window: 2048,
            search_limit: 1024,
            scope_source: ScopeSource::Monitor,
            max_voices: 18,
        }
    }
}

impl EngineConfig {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution.max(2);
        self
    }

    pub fn with_analysis(mut self, analysis: AnalysisStrategy) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn with_gain_policy(mut self, policy: GainPolicy) -> Self {
        self.gain_policy = policy;
        self
    }

    pub fn with_master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain.clamp(0.0, 1.0);
        self
    }

    pub fn with_display_frequency(mut self, hz: f32) -> Self {
        self.display_frequency = hz.clamp(20.0, 20_000.0);
        self
    }

    pub fn with_scope_window(mut self, len: usize) -> Self {
        self.scope_window = len.max(2);
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn with_scope_source(mut self, source: ScopeSource) -> Self {
        self.scope_source = source;
        self
    }

    pub fn with_max_voices(mut self, voices: usize) -> Self {
        self.max_voices = voices.max(1);
        self
    }
}
