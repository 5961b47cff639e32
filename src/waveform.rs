//! Single-cycle waveforms and the harmonic spectra derived from them.

use std::{f32::consts::TAU, fmt, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveError};

/// One period of a sound as samples in [-1.0, 1.0].
///
/// The samples live behind an `Arc<[f32]>`, so a `Waveform` is immutable once
/// built and clones are cheap. Whoever publishes a waveform to the engine
/// cannot change it afterwards; editing means building a new one.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<f32>", into = "Vec<f32>")
)]
#[derive(Clone, PartialEq)]
pub struct Waveform {
    samples: Arc<[f32]>,
}

impl Waveform {
    /// Build a waveform from raw samples, clamping each into [-1.0, 1.0].
    ///
    /// Non-finite samples become 0.0.
    pub fn new(samples: impl Into<Vec<f32>>) -> Result<Self> {
        let mut samples = samples.into();
        if samples.len() < 2 {
            return Err(WaveError::TooShort { len: samples.len() });
        }
        for s in samples.iter_mut() {
            *s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
        }
        Ok(Self {
            samples: samples.into(),
        })
    }

    /// A flat (silent) cycle, the canvas starting point.
    pub fn silent(len: usize) -> Result<Self> {
        Self::new(vec![0.0; len])
    }

    pub fn from_shape(shape: WaveShape, len: usize) -> Result<Self> {
        let samples: Vec<f32> = (0..len)
            .map(|i| shape.sample(i as f32 / len as f32))
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the cycle (its DC offset).
    pub fn mean(&self) -> f32 {
        let sum: f64 = self.samples.iter().map(|&s| s as f64).sum();
        (sum / self.samples.len() as f64) as f32
    }

    /// Copy the samples out for editing.
    pub fn to_vec(&self) -> Vec<f32> {
        self.samples.to_vec()
    }
}

impl fmt::Debug for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waveform")
            .field("len", &self.samples.len())
            .finish()
    }
}

impl TryFrom<Vec<f32>> for Waveform {
    type Error = WaveError;

    fn try_from(samples: Vec<f32>) -> Result<Self> {
        Self::new(samples)
    }
}

impl From<Waveform> for Vec<f32> {
    fn from(waveform: Waveform) -> Self {
        waveform.to_vec()
    }
}

/// Starter shapes for the drawing canvas.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl WaveShape {
    /// Value at `phase` in [0, 1).
    fn sample(self, phase: f32) -> f32 {
        match self {
            WaveShape::Sine => (TAU * phase).sin(),
            WaveShape::Saw => 2.0 * phase - 1.0,
            WaveShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// Fourier series of one [`Waveform`].
///
/// `cosine[k]` and `sine[k]` are the amplitudes of harmonic `k`; index 0
/// holds the DC offset in `cosine[0]` and a zero in `sine[0]`. Built once by
/// the harmonic synthesizer and shared read-only (usually behind an `Arc`).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralCoefficients {
    cosine: Box<[f32]>,
    sine: Box<[f32]>,
}

impl SpectralCoefficients {
    /// Both slices must have the same length (H + 1).
    pub(crate) fn from_parts(cosine: Vec<f32>, mut sine: Vec<f32>) -> Self {
        debug_assert_eq!(cosine.len(), sine.len());
        if let Some(s0) = sine.first_mut() {
            *s0 = 0.0;
        }
        Self {
            cosine: cosine.into_boxed_slice(),
            sine: sine.into_boxed_slice(),
        }
    }

    /// A pure sine at harmonic 1, used when nothing has been drawn yet.
    pub fn sine_fallback() -> Self {
        Self::from_parts(vec![0.0, 0.0], vec![0.0, 1.0])
    }

    pub fn cosine(&self) -> &[f32] {
        &self.cosine
    }

    pub fn sine(&self) -> &[f32] {
        &self.sine
    }

    /// Highest harmonic index H.
    pub fn harmonics(&self) -> usize {
        self.cosine.len().saturating_sub(1)
    }

    pub fn dc(&self) -> f32 {
        self.cosine.first().copied().unwrap_or(0.0)
    }

    /// Amplitude of harmonic `k` (0.0 past the last harmonic).
    pub fn magnitude(&self, k: usize) -> f32 {
        match (self.cosine.get(k), self.sine.get(k)) {
            (Some(c), Some(s)) => c.hypot(*s),
            _ => 0.0,
        }
    }
}
