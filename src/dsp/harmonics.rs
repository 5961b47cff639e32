//! Harmonic analysis: waveform → Fourier-series coefficients.
//!
//! Two strategies share one entry point. `Fft` resolves every harmonic the
//! cycle can hold (H = N/2) in O(N log N) but needs a power-of-two length.
//! `Direct` correlates the cycle against each harmonic up to a cap, which is
//! O(N·H) and accepts any length.

use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::fft::fft, waveform::SpectralCoefficients};

/// Harmonic count used by [`AnalysisStrategy::Direct`] when none is given.
pub const DEFAULT_HARMONIC_CAP: usize = 64;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStrategy {
    /// Full resolution via the FFT: harmonics 0..=N/2.
    #[default]
    Fft,
    /// Per-harmonic correlation sums for harmonics 0..=`harmonics`.
    Direct { harmonics: usize },
}

impl AnalysisStrategy {
    pub fn direct() -> Self {
        Self::Direct {
            harmonics: DEFAULT_HARMONIC_CAP,
        }
    }

    /// Compute the Fourier series of one cycle.
    ///
    /// Returns `None` when the cycle is shorter than two samples, or when the
    /// FFT strategy gets a length that is not a power of two.
    pub fn synthesize(&self, samples: &[f32]) -> Option<SpectralCoefficients> {
        if samples.len() < 2 {
            return None;
        }
        match *self {
            AnalysisStrategy::Fft => synthesize_fft(samples),
            AnalysisStrategy::Direct { harmonics } => Some(synthesize_direct(samples, harmonics)),
        }
    }
}

fn synthesize_fft(samples: &[f32]) -> Option<SpectralCoefficients> {
    let n = samples.len();
    if !n.is_power_of_two() {
        return None;
    }

    let mut re: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let mut im = vec![0.0f64; n];
    fft(&mut re, &mut im);

    // Real input: X[N-k] = conj(X[k]), so the two-sided spectrum folds into
    // a one-sided series with doubled amplitudes.
    let h = n / 2;
    let scale = 2.0 / n as f64;
    let mut cosine = Vec::with_capacity(h + 1);
    let mut sine = Vec::with_capacity(h + 1);
    cosine.push((re[0] / n as f64) as f32);
    sine.push(0.0);
    for k in 1..=h {
        cosine.push((scale * re[k]) as f32);
        sine.push((-scale * im[k]) as f32);
    }

    Some(SpectralCoefficients::from_parts(cosine, sine))
}

fn synthesize_direct(samples: &[f32], harmonics: usize) -> SpectralCoefficients {
    let n = samples.len();
    let mut cosine = vec![0.0f32; harmonics + 1];
    let mut sine = vec![0.0f32; harmonics + 1];

    let dc: f64 = samples.iter().map(|&s| s as f64).sum();
    cosine[0] = (dc / n as f64) as f32;

    let scale = 2.0 / n as f64;
    for k in 1..=harmonics {
        let mut a = 0.0;
        let mut b = 0.0;
        for (i, &x) in samples.iter().enumerate() {
            let (s, c) = (TAU * k as f64 * i as f64 / n as f64).sin_cos();
            a += x as f64 * c;
            b += x as f64 * s;
        }
        cosine[k] = (scale * a) as f32;
        sine[k] = (scale * b) as f32;
    }

    SpectralCoefficients::from_parts(cosine, sine)
}
