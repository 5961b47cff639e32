use std::sync::Arc;

use crate::{dsp::fft::ifft, waveform::SpectralCoefficients};

/*
Periodic Oscillator
===================

A drawn cycle can hold up to N/2 harmonics. Played back at 880 Hz, harmonic
40 already sits at 35 kHz, above Nyquist at 48 kHz, and would fold back as
inharmonic aliasing. So a voice never plays the raw cycle. It plays a
wavetable rebuilt from the spectrum with only the harmonics that fit below
Nyquist at that voice's frequency:

    spectrum ──(drop k·f ≥ sr/2, drop DC)──→ X[k] ──(inverse FFT)──→ table

Bins are laid out Hermitian-symmetric (X[N-k] = conj X[k]) so the inverse
transform is real:

    Re X[k] =  cosine[k] · N/2
    Im X[k] = -sine[k]   · N/2

The DC term is not played: an offset would only add a thump on note-on. The
table is then normalized to a peak of 1.0 so every drawing plays at the same
level regardless of how large it was drawn.

Playback is a phase accumulator in [0, 1) reading the table with linear
interpolation.
*/

/// Samples per oscillator table.
pub const WAVETABLE_LEN: usize = 2048;

/// One band-limited, peak-normalized cycle ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    samples: Box<[f32]>,
}

impl Wavetable {
    /// Build the table for a voice at `frequency`.
    pub fn from_spectrum(spectrum: &SpectralCoefficients, frequency: f32, sample_rate: f32) -> Self {
        let n = WAVETABLE_LEN;
        let nyquist = sample_rate / 2.0;
        let half = n as f64 / 2.0;

        let mut re = vec![0.0f64; n];
        let mut im = vec![0.0f64; n];
        for k in 1..=spectrum.harmonics().min(n / 2 - 1) {
            if k as f32 * frequency >= nyquist {
                break;
            }
            re[k] = spectrum.cosine()[k] as f64 * half;
            im[k] = -(spectrum.sine()[k] as f64) * half;
            re[n - k] = re[k];
            im[n - k] = -im[k];
        }
        ifft(&mut re, &mut im);

        let peak = re.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()));
        let scale = if peak > 1e-12 { 1.0 / peak } else { 0.0 };
        let samples = re.iter().map(|&x| (x * scale) as f32).collect();

        Self { samples }
    }

    /// Plain sine, played when no waveform has been set.
    pub fn sine() -> Self {
        let samples = (0..WAVETABLE_LEN)
            .map(|i| (std::f32::consts::TAU * i as f32 / WAVETABLE_LEN as f32).sin())
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Interpolated value at `phase` in [0, 1).
    #[inline]
    pub fn lookup(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        let pos = phase * len as f32;
        let i0 = (pos as usize) % len;
        let i1 = (i0 + 1) % len;
        let frac = pos - pos.floor();
        self.samples[i0] + (self.samples[i1] - self.samples[i0]) * frac
    }
}

/// Phase accumulator over a shared [`Wavetable`].
///
/// Allocation-free once constructed; swapping tables keeps the phase so a
/// spectrum change does not click.
pub struct PeriodicOscillator {
    table: Arc<Wavetable>,
    phase: f32,
    increment: f32,
}

impl PeriodicOscillator {
    pub fn new(table: Arc<Wavetable>, frequency: f32, sample_rate: f32) -> Self {
        Self {
            table,
            phase: 0.0,
            increment: frequency / sample_rate,
        }
    }

    /// Swap in a new table, returning the old one.
    pub fn set_table(&mut self, table: Arc<Wavetable>) -> Arc<Wavetable> {
        std::mem::replace(&mut self.table, table)
    }

    /// Reuse this oscillator for a new note, starting from phase 0.
    pub fn restart(&mut self, table: Arc<Wavetable>, frequency: f32, sample_rate: f32) -> Arc<Wavetable> {
        self.phase = 0.0;
        self.increment = frequency / sample_rate;
        self.set_table(table)
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = self.table.lookup(self.phase);
        self.phase += self.increment;
        self.phase -= self.phase.floor();
        value
    }

    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
