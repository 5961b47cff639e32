/*
Autocorrelation Pitch Detection
===============================

A periodic signal lines up with itself when shifted by one period. For every
candidate shift ("lag") L we measure how well the signal matches its shifted
copy with the normalized cross-correlation over the overlapping region:

                 Σ x[i]·x[i+L]
    r(L) = ───────────────────────────
           √( Σ x[i]² · Σ x[i+L]² )

r is 1.0 for a perfect match and is independent of loudness, so one threshold
works for whispers and shouts alike.


Search Band
-----------

Only lags between sr/2000 and sr/50 are tried (2000 Hz down to 50 Hz, which
covers the singing and speaking voice). The buffer must hold the longest lag,
otherwise there is nothing to compare.


Octave Errors
-------------

A signal periodic in T is also periodic in 2T, 3T, ... and on a clean tone
those multiples can score a hair higher than T itself because the overlap
window happens to line up better. Taking the raw maximum would then report
an octave (or more) too low. We take the first local peak whose score is
within OCTAVE_TOLERANCE of the best score instead:

    r(L)
     1 ┤      ╭╮          ╭╮          ╭╮
       │     ╱  ╲        ╱  ╲        ╱  ╲
       │    ╱    ╲      ╱    ╲      ╱    ╲
     0 ┼───╱──────╲────╱──────╲────╱──────╲──→ L
              T            2T          3T
              ↑ chosen

Sub-sample Refinement
---------------------

The true period rarely falls on an integer lag. Fitting a parabola through
r(L-1), r(L), r(L+1) and taking its vertex gives:

    shift = (r(L-1) - r(L+1)) / (2·(r(L-1) - 2·r(L) + r(L+1)))

The cost is O(band × N), fine for a half-second recording analysed once.
*/

/// Highest fundamental considered (Hz).
pub const MAX_FREQUENCY: f32 = 2000.0;
/// Lowest fundamental considered (Hz).
pub const MIN_FREQUENCY: f32 = 50.0;
/// RMS below which a buffer counts as silence.
pub const SILENCE_RMS: f64 = 0.01;
/// Minimum normalized correlation accepted as a pitch.
pub const MIN_CORRELATION: f64 = 0.5;
/// A peak within this fraction of the best score wins if it comes earlier.
pub const OCTAVE_TOLERANCE: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental period in samples (fractional).
    pub period: f64,
    /// Normalized correlation at the chosen lag.
    pub correlation: f64,
}

impl PitchEstimate {
    pub fn frequency(&self, sample_rate: f32) -> f64 {
        sample_rate as f64 / self.period
    }

    /// Period rounded to whole samples, as used for cycle extraction.
    pub fn whole_period(&self) -> usize {
        self.period.round().max(1.0) as usize
    }
}

/// Estimate the fundamental period of `samples`.
///
/// Returns `None` when the search band does not fit in the buffer, the
/// buffer is silent, or no lag correlates well enough.
pub fn detect_pitch(samples: &[f32], sample_rate: f32) -> Option<PitchEstimate> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return None;
    }

    let n = samples.len();
    let min_lag = ((sample_rate / MAX_FREQUENCY).floor() as usize).max(1);
    let max_lag = (sample_rate / MIN_FREQUENCY).ceil() as usize;
    if max_lag >= n {
        return None;
    }

    if rms(samples) < SILENCE_RMS {
        return None;
    }

    // scores[lag - min_lag]; None where one side of the overlap is silent
    let scores: Vec<Option<f64>> = (min_lag..=max_lag)
        .map(|lag| normalized_correlation(samples, lag))
        .collect();
    let score = |lag: usize| scores[lag - min_lag];

    let (best_lag, best_score) = (min_lag..=max_lag)
        .filter_map(|lag| score(lag).map(|s| (lag, s)))
        .fold(None, |acc: Option<(usize, f64)>, (lag, s)| match acc {
            Some((_, best)) if best >= s => acc,
            _ => Some((lag, s)),
        })?;

    if best_score < MIN_CORRELATION {
        return None;
    }

    let floor = best_score * OCTAVE_TOLERANCE;
    let (lag, correlation) = (min_lag + 1..max_lag)
        .find_map(|lag| {
            let here = score(lag)?;
            let before = score(lag - 1).unwrap_or(f64::NEG_INFINITY);
            let after = score(lag + 1).unwrap_or(f64::NEG_INFINITY);
            (here >= floor && here >= before && here >= after).then_some((lag, here))
        })
        .unwrap_or((best_lag, best_score));

    let mut period = lag as f64;
    if lag > min_lag && lag < max_lag && lag < n - 1 {
        let before = score(lag - 1).unwrap_or(0.0);
        let after = score(lag + 1).unwrap_or(0.0);
        let shift = (before - after) / (2.0 * (before - 2.0 * correlation + after));
        if shift.is_finite() {
            period += shift;
        }
    }

    Some(PitchEstimate {
        period,
        correlation,
    })
}

fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f64 = samples.iter().map(|&x| x as f64 * x as f64).sum();
    (energy / samples.len() as f64).sqrt()
}

fn normalized_correlation(samples: &[f32], lag: usize) -> Option<f64> {
    let overlap = samples.len() - lag;
    let mut num = 0.0f64;
    let mut energy_a = 0.0f64;
    let mut energy_b = 0.0f64;
    for (&a, &b) in samples[..overlap].iter().zip(&samples[lag..]) {
        let (a, b) = (a as f64, b as f64);
        num += a * b;
        energy_a += a * a;
        energy_b += b * b;
    }
    let denom = (energy_a * energy_b).sqrt();
    (denom > 0.0).then(|| num / denom)
}
