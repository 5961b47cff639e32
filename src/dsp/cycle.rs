//! Single-cycle extraction and linear resampling.
//!
//! A recorded voice is reduced to one period that starts on a rising zero
//! crossing (so looping it introduces no step), then stretched to the
//! canonical waveform length.

use tracing::debug;

use crate::dsp::pitch::{detect_pitch, PitchEstimate};

/// Slice exactly `period` samples starting at the rising zero crossing
/// nearest the middle of `samples`.
///
/// The search alternates forward and backward from the center, one step at a
/// time, up to `min(period, center)` samples away. Without a crossing the
/// slice starts half a period before the center. The slice is cut short if
/// the buffer ends first.
pub fn extract_one_cycle(samples: &[f32], period: usize) -> &[f32] {
    let len = samples.len();
    let center = len / 2;
    let radius = period.min(center);

    let is_start = |idx: usize| {
        idx > 0 && idx + period < len && samples[idx - 1] <= 0.0 && samples[idx] > 0.0
    };

    let start = (0..radius)
        .find_map(|offset| {
            let forward = center + offset;
            if is_start(forward) {
                return Some(forward);
            }
            let backward = center.checked_sub(offset)?;
            is_start(backward).then_some(backward)
        })
        .unwrap_or_else(|| center.saturating_sub(period / 2));

    let end = (start + period).min(len);
    &samples[start.min(end)..end]
}

/// Linearly resample `samples` to exactly `target_len` points.
///
/// First and last input samples map onto first and last output samples.
/// Resampling to the input's own length returns the input unchanged.
pub fn resample_to_length(samples: &[f32], target_len: usize) -> Vec<f32> {
    match (samples.len(), target_len) {
        (_, 0) => Vec::new(),
        (0, _) => vec![0.0; target_len],
        (_, 1) => vec![samples[0]],
        (len, _) => {
            let last = len - 1;
            let step = last as f64 / (target_len - 1) as f64;
            (0..target_len)
                .map(|i| {
                    let t = i as f64 * step;
                    let i0 = (t.floor() as usize).min(last);
                    let i1 = (i0 + 1).min(last);
                    let frac = (t - i0 as f64) as f32;
                    samples[i0] * (1.0 - frac) + samples[i1] * frac
                })
                .collect()
        }
    }
}

/// One cycle recovered from a recording, ready to become a waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCycle {
    pub samples: Vec<f32>,
    /// `None` when no pitch was found and the whole recording was squashed
    /// into one cycle instead.
    pub pitch: Option<PitchEstimate>,
}

/// Run the recording pipeline: detect pitch, cut one cycle, resample.
pub fn cycle_from_recording(samples: &[f32], sample_rate: f32, target_len: usize) -> CapturedCycle {
    match detect_pitch(samples, sample_rate) {
        Some(pitch) => {
            let cycle = extract_one_cycle(samples, pitch.whole_period());
            debug!(
                period = pitch.period,
                correlation = pitch.correlation,
                cycle_len = cycle.len(),
                "extracted one cycle"
            );
            CapturedCycle {
                samples: resample_to_length(cycle, target_len),
                pitch: Some(pitch),
            }
        }
        None => {
            debug!(len = samples.len(), "no pitch found, resampling whole recording");
            CapturedCycle {
                samples: resample_to_length(samples, target_len),
                pitch: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn starts_at_known_crossing() {
        // Negative up to index 503, positive from 504 on, in a 1000-sample buffer.
        let mut samples = vec![-0.5f32; 1000];
        for s in samples.iter_mut().skip(504) {
            *s = 0.5;
        }
        let cycle = extract_one_cycle(&samples, 100);
        assert_eq!(cycle.len(), 100);
        assert_eq!(cycle.as_ptr(), samples[504..].as_ptr());
    }

    #[test]
    fn prefers_nearest_crossing_to_center() {
        // Period-50 sine with its rising crossings at 0, 50, 100, ...
        let samples: Vec<f32> = (0..1000)
            .map(|i| (TAU * (i as f32 + 0.5) / 50.0).sin())
            .collect();
        let cycle = extract_one_cycle(&samples, 50);
        assert_eq!(cycle.as_ptr(), samples[500..].as_ptr());
        assert_eq!(cycle.len(), 50);
    }

    #[test]
    fn falls_back_before_center_without_crossing() {
        let samples = vec![0.3f32; 400];
        let cycle = extract_one_cycle(&samples, 80);
        assert_eq!(cycle.as_ptr(), samples[160..].as_ptr());
        assert_eq!(cycle.len(), 80);
    }

    #[test]
    fn clamps_to_buffer_end() {
        let samples = vec![0.3f32; 10];
        let cycle = extract_one_cycle(&samples, 40);
        assert_eq!(cycle.len(), 10);
    }

    #[test]
    fn resample_to_same_length_is_identity() {
        let samples: Vec<f32> = (0..257).map(|i| ((i * 37) % 101) as f32 / 101.0 - 0.5).collect();
        let out = resample_to_length(&samples, samples.len());
        for (a, b) in out.iter().zip(&samples) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn resample_interpolates_and_keeps_endpoints() {
        let out = resample_to_length(&[0.0, 1.0], 5);
        assert_eq!(out, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let down = resample_to_length(&[0.0, 1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(down, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn resample_degenerate_lengths() {
        assert!(resample_to_length(&[1.0, 2.0], 0).is_empty());
        assert_eq!(resample_to_length(&[], 3), vec![0.0; 3]);
        assert_eq!(resample_to_length(&[0.7, 0.2], 1), vec![0.7]);
    }

    #[test]
    fn recording_pipeline_recovers_a_cycle() {
        let sample_rate = 44_100.0;
        let samples: Vec<f32> = (0..22_050)
            .map(|i| 0.8 * (TAU * 220.0 * i as f32 / sample_rate).sin())
            .collect();
        let captured = cycle_from_recording(&samples, sample_rate, 2048);
        assert!(captured.pitch.is_some());
        assert_eq!(captured.samples.len(), 2048);
        // Starts on the rising edge, peaks a quarter of the way in.
        assert!(captured.samples[0].abs() < 0.05);
        assert!(captured.samples[512] > 0.7);
        assert!(captured.samples[1536] < -0.7);
    }

    #[test]
    fn recording_pipeline_falls_back_on_silence() {
        let samples = vec![0.0f32; 22_050];
        let captured = cycle_from_recording(&samples, 44_100.0, 2048);
        assert_eq!(captured.pitch, None);
        assert_eq!(captured.samples.len(), 2048);
    }
}
