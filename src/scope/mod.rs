//! Oscilloscope driver: turns the live tap into a still picture.
//!
//! Each frame the scope takes the tap window, finds the rotation that lines
//! it up with the current waveform (resampled to one period at the display
//! frequency) and hands one aligned period to whoever draws it. Before any
//! waveform exists it falls back to a rising zero-crossing trigger.

pub mod clock;

use std::sync::Arc;

use crate::{
    dsp::{
        align::{aligned_period, rotate_into, zero_crossing_offset},
        cycle::resample_to_length,
    },
    waveform::Waveform,
};

pub use clock::FrameClock;

/// How a frame's offset was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Correlated against the reference cycle.
    Reference,
    /// First rising zero crossing; no reference yet.
    ZeroCrossing,
}

/// One display frame: an aligned period plus what it was aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFrame {
    pub samples: Vec<f32>,
    pub offset: usize,
    pub trigger: Trigger,
    /// Reference cycle at the same length as `samples`, if any.
    pub reference: Option<Arc<[f32]>>,
}

pub struct ScopeAligner {
    waveform: Option<Waveform>,
    reference: Option<Arc<[f32]>>,
    display_frequency: f32,
    search_limit: usize,
}

impl ScopeAligner {
    pub fn new(display_frequency: f32, search_limit: usize) -> Self {
        Self {
            waveform: None,
            reference: None,
            display_frequency,
            search_limit: search_limit.max(1),
        }
    }

    /// Replace the reference shape. The resampled copy is rebuilt lazily.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = Some(waveform);
        self.reference = None;
    }

    /// Samples in one period at the display frequency.
    pub fn period_len(&self, sample_rate: f32) -> usize {
        ((sample_rate / self.display_frequency).floor() as usize).max(2)
    }

    /// Reference cycle resampled to [`period_len`](Self::period_len), cached.
    pub fn reference(&mut self, sample_rate: f32) -> Option<Arc<[f32]>> {
        let len = self.period_len(sample_rate);
        let waveform = self.waveform.as_ref()?;
        match &self.reference {
            Some(cached) if cached.len() == len => {}
            _ => self.reference = Some(resample_to_length(waveform.samples(), len).into()),
        }
        self.reference.clone()
    }

    /// Align `captured` and return one period of it.
    pub fn frame(&mut self, captured: &[f32], sample_rate: f32) -> ScopeFrame {
        match self.reference(sample_rate) {
            Some(reference) => {
                let mut samples = Vec::with_capacity(reference.len());
                let offset = aligned_period(&reference, captured, self.search_limit, &mut samples);
                ScopeFrame {
                    samples,
                    offset,
                    trigger: Trigger::Reference,
                    reference: Some(reference),
                }
            }
            None => {
                let offset = zero_crossing_offset(captured);
                let mut samples = vec![0.0; self.period_len(sample_rate)];
                rotate_into(captured, offset, &mut samples);
                ScopeFrame {
                    samples,
                    offset,
                    trigger: Trigger::ZeroCrossing,
                    reference: None,
                }
            }
        }
    }
}
