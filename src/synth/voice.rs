use std::sync::Arc;

use crate::{
    dsp::oscillator::{PeriodicOscillator, Wavetable},
    synth::backend::VoiceHandle,
};

/// Time for a gain change to complete, in seconds.
pub const DECLICK_SECONDS: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Sounding, gain following its target
    Releasing, // Stopped, ramping to silence
}

/// One renderer slot: an oscillator plus a slewed gain.
///
/// Gain moves linearly toward its target at a fixed rate, so starting,
/// stopping and polyphony rebalancing never step the output.
///
/// Raising the gain of a sounding voice waits one full ramp first. A voice
/// released in the same rebalance reaches silence within that time, so the
/// summed gain of all voices never climbs above the pool's ceiling.
pub struct Voice {
    handle: Option<VoiceHandle>,
    state: VoiceState,
    age: u64,
    sample_rate: f32,
    osc: PeriodicOscillator,
    gain: f32,
    target: f32,
    slew: f32,
    /// Samples a full-scale ramp takes.
    ramp_len: u32,
    /// Raised target waiting for `hold` more samples.
    pending: Option<f32>,
    hold: u32,
}

impl Voice {
    pub fn new(idle_table: Arc<Wavetable>, sample_rate: f32) -> Self {
        let ramp = (DECLICK_SECONDS * sample_rate).max(1.0);
        Self {
            handle: None,
            state: VoiceState::Free,
            age: 0,
            sample_rate,
            osc: PeriodicOscillator::new(idle_table, 0.0, sample_rate),
            gain: 0.0,
            target: 0.0,
            slew: 1.0 / ramp,
            ramp_len: ramp.ceil() as u32,
            pending: None,
            hold: 0,
        }
    }

    /// Start a note, returning the table the slot played before.
    pub fn start(
        &mut self,
        handle: VoiceHandle,
        frequency: f32,
        table: Arc<Wavetable>,
        gain: f32,
        age: u64,
    ) -> Arc<Wavetable> {
        self.handle = Some(handle);
        self.state = VoiceState::Active;
        self.age = age;
        self.gain = 0.0;
        self.target = gain;
        self.pending = None;
        self.osc.restart(table, frequency, self.sample_rate)
    }

    pub fn set_gain(&mut self, gain: f32) {
        if self.state != VoiceState::Active {
            return;
        }
        if gain <= self.target {
            self.target = gain;
            self.pending = None;
        } else {
            self.pending = Some(gain);
            self.hold = self.ramp_len;
        }
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.target = 0.0;
            self.pending = None;
        }
    }

    /// Add this voice into `out`.
    pub fn render_add(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            if let Some(raised) = self.pending {
                if self.hold == 0 {
                    self.target = raised;
                    self.pending = None;
                } else {
                    self.hold -= 1;
                }
            }
            let delta = self.target - self.gain;
            self.gain += delta.clamp(-self.slew, self.slew);
            *sample += self.osc.next_sample() * self.gain;
        }

        if self.state == VoiceState::Releasing && self.gain == 0.0 {
            self.free();
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.handle = None;
        self.gain = 0.0;
        self.target = 0.0;
        self.pending = None;
    }

    pub fn handle(&self) -> Option<VoiceHandle> {
        self.handle
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}
