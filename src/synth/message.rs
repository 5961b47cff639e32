use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{dsp::oscillator::Wavetable, synth::backend::VoiceHandle};

/// Commands from the control thread to the renderer.
///
/// Tables arrive fully built; the renderer never allocates to act on one.
#[derive(Debug, Clone)]
pub enum SynthMessage {
    Start {
        handle: VoiceHandle,
        frequency: f32,
        table: Arc<Wavetable>,
        gain: f32,
    },
    SetGain {
        handle: VoiceHandle,
        gain: f32,
    },
    Stop {
        handle: VoiceHandle,
    },
    StopAll,
    /// New table for the monitor oscillator feeding the scope tap.
    SetMonitor {
        table: Arc<Wavetable>,
    },
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
