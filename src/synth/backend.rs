//! Control-side boundary to whatever actually produces sound.

use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};
#[cfg(feature = "rtrb")]
use tracing::{debug, warn};

use crate::waveform::SpectralCoefficients;
#[cfg(feature = "rtrb")]
use crate::{dsp::oscillator::Wavetable, synth::message::SynthMessage};

/// Opaque id of one sounding voice, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

/// The audio engine as seen from the control thread.
///
/// None of these calls may block on the audio thread. A backend that cannot
/// deliver a command drops it and logs it. `create_voice` and `stop` also
/// report the loss, so the caller's view of what is sounding stays true.
pub trait AudioBackend {
    fn sample_rate(&self) -> f32;

    /// Publish the spectrum that the monitor (and future voices) should use.
    fn set_spectrum(&mut self, spectrum: &Arc<SpectralCoefficients>);

    fn create_voice(
        &mut self,
        frequency: f32,
        spectrum: &Arc<SpectralCoefficients>,
        gain: f32,
    ) -> Option<VoiceHandle>;

    fn set_gain(&mut self, voice: VoiceHandle, gain: f32);

    /// `false` if the stop never reached the audio side.
    fn stop(&mut self, voice: VoiceHandle) -> bool;

    /// Most recent output samples, oldest first. Always the same length.
    fn read_tap(&mut self) -> &[f32];

    /// Silence everything. Further calls are allowed but may be ignored.
    fn shutdown(&mut self);
}

/// [`AudioBackend`] that talks to a [`Renderer`](crate::synth::render::Renderer)
/// over two lock-free rings.
///
/// Wavetables are built here, on the control thread, so the audio thread only
/// ever swaps `Arc`s. Tables the renderer is done with come back on `retired`
/// and are freed here too.
#[cfg(feature = "rtrb")]
pub struct RingBackend {
    tx: Producer<SynthMessage>,
    tap_rx: Consumer<f32>,
    retired: Consumer<Arc<Wavetable>>,
    tap: Vec<f32>,
    sample_rate: f32,
    display_frequency: f32,
    next_handle: u64,
    dropped: u64,
}

#[cfg(feature = "rtrb")]
impl RingBackend {
    pub(crate) fn new(
        tx: Producer<SynthMessage>,
        tap_rx: Consumer<f32>,
        retired: Consumer<Arc<Wavetable>>,
        tap_window: usize,
        sample_rate: f32,
        display_frequency: f32,
    ) -> Self {
        Self {
            tx,
            tap_rx,
            retired,
            tap: vec![0.0; tap_window],
            sample_rate,
            display_frequency,
            next_handle: 0,
            dropped: 0,
        }
    }

    /// Commands lost because the renderer was not draining its queue.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, msg: SynthMessage) -> bool {
        self.free_retired();
        if self.tx.push(msg).is_err() {
            self.dropped += 1;
            warn!(dropped = self.dropped, "synth queue full, dropping message");
            return false;
        }
        true
    }

    fn free_retired(&mut self) {
        while self.retired.pop().is_ok() {}
    }
}

/// Shift `samples` into the end of a fixed-size window.
#[cfg(feature = "rtrb")]
fn append_window(window: &mut [f32], samples: &[f32]) {
    let len = window.len();
    if samples.len() >= len {
        window.copy_from_slice(&samples[samples.len() - len..]);
    } else {
        window.copy_within(samples.len().., 0);
        window[len - samples.len()..].copy_from_slice(samples);
    }
}

#[cfg(feature = "rtrb")]
impl AudioBackend for RingBackend {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn set_spectrum(&mut self, spectrum: &Arc<SpectralCoefficients>) {
        let table = Wavetable::from_spectrum(spectrum, self.display_frequency, self.sample_rate);
        self.send(SynthMessage::SetMonitor {
            table: Arc::new(table),
        });
    }

    fn create_voice(
        &mut self,
        frequency: f32,
        spectrum: &Arc<SpectralCoefficients>,
        gain: f32,
    ) -> Option<VoiceHandle> {
        let handle = VoiceHandle::new(self.next_handle);
        let table = Arc::new(Wavetable::from_spectrum(spectrum, frequency, self.sample_rate));
        let sent = self.send(SynthMessage::Start {
            handle,
            frequency,
            table,
            gain,
        });
        if !sent {
            return None;
        }
        self.next_handle += 1;
        debug!(handle = handle.id(), frequency, gain, "starting voice");
        Some(handle)
    }

    fn set_gain(&mut self, voice: VoiceHandle, gain: f32) {
        self.send(SynthMessage::SetGain {
            handle: voice,
            gain,
        });
    }

    fn stop(&mut self, voice: VoiceHandle) -> bool {
        debug!(handle = voice.id(), "stopping voice");
        self.send(SynthMessage::Stop { handle: voice })
    }

    fn read_tap(&mut self) -> &[f32] {
        self.free_retired();
        let Self { tap_rx, tap, .. } = self;
        let available = tap_rx.slots();
        if available > 0 {
            if let Ok(chunk) = tap_rx.read_chunk(available) {
                let (first, second) = chunk.as_slices();
                append_window(tap, first);
                append_window(tap, second);
                chunk.commit_all();
            }
        }
        tap
    }

    fn shutdown(&mut self) {
        self.send(SynthMessage::StopAll);
    }
}
