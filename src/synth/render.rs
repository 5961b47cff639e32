use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::{
    config::ScopeSource,
    dsp::oscillator::{PeriodicOscillator, Wavetable},
    synth::{
        backend::VoiceHandle,
        message::{MessageReceiver, SynthMessage},
        voice::{Voice, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/// Audio-thread half of the synth: mixes voices and feeds the scope tap.
///
/// Everything is preallocated in [`Renderer::new`]; `render_block` only pops
/// messages, runs oscillators and pushes tap samples. Tables it stops using
/// go back to the control thread through `retired` and are freed there.
pub struct Renderer<R: MessageReceiver = Consumer<SynthMessage>> {
    voices: Vec<Voice>,
    monitor: PeriodicOscillator,
    rx: R,
    tap: Producer<f32>,
    retired: Producer<Arc<Wavetable>>,
    scope_source: ScopeSource,
    monitor_buffer: Vec<f32>,
    frame_counter: u64,
}

impl<R: MessageReceiver> Renderer<R> {
    pub fn new(
        rx: R,
        tap: Producer<f32>,
        retired: Producer<Arc<Wavetable>>,
        sample_rate: f32,
        max_voices: usize,
        display_frequency: f32,
        scope_source: ScopeSource,
    ) -> Self {
        let sine = Arc::new(Wavetable::sine());
        let voices = (0..max_voices)
            .map(|_| Voice::new(Arc::clone(&sine), sample_rate))
            .collect();

        Self {
            voices,
            monitor: PeriodicOscillator::new(sine, display_frequency, sample_rate),
            rx,
            tap,
            retired,
            scope_source,
            monitor_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frame_counter: 0,
        }
    }

    /// Render one mono block of any length.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.drain_messages();

        for block in out.chunks_mut(MAX_BLOCK_SIZE) {
            block.fill(0.0);
            for voice in &mut self.voices {
                if voice.is_active() {
                    voice.render_add(block);
                }
            }

            match self.scope_source {
                ScopeSource::Output => push_tap(&mut self.tap, block),
                ScopeSource::Monitor => {
                    let monitor = &mut self.monitor_buffer[..block.len()];
                    self.monitor.render(monitor);
                    push_tap(&mut self.tap, monitor);
                }
            }

            self.frame_counter += block.len() as u64;
        }
    }

    /// Voices currently producing sound (including ones ramping out).
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    fn drain_messages(&mut self) {
        while let Some(msg) = self.rx.pop() {
            match msg {
                SynthMessage::Start {
                    handle,
                    frequency,
                    table,
                    gain,
                } => {
                    let age = self.frame_counter;
                    let unused = match self.allocate_voice() {
                        Some(voice) => voice.start(handle, frequency, table, gain, age),
                        None => table,
                    };
                    self.retire(unused);
                }
                SynthMessage::SetGain { handle, gain } => {
                    if let Some(voice) = self.find_voice(handle) {
                        voice.set_gain(gain);
                    }
                }
                SynthMessage::Stop { handle } => {
                    if let Some(voice) = self.find_voice(handle) {
                        voice.release();
                    }
                }
                SynthMessage::StopAll => {
                    for voice in &mut self.voices {
                        voice.release();
                    }
                }
                SynthMessage::SetMonitor { table } => {
                    let old = self.monitor.set_table(table);
                    self.retire(old);
                }
            }
        }
    }

    fn retire(&mut self, table: Arc<Wavetable>) {
        // Sized to the message queue, so this only fails if the control side
        // has been dropped; the table is then freed here.
        let _ = self.retired.push(table);
    }

    fn allocate_voice(&mut self) -> Option<&mut Voice> {
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(&mut self.voices[idx]);
        }

        // Steal the oldest voice already on its way out
        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }

    fn find_voice(&mut self, handle: VoiceHandle) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| v.handle() == Some(handle) && v.is_active())
    }
}

// A UI that stops reading loses the newest samples, never blocks audio.
fn push_tap(tap: &mut Producer<f32>, samples: &[f32]) {
    for &s in samples {
        if tap.push(s).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GainPolicy,
        synth::{
            backend::{AudioBackend, RingBackend},
            pool::VoicePool,
        },
        waveform::SpectralCoefficients,
    };
    use rtrb::RingBuffer;

    fn pair_with(source: ScopeSource, slots: usize) -> (RingBackend, Renderer) {
        let (tx, rx) = RingBuffer::new(64);
        let (tap_tx, tap_rx) = RingBuffer::new(4096);
        let (retired_tx, retired_rx) = RingBuffer::new(64);
        let backend = RingBackend::new(tx, tap_rx, retired_rx, 480, 48_000.0, 480.0);
        let renderer = Renderer::new(rx, tap_tx, retired_tx, 48_000.0, slots, 480.0, source);
        (backend, renderer)
    }

    fn pair(source: ScopeSource) -> (RingBackend, Renderer) {
        pair_with(source, 2)
    }

    #[test]
    fn silent_until_a_voice_starts() {
        let (_backend, mut renderer) = pair(ScopeSource::Output);
        let mut out = vec![1.0; 256];
        renderer.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn started_voice_is_audible_then_released() {
        let (mut backend, mut renderer) = pair(ScopeSource::Output);
        let spectrum = Arc::new(SpectralCoefficients::sine_fallback());
        let handle = backend.create_voice(440.0, &spectrum, 0.2).unwrap();

        let mut out = vec![0.0; 2048];
        renderer.render_block(&mut out);
        assert_eq!(renderer.active_voices(), 1);
        let peak = out.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!((peak - 0.2).abs() < 0.01, "peak {peak}");

        backend.stop(handle);
        renderer.render_block(&mut out);
        assert_eq!(renderer.active_voices(), 0);
        assert_eq!(out[2047], 0.0);
    }

    #[test]
    fn steals_releasing_voice_when_full() {
        let (mut backend, mut renderer) = pair(ScopeSource::Output);
        let spectrum = Arc::new(SpectralCoefficients::sine_fallback());
        let a = backend.create_voice(220.0, &spectrum, 0.1).unwrap();
        backend.create_voice(330.0, &spectrum, 0.1).unwrap();
        let mut out = vec![0.0; 64];
        renderer.render_block(&mut out);

        backend.stop(a);
        let c = backend.create_voice(440.0, &spectrum, 0.1).unwrap();
        renderer.render_block(&mut out);
        assert_eq!(renderer.active_voices(), 2);
        assert!(renderer.voices.iter().any(|v| v.handle() == Some(c)));
    }

    #[test]
    fn monitor_feeds_tap_without_voices() {
        let (mut backend, mut renderer) = pair(ScopeSource::Monitor);
        let mut out = vec![0.0; 480];
        renderer.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        // 480 Hz at 48 kHz: 100 samples per cycle, starting at phase 0.
        let tap = backend.read_tap();
        assert!((tap[25] - 1.0).abs() < 1e-3);
        assert!((tap[75] + 1.0).abs() < 1e-3);
        assert!((tap[425] - 1.0).abs() < 1e-2);
    }

    fn gain_sum(renderer: &Renderer) -> f32 {
        renderer
            .voices
            .iter()
            .filter(|v| v.is_active())
            .map(|v| v.gain())
            .sum()
    }

    #[test]
    fn stopping_one_note_of_chord_stays_under_master() {
        let (mut backend, mut renderer) = pair_with(ScopeSource::Output, 4);
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 4);
        let spectrum = Arc::new(SpectralCoefficients::sine_fallback());
        for f in [220.0, 330.0, 440.0] {
            assert!(pool.play(&mut backend, f, &spectrum));
        }
        let mut out = vec![0.0; 4800];
        renderer.render_block(&mut out);
        assert!((gain_sum(&renderer) - 0.2).abs() < 1e-5);

        assert!(pool.stop(&mut backend, 330.0));
        let mut sample = [0.0f32; 1];
        for i in 0..1000 {
            renderer.render_block(&mut sample);
            let sum = gain_sum(&renderer);
            assert!(sum <= 0.2 + 1e-6, "sample {i}: gain sum {sum}");
        }

        // Survivors settle at master / 2.
        assert_eq!(renderer.active_voices(), 2);
        assert!((gain_sum(&renderer) - 0.2).abs() < 1e-5);
        assert!(renderer
            .voices
            .iter()
            .filter(|v| v.is_active())
            .all(|v| (v.gain() - 0.1).abs() < 1e-5));
    }

    #[test]
    fn replaced_tables_go_back_to_control_side() {
        let (mut tx, rx) = RingBuffer::<SynthMessage>::new(8);
        let (tap_tx, _tap_rx) = RingBuffer::new(64);
        let (retired_tx, mut retired_rx) = RingBuffer::new(8);
        let mut renderer = Renderer::new(rx, tap_tx, retired_tx, 48_000.0, 1, 480.0, ScopeSource::Monitor);

        let first = Arc::new(Wavetable::sine());
        let second = Arc::new(Wavetable::sine());
        tx.push(SynthMessage::SetMonitor { table: Arc::clone(&first) }).unwrap();
        tx.push(SynthMessage::SetMonitor { table: Arc::clone(&second) }).unwrap();
        let mut out = vec![0.0; 16];
        renderer.render_block(&mut out);

        // Initial idle table, then `first`
        retired_rx.pop().unwrap();
        assert!(Arc::ptr_eq(&retired_rx.pop().unwrap(), &first));
        assert!(retired_rx.pop().is_err());

        // With the only slot busy, a start that cannot be placed returns its table.
        let busy = Arc::new(Wavetable::sine());
        let orphan = Arc::new(Wavetable::sine());
        for (id, table) in [(1, &busy), (2, &orphan)] {
            tx.push(SynthMessage::Start {
                handle: VoiceHandle::new(id),
                frequency: 440.0,
                table: Arc::clone(table),
                gain: 0.1,
            })
            .unwrap();
        }
        renderer.render_block(&mut out);
        retired_rx.pop().unwrap(); // slot's idle table
        assert!(Arc::ptr_eq(&retired_rx.pop().unwrap(), &orphan));
        assert_eq!(Arc::strong_count(&busy), 2);
    }
}
