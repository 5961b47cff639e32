//! Control-side voice bookkeeping.
//!
//! One voice per sounding frequency. Frequencies are compared after
//! quantizing to centi-hertz, so 440.0 and 440.001 are the same note while
//! the keyboard's 261.63 and 277.18 stay distinct.

use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use crate::{
    config::GainPolicy,
    synth::backend::{AudioBackend, VoiceHandle},
    waveform::SpectralCoefficients,
};

/// Voice table key: frequency in hundredths of a hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrequencyKey(i64);

impl FrequencyKey {
    /// `None` for frequencies that cannot sound (non-finite, zero, negative).
    pub fn from_hz(frequency: f32) -> Option<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return None;
        }
        let centi = (frequency as f64 * 100.0).round() as i64;
        (centi > 0).then_some(Self(centi))
    }

    pub fn hz(self) -> f32 {
        (self.0 as f64 / 100.0) as f32
    }
}

/// A note the pool believes is sounding.
#[derive(Debug, Clone)]
pub struct ActiveVoice {
    pub frequency: f32,
    /// Spectrum in effect when the note started.
    pub spectrum: Arc<SpectralCoefficients>,
    pub handle: VoiceHandle,
    pub gain: f32,
}

#[derive(Debug)]
pub struct VoicePool {
    voices: BTreeMap<FrequencyKey, ActiveVoice>,
    policy: GainPolicy,
    master_gain: f32,
    max_voices: usize,
}

impl VoicePool {
    pub fn new(policy: GainPolicy, master_gain: f32, max_voices: usize) -> Self {
        Self {
            voices: BTreeMap::new(),
            policy,
            master_gain: master_gain.clamp(0.0, 1.0),
            max_voices: max_voices.max(1),
        }
    }

    /// Start a voice at `frequency` with `spectrum`.
    ///
    /// Returns `false` without touching the backend when the note is already
    /// sounding, the frequency is unusable, or every slot is taken, and also
    /// when the backend could not deliver the start.
    pub fn play<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        frequency: f32,
        spectrum: &Arc<SpectralCoefficients>,
    ) -> bool {
        let Some(key) = FrequencyKey::from_hz(frequency) else {
            debug!(frequency, "ignoring unplayable frequency");
            return false;
        };
        if self.voices.contains_key(&key) {
            return false;
        }
        if self.voices.len() >= self.max_voices {
            debug!(frequency, max = self.max_voices, "voice limit reached");
            return false;
        }

        let gain = self.gain_for(self.voices.len() + 1);
        let Some(handle) = backend.create_voice(frequency, spectrum, gain) else {
            return false;
        };
        self.voices.insert(
            key,
            ActiveVoice {
                frequency,
                spectrum: Arc::clone(spectrum),
                handle,
                gain,
            },
        );
        self.rebalance(backend);
        true
    }

    /// Stop the voice at `frequency`. Absent notes are a no-op.
    ///
    /// A stop the backend could not deliver leaves the note in the pool, so
    /// calling again retries it.
    pub fn stop<B: AudioBackend>(&mut self, backend: &mut B, frequency: f32) -> bool {
        let Some(key) = FrequencyKey::from_hz(frequency) else {
            return false;
        };
        let Some(voice) = self.voices.get(&key) else {
            return false;
        };
        if !backend.stop(voice.handle) {
            return false;
        }
        self.voices.remove(&key);
        self.rebalance(backend);
        true
    }

    /// Stop everything; notes whose stop was lost stay tracked.
    pub fn stop_all<B: AudioBackend>(&mut self, backend: &mut B) {
        self.voices.retain(|_, voice| !backend.stop(voice.handle));
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn is_playing(&self, frequency: f32) -> bool {
        FrequencyKey::from_hz(frequency).is_some_and(|key| self.voices.contains_key(&key))
    }

    /// Sounding voices, lowest frequency first.
    pub fn voices(&self) -> impl Iterator<Item = &ActiveVoice> {
        self.voices.values()
    }

    /// Per-voice gain for `count` simultaneous voices.
    pub fn gain_for(&self, count: usize) -> f32 {
        match self.policy {
            GainPolicy::Fixed => self.master_gain,
            GainPolicy::Normalized => self.master_gain / count.max(1) as f32,
        }
    }

    fn rebalance<B: AudioBackend>(&mut self, backend: &mut B) {
        let gain = self.gain_for(self.voices.len());
        for voice in self.voices.values_mut() {
            if voice.gain != gain {
                voice.gain = gain;
                backend.set_gain(voice.handle, gain);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every call instead of making sound.
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub created: Vec<(VoiceHandle, f32, f32)>,
        pub gains: BTreeMap<VoiceHandle, f32>,
        pub stopped: Vec<VoiceHandle>,
        pub spectra: usize,
        pub shut_down: bool,
        /// Behave like a full command queue.
        pub congested: bool,
        tap: Vec<f32>,
    }

    impl AudioBackend for RecordingBackend {
        fn sample_rate(&self) -> f32 {
            48_000.0
        }

        fn set_spectrum(&mut self, _spectrum: &Arc<SpectralCoefficients>) {
            self.spectra += 1;
        }

        fn create_voice(
            &mut self,
            frequency: f32,
            _spectrum: &Arc<SpectralCoefficients>,
            gain: f32,
        ) -> Option<VoiceHandle> {
            if self.congested {
                return None;
            }
            let handle = VoiceHandle::new(self.created.len() as u64);
            self.created.push((handle, frequency, gain));
            self.gains.insert(handle, gain);
            Some(handle)
        }

        fn set_gain(&mut self, voice: VoiceHandle, gain: f32) {
            self.gains.insert(voice, gain);
        }

        fn stop(&mut self, voice: VoiceHandle) -> bool {
            if self.congested {
                return false;
            }
            self.gains.remove(&voice);
            self.stopped.push(voice);
            true
        }

        fn read_tap(&mut self) -> &[f32] {
            &self.tap
        }

        fn shutdown(&mut self) {
            self.shut_down = true;
        }
    }

    fn sine() -> Arc<SpectralCoefficients> {
        Arc::new(SpectralCoefficients::sine_fallback())
    }

    #[test]
    fn play_twice_starts_one_voice() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        assert!(pool.play(&mut backend, 440.0, &sine()));
        assert!(!pool.play(&mut backend, 440.0, &sine()));
        assert!(!pool.play(&mut backend, 440.001, &sine()));
        assert_eq!(pool.len(), 1);
        assert_eq!(backend.created.len(), 1);
    }

    #[test]
    fn stopping_absent_frequency_is_noop() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        assert!(!pool.stop(&mut backend, 440.0));
        pool.play(&mut backend, 440.0, &sine());
        assert!(!pool.stop(&mut backend, 220.0));
        assert!(backend.stopped.is_empty());
        assert!(pool.is_playing(440.0));
    }

    #[test]
    fn normalized_gains_never_exceed_master() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        for f in [261.63, 293.66, 329.63, 349.23] {
            pool.play(&mut backend, f, &sine());
            let total: f32 = backend.gains.values().sum();
            assert!(total <= 0.2 + 1e-6, "total {total}");
        }
        assert!(backend.gains.values().all(|&g| (g - 0.05).abs() < 1e-6));

        pool.stop(&mut backend, 293.66);
        assert_eq!(backend.gains.len(), 3);
        let total: f32 = backend.gains.values().sum();
        assert!((total - 0.2).abs() < 1e-6);
    }

    #[test]
    fn fixed_policy_leaves_gains_alone() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Fixed, 0.3, 18);
        pool.play(&mut backend, 220.0, &sine());
        pool.play(&mut backend, 330.0, &sine());
        assert!(backend.gains.values().all(|&g| g == 0.3));
    }

    #[test]
    fn rejects_unplayable_frequencies_and_overflow() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 2);
        assert!(!pool.play(&mut backend, f32::NAN, &sine()));
        assert!(!pool.play(&mut backend, -5.0, &sine()));
        assert!(!pool.play(&mut backend, 0.0, &sine()));
        assert!(pool.play(&mut backend, 100.0, &sine()));
        assert!(pool.play(&mut backend, 200.0, &sine()));
        assert!(!pool.play(&mut backend, 300.0, &sine()));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn stop_all_releases_every_handle() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        pool.play(&mut backend, 220.0, &sine());
        pool.play(&mut backend, 330.0, &sine());
        pool.stop_all(&mut backend);
        assert!(pool.is_empty());
        assert_eq!(backend.stopped.len(), 2);
        assert!(backend.gains.is_empty());
    }

    #[test]
    fn voices_keep_their_note_on_spectrum() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        let first = sine();
        pool.play(&mut backend, 220.0, &first);
        let second = Arc::new(SpectralCoefficients::from_parts(vec![0.0, 0.5], vec![0.0, 0.0]));
        pool.play(&mut backend, 330.0, &second);

        let spectra: Vec<_> = pool.voices().map(|v| Arc::clone(&v.spectrum)).collect();
        assert!(Arc::ptr_eq(&spectra[0], &first));
        assert!(Arc::ptr_eq(&spectra[1], &second));
    }

    #[test]
    fn lost_stop_keeps_note_tracked() {
        let mut backend = RecordingBackend::default();
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        pool.play(&mut backend, 220.0, &sine());
        pool.play(&mut backend, 330.0, &sine());

        backend.congested = true;
        assert!(!pool.stop(&mut backend, 220.0));
        assert!(pool.is_playing(220.0));
        pool.stop_all(&mut backend);
        assert_eq!(pool.len(), 2);

        backend.congested = false;
        assert!(pool.stop(&mut backend, 220.0));
        assert!(!pool.is_playing(220.0));
        assert_eq!(backend.gains.values().copied().collect::<Vec<_>>(), [0.2]);
    }

    #[test]
    fn lost_start_is_not_tracked() {
        let mut backend = RecordingBackend {
            congested: true,
            ..Default::default()
        };
        let mut pool = VoicePool::new(GainPolicy::Normalized, 0.2, 18);
        assert!(!pool.play(&mut backend, 440.0, &sine()));
        assert!(pool.is_empty());

        backend.congested = false;
        assert!(pool.play(&mut backend, 440.0, &sine()));
    }
}
