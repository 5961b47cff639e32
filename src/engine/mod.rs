//! The session object: waveform in, voices and scope frames out.
//!
//! An [`Engine`] owns the backend, the voice pool, the current spectrum and
//! the scope reference. All of its methods run on the control thread.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    config::EngineConfig,
    dsp::{cycle::cycle_from_recording, pitch::PitchEstimate},
    error::{Result, WaveError},
    io::Recording,
    scope::{ScopeAligner, ScopeFrame},
    synth::{AudioBackend, VoicePool},
    waveform::{SpectralCoefficients, Waveform},
};

pub struct Engine<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    pool: VoicePool,
    waveform: Option<Waveform>,
    spectrum: Arc<SpectralCoefficients>,
    scope: ScopeAligner,
    shut_down: bool,
}

impl<B: AudioBackend> Engine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        info!(
            sample_rate = backend.sample_rate(),
            analysis = ?config.analysis,
            gain_policy = ?config.gain_policy,
            "engine started"
        );
        Self {
            pool: VoicePool::new(config.gain_policy, config.master_gain, config.max_voices),
            scope: ScopeAligner::new(config.display_frequency, config.search_limit),
            spectrum: Arc::new(SpectralCoefficients::sine_fallback()),
            waveform: None,
            backend,
            config,
            shut_down: false,
        }
    }

    /// Analyse `waveform` and make it the sound of every future note.
    ///
    /// On failure the previous waveform and spectrum stay in effect.
    /// Sounding notes keep the spectrum they started with.
    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<Arc<SpectralCoefficients>> {
        let Some(spectrum) = self.config.analysis.synthesize(waveform.samples()) else {
            let err = if waveform.len() < 2 {
                WaveError::TooShort { len: waveform.len() }
            } else {
                WaveError::NotPowerOfTwo { len: waveform.len() }
            };
            warn!(len = waveform.len(), %err, "synthesis skipped, keeping previous spectrum");
            return Err(err);
        };

        let spectrum = Arc::new(spectrum);
        self.backend.set_spectrum(&spectrum);
        self.scope.set_waveform(waveform.clone());
        self.waveform = Some(waveform);
        self.spectrum = Arc::clone(&spectrum);
        debug!(
            harmonics = spectrum.harmonics(),
            dc = spectrum.dc(),
            "spectrum published"
        );
        Ok(spectrum)
    }

    /// Reduce a recording to one cycle and use it as the waveform.
    ///
    /// Returns the detected pitch, or `None` when the whole recording had to
    /// be squashed into one cycle instead.
    pub fn load_recording(&mut self, recording: &Recording) -> Result<Option<PitchEstimate>> {
        let captured = cycle_from_recording(
            recording.samples(),
            recording.sample_rate(),
            self.config.resolution,
        );
        match captured.pitch {
            Some(pitch) => info!(
                frequency = pitch.frequency(recording.sample_rate()),
                correlation = pitch.correlation,
                "captured voice cycle"
            ),
            None => warn!("no pitch in recording, using the whole capture as one cycle"),
        }
        self.set_waveform(Waveform::new(captured.samples)?)?;
        Ok(captured.pitch)
    }

    /// Start a note. Re-triggering a sounding note does nothing.
    pub fn play(&mut self, frequency: f32) -> bool {
        self.pool.play(&mut self.backend, frequency, &self.spectrum)
    }

    /// Stop a note. Stopping a silent note does nothing.
    pub fn stop(&mut self, frequency: f32) -> bool {
        self.pool.stop(&mut self.backend, frequency)
    }

    pub fn stop_all(&mut self) {
        self.pool.stop_all(&mut self.backend);
    }

    pub fn is_playing(&self, frequency: f32) -> bool {
        self.pool.is_playing(frequency)
    }

    pub fn active_voices(&self) -> usize {
        self.pool.len()
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Spectrum new notes will use (sine until a waveform is set).
    pub fn spectrum(&self) -> &Arc<SpectralCoefficients> {
        &self.spectrum
    }

    pub fn waveform(&self) -> Option<&Waveform> {
        self.waveform.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Read the live tap and align it for display.
    pub fn scope_frame(&mut self) -> ScopeFrame {
        let sample_rate = self.backend.sample_rate();
        let captured = self.backend.read_tap();
        self.scope.frame(captured, sample_rate)
    }

    /// Release every voice and silence the backend.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.pool.stop_all(&mut self.backend);
        self.backend.shutdown();
        info!("engine shut down");
    }
}

impl<B: AudioBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::harmonics::AnalysisStrategy,
        synth::pool::tests::RecordingBackend,
        waveform::WaveShape,
    };

    fn engine() -> Engine<RecordingBackend> {
        Engine::new(RecordingBackend::default(), EngineConfig::default())
    }

    #[test]
    fn plays_sine_before_any_waveform() {
        let mut engine = engine();
        assert_eq!(engine.spectrum().magnitude(1), 1.0);
        assert!(engine.play(440.0));
        assert_eq!(engine.active_voices(), 1);
    }

    #[test]
    fn bad_waveform_keeps_previous_spectrum() {
        let mut engine = engine();
        let good = engine
            .set_waveform(Waveform::from_shape(WaveShape::Saw, 2048).unwrap())
            .unwrap();

        let err = engine
            .set_waveform(Waveform::from_shape(WaveShape::Saw, 1000).unwrap())
            .unwrap_err();
        assert!(matches!(err, WaveError::NotPowerOfTwo { len: 1000 }));
        assert!(Arc::ptr_eq(engine.spectrum(), &good));
        assert_eq!(engine.waveform().map(Waveform::len), Some(2048));
        assert_eq!(engine.backend().spectra, 1);
    }

    #[test]
    fn direct_strategy_accepts_any_length() {
        let config = EngineConfig::default().with_analysis(AnalysisStrategy::direct());
        let mut engine = Engine::new(RecordingBackend::default(), config);
        let spectrum = engine
            .set_waveform(Waveform::from_shape(WaveShape::Square, 1000).unwrap())
            .unwrap();
        assert_eq!(spectrum.harmonics(), 64);
    }

    #[test]
    fn sounding_notes_keep_note_on_spectrum() {
        let mut engine = engine();
        engine.play(220.0);
        engine
            .set_waveform(Waveform::from_shape(WaveShape::Square, 2048).unwrap())
            .unwrap();
        engine.play(330.0);

        let voices: Vec<_> = engine.pool().voices().collect();
        assert_eq!(voices[0].spectrum.harmonics(), 1);
        assert!(Arc::ptr_eq(&voices[1].spectrum, engine.spectrum()));
    }

    #[test]
    fn recording_becomes_waveform() {
        let mut engine = engine();
        let samples: Vec<f32> = (0..22_050)
            .map(|i| 0.6 * (std::f32::consts::TAU * 220.0 * i as f32 / 44_100.0).sin())
            .collect();
        let pitch = engine
            .load_recording(&Recording::new(samples, 44_100.0).unwrap())
            .unwrap()
            .expect("pitch");
        assert!((pitch.frequency(44_100.0) - 220.0).abs() < 1.0);
        assert_eq!(engine.waveform().map(Waveform::len), Some(2048));
        assert!(engine.spectrum().magnitude(1) > 0.5);
    }

    #[test]
    fn teardown_runs_once() {
        let mut engine = engine();
        engine.play(220.0);
        engine.play(330.0);
        engine.teardown();
        engine.teardown();
        assert!(engine.backend().shut_down);
        assert_eq!(engine.backend().stopped.len(), 2);
        assert_eq!(engine.active_voices(), 0);
    }
}
