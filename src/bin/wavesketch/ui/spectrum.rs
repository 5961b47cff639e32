//! Spectrum panel
//!
//! Live FFT of the tap window on log-spaced bins, with the harmonic series of
//! the current waveform drawn on top at the display frequency.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use wavesketch::SpectralCoefficients;

/// Number of log-spaced bins plotted for the live signal
const SPECTRUM_BINS: usize = 64;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin index for each plotted point
    bin_indices: Vec<usize>,
    /// (log10 Hz, dB) per plotted point
    live: Vec<(f64, f64)>,
    sample_rate: f32,
}

impl SpectrumAnalyzer {
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(buffer_len);

        let denom = buffer_len.saturating_sub(1).max(1) as f32;
        let window = (0..buffer_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let min_freq = 20.0f64;
        let max_freq = (sample_rate as f64 / 2.0).min(20_000.0).max(min_freq * 2.0);
        let half = (buffer_len / 2).max(1);
        let (bin_indices, live) = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
                let freq = min_freq * (max_freq / min_freq).powf(t);
                let index = ((freq * buffer_len as f64 / sample_rate as f64).round() as usize).min(half - 1);
                (index, (freq.log10(), FLOOR_DB))
            })
            .unzip();

        Self {
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            bin_indices,
            live,
            sample_rate,
        }
    }

    /// Analyse a tap window; windows of the wrong length are ignored.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Hann window halves the amplitude; 4/N brings a full-scale sine to 0 dB.
        let scale = 4.0 / self.window.len() as f32;
        for (point, &idx) in self.live.iter_mut().zip(&self.bin_indices) {
            let magnitude = (self.scratch[idx].norm() * scale).max(1e-6);
            point.1 = (20.0 * (magnitude as f64).log10()).max(FLOOR_DB);
        }
    }

    pub fn live(&self) -> &[(f64, f64)] {
        &self.live
    }

    /// Harmonic amplitudes of `spectrum` placed at multiples of `fundamental`.
    pub fn harmonics(&self, spectrum: &SpectralCoefficients, fundamental: f32) -> Vec<(f64, f64)> {
        let nyquist = self.sample_rate / 2.0;
        (1..=spectrum.harmonics())
            .map(|k| (k as f32 * fundamental, spectrum.magnitude(k)))
            .take_while(|&(freq, _)| freq < nyquist)
            .filter(|&(_, magnitude)| magnitude > 1e-4)
            .map(|(freq, magnitude)| ((freq as f64).log10(), 20.0 * (magnitude as f64).log10()))
            .collect()
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, live: &[(f64, f64)], harmonics: &[(f64, f64)]) {
    let x_min = live.first().map_or(1.3, |p| p.0);
    let x_max = live.last().map_or(4.3, |p| p.0);

    let chart = Chart::new(vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(live),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(harmonics),
    ])
    .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
    .x_axis(
        Axis::default()
            .bounds([x_min, x_max])
            .labels(["20", "200", "2k", "20k"])
            .style(Style::default().fg(Color::DarkGray)),
    )
    .y_axis(
        Axis::default()
            .bounds([FLOOR_DB, 6.0])
            .labels(["-100", "-50", "0"])
            .style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(chart, area);
}
