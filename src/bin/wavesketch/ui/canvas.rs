//! Drawing canvas: one editable cycle, edited with the mouse.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use wavesketch::{dsp::cycle::resample_to_length, Waveform};

pub struct Canvas {
    samples: Vec<f32>,
    /// Previous pointer position in the current stroke.
    last: Option<(usize, f32)>,
    dirty: bool,
}

impl Canvas {
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len.max(2)],
            last: None,
            dirty: false,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Replace the drawing with `waveform`, stretched to the canvas length.
    pub fn load(&mut self, waveform: &Waveform) {
        self.samples = resample_to_length(waveform.samples(), self.samples.len());
        self.last = None;
        self.dirty = false;
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.last = None;
    }

    /// Paint from the previous pointer position to (`index`, `amplitude`).
    ///
    /// Every sample between the two positions is set on the straight line
    /// joining them, so fast drags leave no gaps. `brush` widens the first
    /// point of a stroke to cover a whole terminal cell.
    pub fn stroke_to(&mut self, index: usize, amplitude: f32, brush: usize) {
        let index = index.min(self.samples.len() - 1);
        let amplitude = amplitude.clamp(-1.0, 1.0);

        match self.last {
            Some((prev, prev_amp)) if prev != index => {
                let (lo, hi) = (prev.min(index), prev.max(index));
                let span = (index as f32 - prev as f32).abs();
                for i in lo..=hi {
                    let t = (i as f32 - prev as f32).abs() / span;
                    self.samples[i] = prev_amp + (amplitude - prev_amp) * t;
                }
            }
            _ => {
                let lo = index.saturating_sub(brush / 2);
                let hi = (index + brush / 2).min(self.samples.len() - 1);
                self.samples[lo..=hi].fill(amplitude);
            }
        }

        self.last = Some((index, amplitude));
        self.dirty = true;
    }

    /// Finish a stroke. Returns the drawing when it changed.
    pub fn end_stroke(&mut self) -> Option<Vec<f32>> {
        self.last = None;
        std::mem::take(&mut self.dirty).then(|| self.samples.clone())
    }

    /// Map a terminal cell inside `area` to (sample index, amplitude, brush).
    pub fn point_at(&self, area: Rect, column: u16, row: u16) -> Option<(usize, f32, usize)> {
        if area.width == 0 || area.height < 2 || !area.contains((column, row).into()) {
            return None;
        }
        let len = self.samples.len();
        let x = (column - area.x) as f32 + 0.5;
        let index = ((x / area.width as f32) * len as f32) as usize;
        let y = (row - area.y) as f32 / (area.height - 1) as f32;
        let brush = len / area.width as usize;
        Some((index.min(len - 1), 1.0 - 2.0 * y, brush))
    }
}

/// Render the canvas. Returns the plotting area for mouse mapping.
pub fn render_canvas(frame: &mut Frame, area: Rect, canvas: &Canvas, drawing: bool) -> Rect {
    let title = if drawing { " Canvas (drawing) " } else { " Canvas " };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);

    let len = canvas.samples().len();
    let data: Vec<(f64, f64)> = canvas
        .samples()
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / (len - 1) as f64, s as f64))
        .collect();
    let center = [(0.0, 0.0), (1.0, 0.0)];

    let chart = Chart::new(vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&center),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&data),
    ])
    .block(block)
    .x_axis(Axis::default().bounds([0.0, 1.0]))
    .y_axis(Axis::default().bounds([-1.0, 1.0]));

    frame.render_widget(chart, area);
    inner
}
