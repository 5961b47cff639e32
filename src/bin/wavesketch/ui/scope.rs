//! Oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use wavesketch::scope::{ScopeFrame, Trigger};

fn to_points(samples: &[f32]) -> Vec<(f64, f64)> {
    let last = samples.len().saturating_sub(1).max(1) as f64;
    samples
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / last, s as f64))
        .collect()
}

/// Render one aligned period with the reference behind it.
pub fn render_scope(frame: &mut Frame, area: Rect, scope: &ScopeFrame) {
    let title = match scope.trigger {
        Trigger::Reference => format!(" Scope (locked, +{}) ", scope.offset),
        Trigger::ZeroCrossing => " Scope (free-running) ".to_string(),
    };
    let live = to_points(&scope.samples);
    let reference = scope.reference.as_deref().map(to_points).unwrap_or_default();

    let chart = Chart::new(vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&reference),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&live),
    ])
    .block(Block::default().title(title).borders(Borders::ALL))
    .x_axis(
        Axis::default()
            .bounds([0.0, 1.0])
            .style(Style::default().fg(Color::DarkGray)),
    )
    .y_axis(
        Axis::default()
            .bounds([-1.0, 1.0])
            .style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(chart, area);
}

/// Raw microphone input while a capture session is listening.
pub fn render_preview(frame: &mut Frame, area: Rect, samples: &[f32], status: &str) {
    let data = to_points(samples);
    let chart = Chart::new(vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::LightRed))
        .data(&data)])
    .block(
        Block::default()
            .title(format!(" Microphone: {status} "))
            .borders(Borders::ALL),
    )
    .x_axis(Axis::default().bounds([0.0, 1.0]))
    .y_axis(Axis::default().bounds([-1.0, 1.0]));

    frame.render_widget(chart, area);
}
