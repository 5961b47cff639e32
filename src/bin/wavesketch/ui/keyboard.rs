//! Piano strip showing which computer keys play which notes

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use wavesketch::io::keyboard::{KeyColor, NOTE_KEYS};

pub fn render_keyboard(frame: &mut Frame, area: Rect, is_held: impl Fn(char) -> bool) {
    let spans: Vec<Span> = NOTE_KEYS
        .iter()
        .map(|note| {
            let base = match note.color {
                KeyColor::White => Style::default().fg(Color::Black).bg(Color::White),
                KeyColor::Black => Style::default().fg(Color::White).bg(Color::DarkGray),
            };
            let style = if is_held(note.key) {
                base.bg(Color::LightCyan).fg(Color::Black).add_modifier(Modifier::BOLD)
            } else {
                base
            };
            Span::styled(format!(" {} ", note.key.to_ascii_uppercase()), style)
        })
        .collect();

    let keyboard = Paragraph::new(Line::from(spans))
        .block(Block::default().title(" Keys (C4-F5) ").borders(Borders::ALL));
    frame.render_widget(keyboard, area);
}
