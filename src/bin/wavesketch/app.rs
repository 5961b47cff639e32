//! wavesketch - application state and event loop

use std::{
    collections::BTreeMap,
    io::stdout,
    path::PathBuf,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use tracing::{info, warn};
use wavesketch::{
    io::{keyboard::frequency_for_key, wav::read_wav, Recording},
    scope::{FrameClock, ScopeFrame, Trigger},
    synth::{self, AudioBackend, RingBackend},
    Engine, EngineConfig, WaveShape, Waveform, MAX_BLOCK_SIZE,
};

use crate::{
    capture::MicSession,
    ui::{
        render_canvas, render_keyboard, render_preview, render_scope, render_spectrum, Canvas,
        SpectrumAnalyzer,
    },
};

const FRAME_RATE: f32 = 60.0;
/// Without key-release events a note sounds this long after its last repeat.
const HOLD_WITHOUT_RELEASE: Duration = Duration::from_millis(600);

#[derive(Clone, Copy, PartialEq)]
enum Level {
    Info,
    Warn,
    Error,
}

pub struct App {
    engine: Engine<RingBackend>,
    _stream: cpal::Stream,
    canvas: Canvas,
    canvas_area: Rect,
    drawing: bool,
    /// Held note keys and, without release events, when they lapse.
    held: BTreeMap<char, Option<Instant>>,
    release_events: bool,
    mic: Option<MicSession>,
    wav_path: Option<PathBuf>,
    analyzer: SpectrumAnalyzer,
    scope: ScopeFrame,
    clock: FrameClock,
    status: (Level, String),
    should_quit: bool,
}

impl App {
    pub fn new(config: EngineConfig, wav_path: Option<PathBuf>) -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let output = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        let sample_rate = output.sample_rate().0 as f32;
        let channels = output.channels() as usize;

        let (backend, mut renderer) = synth::channel(&config, sample_rate);

        // Buffer reused by audio callback
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device
            .build_output_stream(
                &output.into(),
                move |data: &mut [f32], _| {
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;
                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut render_buf[..frames_to_render];
                        renderer.render_block(block);

                        // Duplicate mono to all channels
                        let out_off = frames_written * channels;
                        for (i, &s) in block.iter().enumerate() {
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }
                        frames_written += frames_to_render;
                    }
                },
                |err| warn!(%err, "output stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;
        stream.play().wrap_err("failed to start output stream")?;
        info!(sample_rate, channels, "audio output running");

        let analyzer = SpectrumAnalyzer::new(config.scope_window, sample_rate);
        let mut canvas = Canvas::new(config.resolution);
        let mut engine = Engine::new(backend, config);

        let start = Waveform::from_shape(WaveShape::Sine, canvas.samples().len())?;
        engine.set_waveform(start.clone())?;
        canvas.load(&start);

        let now = Instant::now();
        let mut app = Self {
            scope: engine.scope_frame(),
            engine,
            _stream: stream,
            canvas,
            canvas_area: Rect::default(),
            drawing: false,
            held: BTreeMap::new(),
            release_events: false,
            mic: None,
            wav_path,
            analyzer,
            clock: FrameClock::new(FRAME_RATE, now),
            status: (Level::Info, "Draw on the canvas or press M to sing".to_string()),
            should_quit: false,
        };
        if app.wav_path.is_some() {
            app.import_wav();
        }
        Ok(app)
    }

    /// Run the UI event loop until the user quits.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> EyreResult<()> {
        self.release_events = supports_keyboard_enhancement().unwrap_or(false);
        execute!(stdout(), EnableMouseCapture)?;
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let res = self.event_loop(&mut terminal);

        if self.release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        execute!(stdout(), DisableMouseCapture)?;
        self.engine.shutdown();
        res
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            if event::poll(self.clock.time_until_next(Instant::now()))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            let now = Instant::now();
            if self.clock.tick(now) {
                self.update(now);
                terminal.draw(|frame| self.render(frame))?;
            }
        }

        if self.clock.skipped() > 0 {
            info!(frames = self.clock.frames(), skipped = self.clock.skipped(), "ui frames");
        }
        Ok(())
    }

    fn set_status(&mut self, level: Level, text: impl Into<String>) {
        self.status = (level, text.into());
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let KeyCode::Char(c) = key.code else {
            if key.code == KeyCode::Esc && key.kind == KeyEventKind::Press {
                self.cancel_or_quit();
            }
            return;
        };

        if let Some(frequency) = frequency_for_key(c) {
            self.handle_note(c.to_ascii_lowercase(), frequency, key.kind);
            return;
        }
        if key.kind != KeyEventKind::Press {
            return;
        }

        match c {
            'c' if key.modifiers.contains(KeyModifiers::CONTROL) => self.should_quit = true,
            'q' | 'Q' => self.should_quit = true,
            '1' => self.load_shape(WaveShape::Sine),
            '2' => self.load_shape(WaveShape::Saw),
            '3' => self.load_shape(WaveShape::Square),
            '4' => self.load_shape(WaveShape::Triangle),
            'x' | 'X' => {
                self.canvas.clear();
                self.publish_canvas(self.canvas.samples().to_vec());
            }
            'm' | 'M' => self.start_capture(),
            'i' | 'I' => self.import_wav(),
            ' ' => {
                self.engine.stop_all();
                self.held.clear();
            }
            _ => {}
        }
    }

    fn handle_note(&mut self, key: char, frequency: f32, kind: KeyEventKind) {
        match kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                let lapse = (!self.release_events).then(|| Instant::now() + HOLD_WITHOUT_RELEASE);
                self.held.insert(key, lapse);
                self.engine.play(frequency);
            }
            KeyEventKind::Release => self.release_note(key, frequency, Instant::now()),
        }
    }

    /// Stop a note; if the stop was lost it stays held and the next frame retries.
    fn release_note(&mut self, key: char, frequency: f32, now: Instant) {
        self.engine.stop(frequency);
        if self.engine.is_playing(frequency) {
            self.held.insert(key, Some(now));
        } else {
            self.held.remove(&key);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((index, amplitude, brush)) =
                    self.canvas.point_at(self.canvas_area, mouse.column, mouse.row)
                {
                    self.drawing = true;
                    self.canvas.stroke_to(index, amplitude, brush);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drawing = false;
                if let Some(samples) = self.canvas.end_stroke() {
                    self.publish_canvas(samples);
                }
            }
            _ => {}
        }
    }

    fn publish_canvas(&mut self, samples: Vec<f32>) {
        match Waveform::new(samples).and_then(|wf| self.engine.set_waveform(wf)) {
            Ok(_) => self.set_status(Level::Info, "Waveform updated"),
            Err(err) => self.set_status(Level::Warn, format!("Kept previous sound: {err}")),
        }
    }

    fn load_shape(&mut self, shape: WaveShape) {
        match Waveform::from_shape(shape, self.canvas.samples().len()) {
            Ok(waveform) => {
                self.canvas.load(&waveform);
                self.publish_canvas(waveform.to_vec());
            }
            Err(err) => self.set_status(Level::Warn, err.to_string()),
        }
    }

    fn start_capture(&mut self) {
        if self.mic.is_some() {
            return;
        }
        match MicSession::start(Instant::now()) {
            Ok(session) => {
                self.mic = Some(session);
                self.set_status(Level::Info, "Listening... Esc cancels");
            }
            Err(err) => {
                warn!(%err, "could not start capture");
                self.set_status(Level::Error, format!("{err} (press M to retry)"));
            }
        }
    }

    fn cancel_or_quit(&mut self) {
        if self.mic.take().is_some() {
            self.set_status(Level::Info, "Capture cancelled");
        } else {
            self.should_quit = true;
        }
    }

    fn import_wav(&mut self) {
        let Some(path) = self.wav_path.clone() else {
            self.set_status(Level::Warn, "No WAV file given (use --wav)");
            return;
        };
        match read_wav(&path) {
            Ok(recording) => self.apply_recording(&recording),
            Err(err) => {
                warn!(%err, path = %path.display(), "wav import failed");
                self.set_status(Level::Warn, format!("Could not import {}: {err}", path.display()));
            }
        }
    }

    fn apply_recording(&mut self, recording: &Recording) {
        match self.engine.load_recording(recording) {
            Ok(pitch) => {
                if let Some(waveform) = self.engine.waveform() {
                    self.canvas.load(waveform);
                }
                match pitch {
                    Some(pitch) => self.set_status(
                        Level::Info,
                        format!("Captured cycle at {:.1} Hz", pitch.frequency(recording.sample_rate())),
                    ),
                    None => self.set_status(
                        Level::Warn,
                        "No clear pitch found; used the whole take as one cycle",
                    ),
                }
            }
            Err(err) => self.set_status(Level::Warn, format!("Capture discarded: {err}")),
        }
    }

    fn update(&mut self, now: Instant) {
        // Lapse notes that stopped repeating
        let lapsed: Vec<char> = self
            .held
            .iter()
            .filter(|(_, lapse)| lapse.is_some_and(|t| now >= t))
            .map(|(&key, _)| key)
            .collect();
        for key in lapsed {
            match frequency_for_key(key) {
                Some(frequency) => self.release_note(key, frequency, now),
                None => {
                    self.held.remove(&key);
                }
            }
        }

        if let Some(result) = self.mic.as_mut().and_then(|mic| mic.poll(now)) {
            // Release the device before analysing the take
            self.mic = None;
            match result {
                Ok(recording) => self.apply_recording(&recording),
                Err(err) => {
                    warn!(%err, "capture produced no audio");
                    self.set_status(Level::Warn, format!("Capture failed: {err}"));
                }
            }
        }

        self.scope = self.engine.scope_frame();
        self.analyzer.update(self.engine.backend_mut().read_tap());
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),    // Canvas
                Constraint::Length(12), // Scope + spectrum
                Constraint::Length(3),  // Keyboard
                Constraint::Length(1),  // Status
                Constraint::Length(1),  // Help
            ])
            .split(frame.area());

        self.canvas_area = render_canvas(frame, chunks[0], &self.canvas, self.drawing);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let now = Instant::now();
        match &self.mic {
            Some(mic) => render_preview(frame, panels[0], mic.preview(), &mic.status(now)),
            None => render_scope(frame, panels[0], &self.scope),
        }

        let harmonics = self
            .analyzer
            .harmonics(self.engine.spectrum(), self.engine.config().display_frequency);
        render_spectrum(frame, panels[1], self.analyzer.live(), &harmonics);

        render_keyboard(frame, chunks[2], |key| self.held.contains_key(&key));

        let (level, text) = &self.status;
        let color = match level {
            Level::Info => Color::Gray,
            Level::Warn => Color::Yellow,
            Level::Error => Color::Red,
        };
        let voices = self.engine.active_voices();
        let lock = match self.scope.trigger {
            Trigger::Reference => "locked",
            Trigger::ZeroCrossing => "free",
        };
        frame.render_widget(
            Paragraph::new(format!(" {text}  |  voices: {voices}  scope: {lock}"))
                .style(Style::default().fg(color)),
            chunks[3],
        );

        let help = Paragraph::new(
            " [A-'] Play  [Mouse] Draw  [1-4] Shapes  [X] Clear  [M] Sing  [I] Import  [Space] Stop  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
