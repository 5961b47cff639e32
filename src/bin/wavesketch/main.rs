//! wavesketch - draw or sing a waveform, then play it from the keyboard
//!
//! Run with: cargo run -- [--wav voice.wav] [--log wavesketch.log]

mod app;
mod capture;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use wavesketch::{AnalysisStrategy, EngineConfig, GainPolicy, ScopeSource};

use app::App;

#[derive(Parser)]
#[command(name = "wavesketch")]
#[command(about = "Draw or sing a single-cycle waveform and play it", long_about = None)]
struct Cli {
    /// Load a recorded voice (WAV) as the starting waveform
    #[arg(short, long)]
    wav: Option<PathBuf>,

    /// Write logs to this file (the terminal belongs to the UI)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Include debug-level events in the log
    #[arg(short, long)]
    verbose: bool,

    /// How waveforms are turned into harmonics
    #[arg(long, value_enum, default_value_t = Analysis::Fft)]
    analysis: Analysis,

    /// Harmonic cap for --analysis direct
    #[arg(long, default_value = "64")]
    harmonics: usize,

    /// Per-voice gain policy
    #[arg(long, value_enum, default_value_t = Gain::Normalized)]
    gain: Gain,

    /// Output ceiling 0.0-1.0
    #[arg(long, default_value = "0.2")]
    master_gain: f32,

    /// Frequency whose period the scope shows (Hz)
    #[arg(long, default_value = "440")]
    display_frequency: f32,

    /// What the scope listens to
    #[arg(long, value_enum, default_value_t = Scope::Monitor)]
    scope: Scope,
}

#[derive(Clone, Copy, ValueEnum)]
enum Analysis {
    Fft,
    Direct,
}

#[derive(Clone, Copy, ValueEnum)]
enum Gain {
    Normalized,
    Fixed,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scope {
    Monitor,
    Output,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let analysis = match self.analysis {
            Analysis::Fft => AnalysisStrategy::Fft,
            Analysis::Direct => AnalysisStrategy::Direct {
                harmonics: self.harmonics.max(1),
            },
        };
        let gain_policy = match self.gain {
            Gain::Normalized => GainPolicy::Normalized,
            Gain::Fixed => GainPolicy::Fixed,
        };
        let scope_source = match self.scope {
            Scope::Monitor => ScopeSource::Monitor,
            Scope::Output => ScopeSource::Output,
        };

        EngineConfig::default()
            .with_analysis(analysis)
            .with_gain_policy(gain_policy)
            .with_master_gain(self.master_gain)
            .with_display_frequency(self.display_frequency)
            .with_scope_source(scope_source)
    }
}

fn init_logging(path: &Path, verbose: bool) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(path) = &cli.log {
        init_logging(path, cli.verbose)?;
    }

    let app = App::new(cli.engine_config(), cli.wav)?;

    let terminal = ratatui::init();
    let res = app.run(terminal);
    ratatui::restore();
    res
}
