//! Microphone capture session
//!
//! Opening a session grabs the default input device and starts a live
//! preview. After a short countdown it keeps a fixed-length take and hands it
//! back as a [`Recording`]. The device is released when the session is
//! dropped, whichever way it ends: finished, cancelled, or failed.

use std::time::{Duration, Instant};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Sample,
};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{info, warn};
use wavesketch::{io::Recording, Result, WaveError};

pub const COUNTDOWN: Duration = Duration::from_secs(3);
pub const TAKE_LENGTH: Duration = Duration::from_millis(500);
/// Extra time allowed for input latency before a short take is accepted.
const TAKE_TIMEOUT_SLACK: Duration = Duration::from_secs(1);
const PREVIEW_LEN: usize = 1024;

/// Live input stream feeding a ring. Dropping it stops the device.
struct MicInput {
    _stream: cpal::Stream,
    rx: Consumer<f32>,
    sample_rate: f32,
}

impl MicInput {
    fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| WaveError::unavailable("microphone", "no default input device"))?;
        let supported = device
            .default_input_config()
            .map_err(|err| WaveError::unavailable("microphone", err.to_string()))?;

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels().max(1) as usize;
        let (tx, rx) = RingBuffer::new((sample_rate as usize).max(PREVIEW_LEN));
        let config: cpal::StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, tx)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, tx)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, tx)?,
            other => {
                return Err(WaveError::unavailable(
                    "microphone",
                    format!("unsupported sample format {other}"),
                ))
            }
        };
        stream
            .play()
            .map_err(|err| WaveError::unavailable("microphone", err.to_string()))?;

        info!(sample_rate, channels, "microphone opened");
        Ok(Self {
            _stream: stream,
            rx,
            sample_rate,
        })
    }
}

impl Drop for MicInput {
    fn drop(&mut self) {
        info!("microphone released");
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    mut tx: Producer<f32>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // First channel only; drop on overflow.
                for frame in data.chunks(channels) {
                    if tx.push(frame[0].to_sample::<f32>()).is_err() {
                        break;
                    }
                }
            },
            |err| warn!(%err, "input stream error"),
            None,
        )
        .map_err(|err| WaveError::unavailable("microphone", err.to_string()))
}

fn append_preview(window: &mut [f32], samples: &[f32]) {
    let len = window.len();
    if samples.len() >= len {
        window.copy_from_slice(&samples[samples.len() - len..]);
    } else {
        window.copy_within(samples.len().., 0);
        window[len - samples.len()..].copy_from_slice(samples);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Countdown { until: Instant },
    /// `deadline` only guards against an input that stops delivering.
    Recording { deadline: Instant },
}

/// A take is done once it holds `wanted` samples, or at the deadline with
/// whatever arrived.
fn take_finished(collected: usize, wanted: usize, now: Instant, deadline: Instant) -> bool {
    collected >= wanted || now >= deadline
}

pub struct MicSession {
    input: MicInput,
    phase: Phase,
    take: Vec<f32>,
    take_len: usize,
    preview: Vec<f32>,
}

impl MicSession {
    pub fn start(now: Instant) -> Result<Self> {
        let input = MicInput::open()?;
        let take_len = (input.sample_rate * TAKE_LENGTH.as_secs_f32()).ceil() as usize;
        Ok(Self {
            input,
            phase: Phase::Countdown {
                until: now + COUNTDOWN,
            },
            take: Vec::with_capacity(take_len),
            take_len,
            preview: vec![0.0; PREVIEW_LEN],
        })
    }

    /// Pull new input. Returns the take once it is full or has timed out.
    pub fn poll(&mut self, now: Instant) -> Option<Result<Recording>> {
        let recording = matches!(self.phase, Phase::Recording { .. });
        let available = self.input.rx.slots();
        if let Ok(chunk) = self.input.rx.read_chunk(available) {
            let (first, second) = chunk.as_slices();
            for part in [first, second] {
                append_preview(&mut self.preview, part);
                if recording {
                    let room = self.take_len - self.take.len();
                    self.take.extend_from_slice(&part[..part.len().min(room)]);
                }
            }
            chunk.commit_all();
        }

        match self.phase {
            Phase::Countdown { until } if now >= until => {
                self.phase = Phase::Recording {
                    deadline: now + TAKE_LENGTH + TAKE_TIMEOUT_SLACK,
                };
                None
            }
            Phase::Recording { deadline }
                if take_finished(self.take.len(), self.take_len, now, deadline) =>
            {
                let samples = std::mem::take(&mut self.take);
                if samples.len() < self.take_len {
                    warn!(samples = samples.len(), wanted = self.take_len, "take cut short by timeout");
                } else {
                    info!(samples = samples.len(), "take finished");
                }
                Some(Recording::new(samples, self.input.sample_rate))
            }
            _ => None,
        }
    }

    /// Most recent input samples, for the live preview.
    pub fn preview(&self) -> &[f32] {
        &self.preview
    }

    pub fn status(&self, now: Instant) -> String {
        match self.phase {
            Phase::Countdown { until } => {
                let left = until.saturating_duration_since(now).as_secs_f32().ceil();
                format!("Listening... recording in {left:.0}")
            }
            Phase::Recording { .. } => "Recording...".to_string(),
        }
    }
}
