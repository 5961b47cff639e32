//! WAV import for recorded voices.
//!
//! Only the first channel is kept; the pitch detector wants a single mono
//! signal and the left channel of a voice memo is as good as any.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use tracing::info;

use crate::{
    error::{Result, WaveError},
    io::Recording,
};

pub fn read_wav(path: impl AsRef<Path>) -> Result<Recording> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| WaveError::Decode(hound::Error::IoError(err)))?;
    let recording = decode_wav(BufReader::new(file))?;
    info!(
        path = %path.display(),
        samples = recording.samples().len(),
        sample_rate = recording.sample_rate(),
        "loaded recording"
    );
    Ok(recording)
}

/// Decode WAV data into a mono [`Recording`].
pub fn decode_wav<R: Read>(reader: R) -> Result<Recording> {
    let mut reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let samples = interleaved.into_iter().step_by(channels).collect();
    Recording::new(samples, spec.sample_rate as f32)
}
