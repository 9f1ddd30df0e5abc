//! WAV file reading, writing and offline rendering.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result, StreamDriver, render_offline};

/// WAV file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32; 32 is written as float).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Reads a WAV file as interleaved f32 samples in `[-1, 1]`.
///
/// # Example
/// ```ignore
/// let (samples, spec) = read_wav("input.wav")?;
/// println!("{} frames at {} Hz", samples.len() / spec.channels as usize, spec.sample_rate);
/// ```
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());

    let samples = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok((samples, spec))
}

/// Writes interleaved samples to a WAV file.
///
/// Integer formats are clamped to the representable range.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Renders `input_path` through the driver's engine into `output_path`.
///
/// The file must match the engine's sample rate and channel count. Output
/// keeps the input's bit depth.
pub fn render_file<P: AsRef<Path>, Q: AsRef<Path>>(
    driver: &mut StreamDriver,
    input_path: P,
    output_path: Q,
    callback_frames: usize,
) -> Result<WavSpec> {
    let (samples, spec) = read_wav(input_path.as_ref())?;
    let format = driver.format();
    if spec.channels as usize != format.channels || spec.sample_rate as f32 != format.sample_rate {
        return Err(Error::UnsupportedFormat(format!(
            "{} has {} ch at {} Hz, engine runs {} ch at {} Hz",
            input_path.as_ref().display(),
            spec.channels,
            spec.sample_rate,
            format.channels,
            format.sample_rate
        )));
    }

    let rendered = render_offline(driver, &samples, callback_frames);
    write_wav(output_path.as_ref(), &rendered, spec)?;
    tracing::info!(
        input = %input_path.as_ref().display(),
        output = %output_path.as_ref().display(),
        frames = rendered.len() / format.channels,
        "file rendered"
    );
    Ok(spec)
}
