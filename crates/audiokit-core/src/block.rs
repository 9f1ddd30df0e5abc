//! Fixed-shape audio blocks.
//!
//! An [`AudioBlock`] is allocated once for a [`BlockFormat`] and reused for
//! every callback afterwards. Samples are stored planar: channel `c` occupies
//! `data[c * frames..(c + 1) * frames]`.

use core::fmt;
use core::time::Duration;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::math::saturate;

/// Stream shape negotiated once at stream start.
///
/// Sample rate, frame count and channel count stay fixed for the lifetime of
/// the stream; every block the engine touches has exactly this shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockFormat {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Frames per block.
    pub frames: usize,
    /// Channels per frame.
    pub channels: usize,
}

impl BlockFormat {
    /// Creates a format without validating it.
    pub const fn new(sample_rate: f32, frames: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            frames,
            channels,
        }
    }

    /// Rejects shapes no stream can run with.
    pub fn validate(&self) -> Result<(), FormatError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(FormatError::SampleRate(self.sample_rate));
        }
        if self.frames == 0 {
            return Err(FormatError::EmptyBlock);
        }
        if self.channels == 0 {
            return Err(FormatError::NoChannels);
        }
        Ok(())
    }

    /// Wall-clock duration of one block, i.e. the processing deadline.
    ///
    /// 1024 frames at 44.1 kHz gives roughly 23.2 ms.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs_f64(self.frames as f64 / f64::from(self.sample_rate))
    }

    /// Half the sample rate.
    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Samples in one interleaved block (`frames * channels`).
    pub fn samples(&self) -> usize {
        self.frames * self.channels
    }
}

impl Default for BlockFormat {
    fn default() -> Self {
        Self::new(44100.0, 1024, 2)
    }
}

/// Reasons a [`BlockFormat`] is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatError {
    /// Sample rate is zero, negative or not finite.
    SampleRate(f32),
    /// Zero frames per block.
    EmptyBlock,
    /// Zero channels.
    NoChannels,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRate(sr) => write!(f, "sample rate {sr} is not a positive finite number"),
            Self::EmptyBlock => write!(f, "block must contain at least one frame"),
            Self::NoChannels => write!(f, "block must contain at least one channel"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}

/// Planar multi-channel sample buffer of fixed shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    data: Vec<f32>,
    frames: usize,
    channels: usize,
}

impl AudioBlock {
    /// Allocates a silent block.
    pub fn new(frames: usize, channels: usize) -> Self {
        Self {
            data: vec![0.0; frames * channels],
            frames,
            channels,
        }
    }

    /// Allocates a silent block shaped like `format`.
    pub fn for_format(format: &BlockFormat) -> Self {
        Self::new(format.frames, format.channels)
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// True when `other` has the same frame and channel count.
    pub fn same_shape(&self, other: &AudioBlock) -> bool {
        self.frames == other.frames && self.channels == other.channels
    }

    /// Samples of one channel. Panics if `channel >= channels()`.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        let start = channel * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Mutable samples of one channel. Panics if `channel >= channels()`.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.frames;
        &mut self.data[start..start + self.frames]
    }

    /// All samples, channel after channel.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Fills the block with silence.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Copies the overlapping region of `src` and silences the remainder.
    pub fn copy_from(&mut self, src: &AudioBlock) {
        if self.same_shape(src) {
            self.data.copy_from_slice(&src.data);
            return;
        }
        let frames = self.frames.min(src.frames);
        for ch in 0..self.channels {
            let dst = self.channel_mut(ch);
            if ch < src.channels {
                dst[..frames].copy_from_slice(&src.channel(ch)[..frames]);
                dst[frames..].fill(0.0);
            } else {
                dst.fill(0.0);
            }
        }
    }

    /// Adds the overlapping region of `src` into this block without clipping.
    ///
    /// Call [`saturate`](Self::saturate) once all contributions are summed.
    pub fn mix_from(&mut self, src: &AudioBlock) {
        let frames = self.frames.min(src.frames);
        let channels = self.channels.min(src.channels);
        for ch in 0..channels {
            let s = &src.channel(ch)[..frames];
            for (d, &x) in self.channel_mut(ch)[..frames].iter_mut().zip(s) {
                *d += x;
            }
        }
    }

    /// Clamps every sample to full scale.
    pub fn saturate(&mut self) {
        for s in &mut self.data {
            *s = saturate(*s);
        }
    }

    /// Peak absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()))
    }

    /// True when no sample is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|s| s.is_finite())
    }

    /// Overwrites frame `frame` from an interleaved frame slice.
    ///
    /// Extra source channels are ignored; missing ones are written as silence.
    #[inline]
    pub fn write_frame(&mut self, frame: usize, src: &[f32]) {
        for ch in 0..self.channels {
            let value = src.get(ch).copied().unwrap_or(0.0);
            self.data[ch * self.frames + frame] = value;
        }
    }

    /// Copies frame `frame` into an interleaved frame slice.
    ///
    /// Destination channels beyond the block's channel count are silenced.
    #[inline]
    pub fn read_frame(&self, frame: usize, dst: &mut [f32]) {
        for (ch, out) in dst.iter_mut().enumerate() {
            *out = if ch < self.channels {
                self.data[ch * self.frames + frame]
            } else {
                0.0
            };
        }
    }

    /// Loads an interleaved buffer with the block's channel count.
    ///
    /// Frames missing from `src` are silenced.
    pub fn read_interleaved(&mut self, src: &[f32]) {
        for frame in 0..self.frames {
            let start = frame * self.channels;
            match src.get(start..start + self.channels) {
                Some(samples) => self.write_frame(frame, samples),
                None => self.write_frame(frame, &[]),
            }
        }
    }

    /// Writes the block into an interleaved buffer with the block's channel count.
    pub fn write_interleaved(&self, dst: &mut [f32]) {
        for (frame, out) in dst.chunks_exact_mut(self.channels).take(self.frames).enumerate() {
            self.read_frame(frame, out);
        }
    }
}
