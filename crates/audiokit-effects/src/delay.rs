//! Feedback delay over a fixed-capacity ring.
//!
//! Per frame and channel:
//!
//! ```text
//! delayed = ring[cursor - d]
//! ring[cursor] = input + feedback * delayed
//! output = (1 - mix) * input + mix * delayed
//! ```
//!
//! The ring is sized once for [`MAX_DELAY_MS`]; changing the delay time moves
//! the read offset and never reallocates.

use audiokit_core::{
    AudioBlock, BlockFormat, DelayRing, Effect, ParamDescriptor, ParamUnit, ParameterInfo,
    flush_denormal,
};
use libm::{ceilf, roundf};

/// Longest delay time in milliseconds.
pub const MAX_DELAY_MS: f32 = 2000.0;

/// Largest feedback magnitude. Strictly below one so the loop always decays.
pub const MAX_FEEDBACK: f32 = 0.95;

const PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::float(
        "delay_time",
        "Delay Time",
        "Distance between echoes",
        ParamUnit::Milliseconds,
        1.0,
        MAX_DELAY_MS,
        500.0,
    ),
    ParamDescriptor::float(
        "feedback",
        "Feedback",
        "Share of each echo fed back into the line; negative values invert",
        ParamUnit::None,
        -MAX_FEEDBACK,
        MAX_FEEDBACK,
        0.3,
    ),
    ParamDescriptor::float(
        "mix",
        "Mix",
        "Wet share of the output (0 dry, 1 wet)",
        ParamUnit::None,
        0.0,
        1.0,
        0.5,
    ),
];

/// Multi-channel feedback delay.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | delay_time | 1.0–2000.0 ms | 500.0 |
/// | 1 | feedback | -0.95–0.95 | 0.3 |
/// | 2 | mix | 0.0–1.0 | 0.5 |
///
/// # Example
///
/// ```rust
/// use audiokit_core::BlockFormat;
/// use audiokit_effects::Delay;
///
/// let mut delay = Delay::new(&BlockFormat::new(1000.0, 64, 1));
/// delay.set_delay_ms(100.0);
/// assert_eq!(delay.delay_samples(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct Delay {
    ring: DelayRing,
    delay_ms: f32,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
    sample_rate: f32,
}

impl Delay {
    /// Creates a delay with default settings, allocating the full ring.
    pub fn new(format: &BlockFormat) -> Self {
        let capacity = ceilf(MAX_DELAY_MS * 0.001 * format.sample_rate) as usize + 1;
        let mut delay = Self {
            ring: DelayRing::new(format.channels, capacity),
            delay_ms: PARAMS[0].default,
            delay_samples: 1,
            feedback: PARAMS[1].default,
            mix: PARAMS[2].default,
            sample_rate: format.sample_rate,
        };
        delay.set_delay_ms(PARAMS[0].default);
        delay
    }

    /// Sets the delay time in milliseconds.
    pub fn set_delay_ms(&mut self, ms: f32) {
        self.delay_ms = PARAMS[0].clamp(ms);
        let samples = roundf(self.delay_ms * 0.001 * self.sample_rate) as usize;
        self.delay_samples = samples.clamp(1, self.ring.max_delay());
    }

    /// Current delay time in milliseconds.
    pub fn delay_ms(&self) -> f32 {
        self.delay_ms
    }

    /// Current delay in whole samples.
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Sets the feedback, clamped to `±MAX_FEEDBACK`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-MAX_FEEDBACK, MAX_FEEDBACK);
    }

    /// Current feedback.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sets the wet/dry mix, clamped to `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Current wet/dry mix.
    pub fn mix(&self) -> f32 {
        self.mix
    }
}

impl Effect for Delay {
    fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
        let frames = input.frames().min(output.frames());
        let channels = input
            .channels()
            .min(output.channels())
            .min(self.ring.channels());
        let d = self.delay_samples;

        for n in 0..frames {
            for ch in 0..channels {
                let x = input.channel(ch)[n];
                let delayed = self.ring.read(ch, d);
                self.ring.write(ch, flush_denormal(x + self.feedback * delayed));
                output.channel_mut(ch)[n] = (1.0 - self.mix) * x + self.mix * delayed;
            }
            self.ring.advance();
        }

        for ch in 0..output.channels() {
            let out = output.channel_mut(ch);
            if ch < channels {
                out[frames..].fill(0.0);
            } else {
                out.fill(0.0);
            }
        }
    }

    fn reset(&mut self) {
        self.ring.clear();
    }
}

impl ParameterInfo for Delay {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.delay_ms,
            1 => self.feedback,
            2 => self.mix,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.set_delay_ms(value),
            1 => self.set_feedback(value),
            2 => self.set_mix(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec::Vec;

    /// 1 kHz so that one millisecond is exactly one sample.
    fn format() -> BlockFormat {
        BlockFormat::new(1000.0, 64, 1)
    }

    fn render(delay: &mut Delay, input: &[f32]) -> Vec<f32> {
        let format = format();
        let mut out = Vec::with_capacity(input.len());
        let mut in_block = AudioBlock::for_format(&format);
        let mut out_block = AudioBlock::for_format(&format);
        for chunk in input.chunks(format.frames) {
            in_block.clear();
            in_block.channel_mut(0)[..chunk.len()].copy_from_slice(chunk);
            delay.process_block(&in_block, &mut out_block);
            out.extend_from_slice(&out_block.channel(0)[..chunk.len()]);
        }
        out
    }

    #[test]
    fn impulse_repeats_every_delay_scaled_by_feedback() {
        let mut delay = Delay::new(&format());
        delay.set_delay_ms(100.0);
        delay.set_feedback(0.5);
        delay.set_mix(1.0);

        let mut input = alloc::vec![0.0; 1000];
        input[0] = 1.0;
        let out = render(&mut delay, &input);

        for (n, &y) in out.iter().enumerate() {
            if n > 0 && n % 100 == 0 {
                let k = (n / 100) as i32;
                assert_eq!(y, 0.5_f32.powi(k - 1), "echo {k} at sample {n}");
            } else {
                assert_eq!(y, 0.0, "unexpected output at sample {n}");
            }
        }
    }

    #[test]
    fn silence_in_silence_out() {
        let mut delay = Delay::new(&format());
        delay.set_feedback(-MAX_FEEDBACK);
        let out = render(&mut delay, &alloc::vec![0.0; 3000]);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn dry_only_when_mix_is_zero() {
        let mut delay = Delay::new(&format());
        delay.set_mix(0.0);
        let input: Vec<f32> = (0..200).map(|i| (i as f32 * 0.1).sin()).collect();
        assert_eq!(render(&mut delay, &input), input);
    }

    #[test]
    fn feedback_magnitude_stays_below_one() {
        let mut delay = Delay::new(&format());
        delay.set_feedback(1.5);
        assert_eq!(delay.feedback(), MAX_FEEDBACK);
        delay.set_feedback(-7.0);
        assert_eq!(delay.feedback(), -MAX_FEEDBACK);
    }

    #[test]
    fn delay_time_rounds_and_clamps() {
        let mut delay = Delay::new(&BlockFormat::new(44100.0, 64, 2));
        assert_eq!(delay.delay_samples(), 22050);
        delay.set_delay_ms(MAX_DELAY_MS);
        assert_eq!(delay.delay_samples(), 88200);
        delay.set_delay_ms(0.0);
        assert_eq!(delay.delay_ms(), 1.0);
        assert_eq!(delay.delay_samples(), 44);
    }

    #[test]
    fn reset_clears_pending_echoes() {
        let mut delay = Delay::new(&format());
        delay.set_delay_ms(10.0);
        delay.set_mix(1.0);
        let mut input = alloc::vec![0.0; 5];
        input[0] = 1.0;
        render(&mut delay, &input);
        delay.reset();
        let out = render(&mut delay, &alloc::vec![0.0; 50]);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
