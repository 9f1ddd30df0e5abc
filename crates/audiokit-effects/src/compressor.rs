//! Feed-forward peak compressor.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Peak (linked) → Level dB → Gain Computer → Envelope → 10^((env+makeup)/20) → Output
//! ```
//!
//! # Parameters
//!
//! | Parameter | Range | Description |
//! |-----------|-------|-------------|
//! | threshold | -60 to 0 dB | Level where compression begins |
//! | ratio | 1:1 to 20:1 | Compression strength |
//! | attack | 0.1-500 ms | How fast gain reduction engages |
//! | release | 1-5000 ms | How fast gain reduction recovers |
//! | makeup | 0-24 dB | Output level compensation |

use audiokit_core::{
    AudioBlock, BlockFormat, Effect, ParamDescriptor, ParamUnit, ParameterInfo, db_to_linear,
    linear_to_db,
};
use libm::expf;

const PARAMS: [ParamDescriptor; 5] = [
    ParamDescriptor::float(
        "threshold",
        "Threshold",
        "Level above which gain reduction starts",
        ParamUnit::Decibels,
        -60.0,
        0.0,
        -20.0,
    ),
    ParamDescriptor::float(
        "ratio",
        "Ratio",
        "Input dB above threshold per output dB",
        ParamUnit::Ratio,
        1.0,
        20.0,
        4.0,
    ),
    ParamDescriptor::float(
        "attack",
        "Attack",
        "Time constant while gain reduction increases",
        ParamUnit::Milliseconds,
        0.1,
        500.0,
        5.0,
    ),
    ParamDescriptor::float(
        "release",
        "Release",
        "Time constant while gain reduction recovers",
        ParamUnit::Milliseconds,
        1.0,
        5000.0,
        50.0,
    ),
    ParamDescriptor::float(
        "makeup",
        "Makeup",
        "Gain added after compression",
        ParamUnit::Decibels,
        0.0,
        24.0,
        0.0,
    ),
];

/// One-pole smoothing coefficient for a time constant in milliseconds.
#[inline]
fn time_coefficient(ms: f32, sample_rate: f32) -> f32 {
    1.0 - expf(-1.0 / (ms * 0.001 * sample_rate))
}

/// Peak compressor with a single envelope shared by all channels.
///
/// The envelope is a gain-reduction value in dB (always `<= 0`). Each frame it
/// moves toward the target of the gain computer with the attack coefficient
/// when the target is lower (more reduction) and with the release coefficient
/// otherwise. It persists across blocks.
///
/// With `ratio == 1` the target is always 0 dB, so the output equals the input
/// times the makeup gain regardless of threshold.
///
/// # Example
///
/// ```rust
/// use audiokit_core::BlockFormat;
/// use audiokit_effects::Compressor;
///
/// let mut comp = Compressor::new(&BlockFormat::new(48000.0, 256, 2));
/// comp.set_threshold_db(-18.0);
/// comp.set_ratio(4.0);
/// assert_eq!(comp.gain_reduction_db(-6.0), -9.0);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    makeup_db: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope_db: f32,
    sample_rate: f32,
}

impl Compressor {
    /// Creates a compressor with default settings for `format`.
    pub fn new(format: &BlockFormat) -> Self {
        let sample_rate = format.sample_rate;
        Self {
            threshold_db: PARAMS[0].default,
            ratio: PARAMS[1].default,
            attack_ms: PARAMS[2].default,
            release_ms: PARAMS[3].default,
            makeup_db: PARAMS[4].default,
            attack_coeff: time_coefficient(PARAMS[2].default, sample_rate),
            release_coeff: time_coefficient(PARAMS[3].default, sample_rate),
            envelope_db: 0.0,
            sample_rate,
        }
    }

    /// Sets the threshold in dB.
    pub fn set_threshold_db(&mut self, db: f32) {
        self.threshold_db = PARAMS[0].clamp(db);
    }

    /// Sets the ratio (`n:1`).
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = PARAMS[1].clamp(ratio);
    }

    /// Sets the attack time in milliseconds.
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.attack_ms = PARAMS[2].clamp(ms);
        self.attack_coeff = time_coefficient(self.attack_ms, self.sample_rate);
    }

    /// Sets the release time in milliseconds.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.release_ms = PARAMS[3].clamp(ms);
        self.release_coeff = time_coefficient(self.release_ms, self.sample_rate);
    }

    /// Sets the makeup gain in dB.
    pub fn set_makeup_db(&mut self, db: f32) {
        self.makeup_db = PARAMS[4].clamp(db);
    }

    /// Current envelope (gain reduction in dB, `<= 0`).
    pub fn envelope_db(&self) -> f32 {
        self.envelope_db
    }

    /// Static curve: `min(0, -(level - threshold) * (1 - 1/ratio))`.
    #[inline]
    pub fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let overshoot = level_db - self.threshold_db;
        (-overshoot * (1.0 - 1.0 / self.ratio)).min(0.0)
    }
}

impl Effect for Compressor {
    fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
        let frames = input.frames().min(output.frames());
        let channels = input.channels().min(output.channels());

        for n in 0..frames {
            let mut peak = 0.0_f32;
            for ch in 0..channels {
                peak = peak.max(input.channel(ch)[n].abs());
            }

            let target = self.gain_reduction_db(linear_to_db(peak));
            let coeff = if target < self.envelope_db {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope_db += (target - self.envelope_db) * coeff;

            let gain = db_to_linear(self.envelope_db + self.makeup_db);
            for ch in 0..channels {
                output.channel_mut(ch)[n] = input.channel(ch)[n] * gain;
            }
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
        self.envelope_db = 0.0;
    }
}

impl ParameterInfo for Compressor {
    fn param_count(&self) -> usize {
        PARAMS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAMS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.threshold_db,
            1 => self.ratio,
            2 => self.attack_ms,
            3 => self.release_ms,
            4 => self.makeup_db,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.set_threshold_db(value),
            1 => self.set_ratio(value),
            2 => self.set_attack_ms(value),
            3 => self.set_release_ms(value),
            4 => self.set_makeup_db(value),
            _ => {}
        }
    }
}
