//! Resonant low-pass filter node.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use audiokit_core::{
    AudioBlock, Biquad, BlockFormat, Effect, ParamDescriptor, ParamUnit, ParameterInfo,
    lowpass_coefficients,
};

/// Lowest accepted cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 10.0;

const CUTOFF: ParamDescriptor = ParamDescriptor::float(
    "cutoff",
    "Cutoff",
    "Corner frequency of the low-pass response",
    ParamUnit::Hertz,
    MIN_CUTOFF_HZ,
    20000.0,
    1000.0,
);

const RESONANCE: ParamDescriptor = ParamDescriptor::float(
    "resonance",
    "Resonance",
    "Q of the corner peak (0.707 is maximally flat)",
    ParamUnit::None,
    0.1,
    20.0,
    0.707,
);

/// Second-order low-pass with one biquad section per channel.
///
/// Coefficient changes are deferred: setters only mark the filter dirty and
/// the new response is computed at the top of the next
/// [`process_block`](Effect::process_block). Filter memory carries across
/// blocks and across retuning.
///
/// A cutoff at Nyquist switches the sections to exact passthrough, so DC and
/// everything else passes at unity gain.
///
/// ## Parameter Indices (`ParameterInfo`)
///
/// | Index | Name | Range | Default |
/// |-------|------|-------|---------|
/// | 0 | cutoff | 10.0–Nyquist Hz | 1000.0 |
/// | 1 | resonance | 0.1–20.0 | 0.707 |
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    sections: Vec<Biquad>,
    cutoff: f32,
    resonance: f32,
    sample_rate: f32,
    needs_update: bool,
}

impl LowPassFilter {
    /// Creates a filter with default cutoff and resonance for `format`.
    pub fn new(format: &BlockFormat) -> Self {
        let mut filter = Self {
            sections: vec![Biquad::new(); format.channels],
            cutoff: CUTOFF.default,
            resonance: RESONANCE.default,
            sample_rate: format.sample_rate,
            needs_update: true,
        };
        filter.update_coefficients();
        filter
    }

    /// Sets the cutoff in Hz, clamped to `[10, Nyquist]`.
    pub fn set_cutoff_hz(&mut self, cutoff: f32) {
        self.cutoff = cutoff.clamp(MIN_CUTOFF_HZ, self.nyquist());
        self.needs_update = true;
    }

    /// Current cutoff in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff
    }

    /// Sets the resonance (Q), clamped to `[0.1, 20]`.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = RESONANCE.clamp(q);
        self.needs_update = true;
    }

    /// Current resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// True when a parameter changed since the last coefficient update.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    fn update_coefficients(&mut self) {
        if self.cutoff >= self.nyquist() {
            for section in &mut self.sections {
                section.set_passthrough();
            }
        } else {
            let (b0, b1, b2, a0, a1, a2) =
                lowpass_coefficients(self.cutoff, self.resonance, self.sample_rate);
            for section in &mut self.sections {
                section.set_coefficients(b0, b1, b2, a0, a1, a2);
            }
        }
        self.needs_update = false;
    }
}

impl Effect for LowPassFilter {
    fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
        if self.needs_update {
            self.update_coefficients();
        }

        let frames = input.frames().min(output.frames());
        for ch in 0..output.channels() {
            let out = output.channel_mut(ch);
            match self.sections.get_mut(ch) {
                Some(section) if ch < input.channels() => {
                    for (o, &x) in out[..frames].iter_mut().zip(&input.channel(ch)[..frames]) {
                        *o = section.process(x);
                    }
                    out[frames..].fill(0.0);
                }
                _ => out.fill(0.0),
            }
        }
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
        self.update_coefficients();
    }
}

impl ParameterInfo for LowPassFilter {
    fn param_count(&self) -> usize {
        2
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(CUTOFF.with_max(self.nyquist())),
            1 => Some(RESONANCE),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.cutoff,
            1 => self.resonance,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.set_cutoff_hz(value),
            1 => self.set_resonance(value),
            _ => {}
        }
    }
}
