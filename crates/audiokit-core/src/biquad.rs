//! Second-order IIR section.
//!
//! Coefficients follow the RBJ Audio EQ Cookbook. Only the low-pass response is
//! needed by the engine's filter node.

use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Biquad filter coefficients and state.
///
/// Direct Form I:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
///
/// The state (`x1`, `x2`, `y1`, `y2`) survives coefficient changes, so a
/// filter can be retuned between blocks without a discontinuity in its memory.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a biquad with passthrough coefficients (`y[n] = x[n]`).
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Switches to exact passthrough coefficients, keeping the state.
    pub fn set_passthrough(&mut self) {
        self.set_coefficients(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter memory without touching the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Gain of the current coefficients at DC: `(b0+b1+b2) / (1+a1+a2)`.
    pub fn dc_gain(&self) -> f32 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Low-pass coefficients from the RBJ cookbook.
///
/// Returns `(b0, b1, b2, a0, a1, a2)`; feed them to
/// [`Biquad::set_coefficients`]. `q` of 0.707 gives a Butterworth response.
pub fn lowpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_passthrough() {
        let mut bq = Biquad::new();
        for x in [0.5, -0.25, 1.0, 0.0] {
            assert_eq!(bq.process(x), x);
        }
    }

    #[test]
    fn lowpass_has_unity_dc_gain() {
        let mut bq = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, 48000.0);
        bq.set_coefficients(b0, b1, b2, a0, a1, a2);
        assert!((bq.dc_gain() - 1.0).abs() < 1e-4);

        let mut y = 0.0;
        for _ in 0..4800 {
            y = bq.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-3, "settled at {y}");
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let sr = 48000.0;
        let mut bq = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(500.0, 0.707, sr);
        bq.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mut peak: f32 = 0.0;
        for n in 0..4800 {
            let x = libm::sinf(2.0 * PI * 10_000.0 * n as f32 / sr);
            let y = bq.process(x);
            if n > 2400 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.01, "10 kHz leaked through at {peak}");
    }

    #[test]
    fn clear_keeps_coefficients() {
        let mut bq = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(200.0, 0.707, 48000.0);
        bq.set_coefficients(b0, b1, b2, a0, a1, a2);
        let first = bq.process(1.0);
        bq.process(0.3);
        bq.clear();
        assert_eq!(bq.process(1.0), first);
    }
}
