//! Scalar helpers shared by the effect algorithms and the scheduler.
//!
//! All functions go through `libm` so the crate stays `no_std` compatible.

use libm::{expf, logf};

/// Smallest linear magnitude considered by [`linear_to_db`].
///
/// Keeps `log(0)` out of the level detector; corresponds to -200 dB.
pub const LEVEL_FLOOR: f32 = 1e-10;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use audiokit_core::db_to_linear;
///
/// assert_eq!(db_to_linear(0.0), 1.0);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear magnitude to decibels.
///
/// Magnitudes below [`LEVEL_FLOOR`] are treated as the floor, so silence maps
/// to -200 dB instead of negative infinity.
///
/// # Example
/// ```rust
/// use audiokit_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) + 6.02).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(LEVEL_FLOOR)) * FACTOR
}

/// Flush values in the subnormal neighbourhood to zero.
///
/// Used on every feedback write so a decaying loop settles at exact zero
/// instead of crawling through denormals.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Clamp a sample to the full-scale range `[-1.0, 1.0]`.
///
/// Fan-in summation saturates through this instead of wrapping.
#[inline]
pub fn saturate(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}
