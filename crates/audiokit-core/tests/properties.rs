//! Property-based tests for audiokit-core primitives.
//!
//! Covers low-pass stability, fan-in saturation, ring addressing and
//! parameter validation using proptest for randomized inputs.

use audiokit_core::{
    AudioBlock, Biquad, DelayRing, ParamDescriptor, ParamUnit, ParamValue, lowpass_coefficients,
};
use proptest::prelude::*;

const RATIO: ParamDescriptor = ParamDescriptor::float(
    "ratio",
    "Ratio",
    "Compression ratio",
    ParamUnit::Ratio,
    1.0,
    20.0,
    4.0,
);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Any cutoff below Nyquist and any sane Q keeps the low-pass finite.
    #[test]
    fn lowpass_stability(
        freq in 10.0f32..23000.0f32,
        q in 0.1f32..20.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(freq, q, 48000.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        for _ in 0..32 {
            for &sample in &input {
                let out = biquad.process(sample);
                prop_assert!(out.is_finite(), "freq={freq} q={q} produced {out}");
            }
        }
    }

    /// Summing any number of full-scale blocks then saturating stays in [-1, 1].
    #[test]
    fn fan_in_sum_saturates(
        blocks in prop::collection::vec(prop::collection::vec(-1.0f32..=1.0f32, 8), 1..6),
    ) {
        let mut sum = AudioBlock::new(8, 1);
        for samples in &blocks {
            let mut block = AudioBlock::new(8, 1);
            block.channel_mut(0).copy_from_slice(samples);
            sum.mix_from(&block);
        }
        sum.saturate();
        for &s in sum.channel(0) {
            prop_assert!((-1.0..=1.0).contains(&s));
        }
    }

    /// A value written now is read back exactly `delay` advances later.
    #[test]
    fn ring_reproduces_after_delay(capacity in 2usize..512, delay_seed in 0usize..512, value in -1.0f32..1.0f32) {
        let mut ring = DelayRing::new(1, capacity);
        let delay = 1 + delay_seed % ring.max_delay();
        ring.write(0, value);
        for _ in 0..delay {
            ring.advance();
        }
        prop_assert_eq!(ring.read(0, delay), value);
    }

    /// Accepted values are returned untouched and survive clamping.
    #[test]
    fn validated_values_are_fixed_points_of_clamp(v in -100.0f32..100.0f32) {
        match RATIO.validate(ParamValue::Float(v)) {
            Ok(stored) => {
                prop_assert_eq!(stored, v);
                prop_assert_eq!(RATIO.clamp(stored), stored);
            }
            Err(_) => prop_assert!(!(1.0..=20.0).contains(&v)),
        }
    }
}
