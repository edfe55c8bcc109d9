//! Property-based tests for the float stream codec.
//!
//! These verify the quantified invariants across a wide range of inputs:
//! - round-trip error is bounded by epsilon, element-wise
//! - round-trip preserves length
//! - a second compress/decompress at the same epsilon is a fixed point

use proptest::prelude::*;

use stolas::{compress, decompress};

/// Strategy for array lengths: group, worker, and block edges plus odd sizes.
fn len_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        1usize..=4,
        Just(31),
        Just(32),
        Just(33),
        Just(127),
        Just(128),
        Just(129),
        200usize..=600,
    ]
}

/// Strategy for quantization steps. Steps are kept coarse enough relative
/// to the value range that float32 arithmetic error stays far inside the
/// epsilon bound.
fn epsilon_strategy() -> impl Strategy<Value = f32> {
    prop_oneof![Just(0.01f32), Just(0.05), Just(0.25), Just(1.0), Just(3.0)]
}

fn float_array(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1000.0f32..1000.0, len)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_roundtrip_within_epsilon(
        (floats, epsilon) in (len_strategy(), epsilon_strategy())
            .prop_flat_map(|(len, eps)| (float_array(len), Just(eps))),
    ) {
        let compressed = compress(&floats, epsilon).unwrap();
        let restored = decompress(&compressed).unwrap();

        prop_assert_eq!(restored.len(), floats.len());
        for (i, (orig, dec)) in floats.iter().zip(restored.iter()).enumerate() {
            let error = (orig - dec).abs();
            prop_assert!(
                error <= epsilon,
                "index {}: original={}, restored={}, error={}, epsilon={}",
                i, orig, dec, error, epsilon
            );
        }
    }

    #[test]
    fn prop_second_pass_is_fixed_point(
        (floats, epsilon) in (len_strategy(), epsilon_strategy())
            .prop_flat_map(|(len, eps)| (float_array(len), Just(eps))),
    ) {
        let once = decompress(&compress(&floats, epsilon).unwrap()).unwrap();
        let twice = decompress(&compress(&once, epsilon).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
