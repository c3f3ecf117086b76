//! Property tests for the voltage quantizer.

use common::dac::{MAX_VOLTAGE, MIN_VOLTAGE, voltage_to_dac};

proptest::proptest! {
    /// Anything below the range behaves like the lower limit.
    #[test]
    fn below_range_is_clamped(v in -1.0e9f64..MIN_VOLTAGE) {
        assert_eq!(voltage_to_dac(v), voltage_to_dac(MIN_VOLTAGE));
    }

    /// Anything above the range behaves like the upper limit.
    #[test]
    fn above_range_is_clamped(v in MAX_VOLTAGE..1.0e9f64) {
        assert_eq!(voltage_to_dac(v), voltage_to_dac(MAX_VOLTAGE));
    }

    /// Higher voltage never yields a lower code.
    #[test]
    fn monotonic(a in -10.0f64..14.0, b in -10.0f64..14.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        assert!(voltage_to_dac(lo) <= voltage_to_dac(hi),
            "{} -> {} but {} -> {}", lo, voltage_to_dac(lo), hi, voltage_to_dac(hi));
    }

    /// Matches the truncating linear formula inside the range.
    #[test]
    fn truncates_linear_scale(v in MIN_VOLTAGE..=MAX_VOLTAGE) {
        let expected = ((v + 4.0) / 12.0 * 65535.0).floor() as u16;
        assert_eq!(voltage_to_dac(v), expected);
    }
}
