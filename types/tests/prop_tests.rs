use proptest::prelude::*;

use accesskey_types::math::{bps_of, BPS_DENOMINATOR};
use accesskey_types::{mul_div, Rounding, Timestamp};

proptest! {
    /// For products that fit in u128, mul_div agrees with native arithmetic.
    #[test]
    fn mul_div_matches_native(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, d in 1u128..u64::MAX as u128) {
        let down = mul_div(a, b, d, Rounding::Down).unwrap();
        prop_assert_eq!(down, a * b / d);
        let up = mul_div(a, b, d, Rounding::Up).unwrap();
        prop_assert_eq!(up, (a * b).div_ceil(d));
    }

    /// Rounding up never exceeds rounding down by more than one unit.
    #[test]
    fn rounding_up_is_at_most_one_more(a in any::<u128>(), b in any::<u128>(), d in 1u128..=u128::MAX) {
        if let (Some(down), Some(up)) = (mul_div(a, b, d, Rounding::Down), mul_div(a, b, d, Rounding::Up)) {
            prop_assert!(up == down || up == down + 1);
        }
    }

    /// Multiplying and dividing by the same factor is the identity.
    #[test]
    fn scaling_cancels(a in any::<u128>(), k in 1u128..=u128::MAX) {
        prop_assert_eq!(mul_div(a, k, k, Rounding::Down), Some(a));
        prop_assert_eq!(mul_div(a, k, k, Rounding::Up), Some(a));
    }

    /// A basis-point share never exceeds the whole.
    #[test]
    fn bps_share_bounded(amount in any::<u128>(), bps in 0u32..=BPS_DENOMINATOR as u32) {
        let share = bps_of(amount, bps).unwrap();
        prop_assert!(share <= amount);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta.checked_duration_until(tb).is_some(), a <= b);
    }

    /// Timestamp bincode serialization roundtrip.
    #[test]
    fn timestamp_bincode_roundtrip(secs in any::<u64>()) {
        let ts = Timestamp::new(secs);
        let encoded = bincode::serialize(&ts).unwrap();
        let decoded: Timestamp = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, ts);
    }
}
