use proptest::prelude::*;

use accesskey_fees::{usd_fee_to_rate, DebtCheckpoint, FeeSchedule};
use accesskey_types::Timestamp;

fn schedule_from(rates: &[(u128, u64)]) -> FeeSchedule {
    let mut schedule = FeeSchedule::new(rates[0].0, Timestamp::new(0));
    let mut at = 0u64;
    for &(rate, gap) in &rates[1..] {
        at += gap;
        schedule.push_rate(rate, Timestamp::new(at)).unwrap();
    }
    schedule
}

fn rates_strategy() -> impl Strategy<Value = Vec<(u128, u64)>> {
    prop::collection::vec((0u128..1_000_000, 0u64..10_000), 1..8)
}

proptest! {
    /// Debt never decreases as time moves forward.
    #[test]
    fn accrual_monotonic(
        rates in rates_strategy(),
        t1 in 0u64..100_000,
        dt in 0u64..100_000,
    ) {
        let schedule = schedule_from(&rates);
        let a = schedule.accrued_since(Timestamp::new(0), Timestamp::new(t1)).unwrap();
        let b = schedule.accrued_since(Timestamp::new(0), Timestamp::new(t1 + dt)).unwrap();
        prop_assert!(b >= a, "accrual decreased: {} -> {}", a, b);
    }

    /// Splitting an interval at any point gives the same total.
    #[test]
    fn accrual_additive(
        rates in rates_strategy(),
        start in 0u64..50_000,
        mid_offset in 0u64..50_000,
        end_offset in 0u64..50_000,
    ) {
        let schedule = schedule_from(&rates);
        let (s, m, e) = (
            Timestamp::new(start),
            Timestamp::new(start + mid_offset),
            Timestamp::new(start + mid_offset + end_offset),
        );
        let whole = schedule.accrued_since(s, e).unwrap();
        let split = schedule.accrued_since(s, m).unwrap() + schedule.accrued_since(m, e).unwrap();
        prop_assert_eq!(whole, split);
    }

    /// Appending a rate never changes accrual over time already elapsed.
    #[test]
    fn rate_change_preserves_history(
        rates in rates_strategy(),
        new_rate in 0u128..1_000_000,
        extra in 0u64..10_000,
    ) {
        let mut schedule = schedule_from(&rates);
        let last = schedule.points().last().unwrap().effective_at.as_secs();
        let change_at = Timestamp::new(last + extra);

        let before = schedule.accrued_since(Timestamp::new(0), change_at).unwrap();
        schedule.push_rate(new_rate, change_at).unwrap();
        let after = schedule.accrued_since(Timestamp::new(0), change_at).unwrap();
        prop_assert_eq!(before, after);
    }

    /// A zero-rate schedule never accrues.
    #[test]
    fn zero_rate_accrues_nothing(since in 0u64..1_000_000, dt in 0u64..1_000_000) {
        let schedule = FeeSchedule::new(0, Timestamp::new(0));
        let debt = schedule
            .accrued_since(Timestamp::new(since), Timestamp::new(since + dt))
            .unwrap();
        prop_assert_eq!(debt, 0);
    }

    /// Checkpointing at arbitrary intermediate times gives the direct result.
    #[test]
    fn checkpoints_are_path_independent(
        rates in rates_strategy(),
        mut stops in prop::collection::vec(0u64..100_000, 1..10),
    ) {
        let schedule = schedule_from(&rates);
        stops.sort_unstable();
        let mut stepped = DebtCheckpoint::new(Timestamp::new(0));
        for &t in &stops {
            stepped.checkpoint(Some(&schedule), Timestamp::new(t)).unwrap();
        }
        let end = Timestamp::new(*stops.last().unwrap());
        let direct = DebtCheckpoint::new(Timestamp::new(0)).debt_at(Some(&schedule), end).unwrap();
        prop_assert_eq!(stepped.accrued_debt, direct);
    }

    /// A higher price never yields a higher per-second rate.
    #[test]
    fn usd_rate_decreases_with_price(
        fee in 0u128..1_000_000_000_000_000_000_000,
        p1 in 1u128..1_000_000,
        dp in 0u128..1_000_000,
    ) {
        let cheap = usd_fee_to_rate("CMK", fee, p1, 2_592_000).unwrap();
        let dear = usd_fee_to_rate("CMK", fee, p1 + dp, 2_592_000).unwrap();
        prop_assert!(dear <= cheap);
    }
}
