#![no_main]

use accesskey_fees::{DebtCheckpoint, FeeSchedule};
use accesskey_types::Timestamp;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    initial_rate: u64,
    changes: Vec<(u32, u64)>,
    checkpoints: Vec<u32>,
}

// Arbitrary schedules and checkpoint sequences never panic, and stepwise
// checkpoints agree with the one-shot integral whenever both succeed.
fuzz_target!(|input: Input| {
    let mut schedule = FeeSchedule::new(input.initial_rate as u128, Timestamp::new(0));
    let mut at = 0u64;
    for (gap, rate) in input.changes.iter().take(64) {
        at = at.saturating_add(*gap as u64);
        let _ = schedule.push_rate(*rate as u128, Timestamp::new(at));
    }

    let mut stepped = DebtCheckpoint::new(Timestamp::new(0));
    let mut now = 0u64;
    let mut ok = true;
    for gap in input.checkpoints.iter().take(64) {
        now = now.saturating_add(*gap as u64);
        if stepped.checkpoint(Some(&schedule), Timestamp::new(now)).is_err() {
            ok = false;
            break;
        }
    }

    let direct = DebtCheckpoint::new(Timestamp::new(0)).debt_at(Some(&schedule), Timestamp::new(now));
    if let (true, Ok(direct)) = (ok, direct) {
        assert_eq!(stepped.accrued_debt, direct);
    }
});
