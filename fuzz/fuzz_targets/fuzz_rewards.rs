#![no_main]

use accesskey_rewards::{DepositCheckpoint, RewardsDistributor};
use accesskey_types::{TierId, Timestamp};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Advance(u16),
    Reweigh { high: bool, slot: u8, weight: u64 },
    Settle { high: bool, slot: u8 },
    SetRate(u32),
    Fund(u64),
}

// Random interleavings never pay out more than was funded.
fuzz_target!(|ops: Vec<Op>| {
    let mut now = 0u64;
    let mut d = RewardsDistributor::new(Timestamp::new(now));
    let _ = d.add_recipient(TierId(0), 1, Timestamp::new(now));
    let _ = d.add_recipient(TierId(1), 3, Timestamp::new(now));
    let mut deposits = vec![(DepositCheckpoint::default(), DepositCheckpoint::default()); 4];
    let mut funded = 0u128;
    let mut paid = 0u128;

    for op in ops.iter().take(256) {
        let ts = Timestamp::new(now);
        match op {
            Op::Advance(secs) => now += *secs as u64,
            Op::Reweigh { high, slot, weight } => {
                let (tier, deposit) = pick(&mut deposits, *high, *slot);
                if let Ok(pending) = d.settle(tier, deposit, ts) {
                    paid += pending;
                    let _ = d.reweigh(tier, deposit, *weight as u128, ts);
                }
            }
            Op::Settle { high, slot } => {
                let (tier, deposit) = pick(&mut deposits, *high, *slot);
                if let Ok(pending) = d.settle(tier, deposit, ts) {
                    paid += pending;
                }
            }
            Op::SetRate(rate) => {
                let _ = d.set_rate(*rate as u128, ts);
            }
            Op::Fund(amount) => {
                if d.fund(*amount as u128).is_ok() {
                    funded += *amount as u128;
                }
            }
        }
    }
    assert!(paid <= funded);
});

fn pick(
    deposits: &mut [(DepositCheckpoint, DepositCheckpoint)],
    high: bool,
    slot: u8,
) -> (TierId, &mut DepositCheckpoint) {
    let pair = &mut deposits[slot as usize % deposits.len()];
    if high {
        (TierId(1), &mut pair.1)
    } else {
        (TierId(0), &mut pair.0)
    }
}
