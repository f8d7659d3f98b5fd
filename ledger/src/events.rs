//! Events emitted after ledger operations commit.

use accesskey_types::{Address, KeyId, TierId, Timestamp};

/// Ledger-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    KeyMinted {
        key: KeyId,
        owner: Address,
    },
    Funded {
        key: KeyId,
        funder: Address,
        amount: u128,
        shares: u128,
    },
    Subscribed {
        key: KeyId,
        tier: TierId,
        previous: Option<TierId>,
    },
    /// Debt was paid to the treasury out of the position.
    DebtResolved {
        key: KeyId,
        debt: u128,
        paid: u128,
        shares: u128,
    },
    Burned {
        key: KeyId,
        owner: Address,
        debt_paid: u128,
        returned: u128,
    },
    Liquidated {
        key: KeyId,
        liquidator: Address,
        debt: u128,
        seized: u128,
        liquidator_reward: u128,
        vault_donation: u128,
        treasury_amount: u128,
    },
    TierCreated {
        tier: TierId,
        name: String,
        fee_per_second: u128,
    },
    TierRateChanged {
        tier: TierId,
        fee_per_second: u128,
        effective_at: Timestamp,
    },
    /// Streamed reward was compounded into a position.
    RewardsCredited {
        key: KeyId,
        tier: TierId,
        amount: u128,
    },
    RewardsFunded {
        funder: Address,
        amount: u128,
    },
    TreasuryChanged {
        previous: Address,
        treasury: Address,
    },
}

/// Synchronous fan-out event bus for ledger events.
///
/// Listeners run inline on the emitting call; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&LedgerEvent::KeyMinted {
            key: KeyId(0),
            owner: Address::new("alice"),
        });

        assert_eq!(counter.load(Ordering::SeqCst), 11);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&LedgerEvent::RewardsFunded {
            funder: Address::new("dao"),
            amount: 1,
        });
    }
}
