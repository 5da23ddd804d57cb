//! Temporary (at-risk) and banked (safe) reward totals.
//!
//! Every operation that changes the banked total writes it to the store before
//! returning. A failed write is logged and counted; the in-memory value stays
//! authoritative until the next successful write.
use serde::{Deserialize, Serialize};

use crate::BankStore;
use crate::data::{RewardType, SliceDefinition};

/// What applying a slice did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEffect {
    /// A bomb wiped the temporary total and a revive decision is pending.
    BombTriggered { forfeited: u64 },
    /// A reward was earned. Only gold moves the temporary total.
    RewardAccrued { reward_type: RewardType, amount: u32 },
}

#[derive(Debug)]
pub struct RewardLedger<S: BankStore> {
    store: S,
    slot: String,
    temporary: u64,
    banked: u64,
    pending_bomb: bool,
    persist_failures: u32,
}

impl<S: BankStore> RewardLedger<S> {
    /// Open the ledger, loading the banked total from `slot` (0 when absent or unreadable).
    pub fn open(store: S, slot: impl Into<String>) -> Self {
        let slot = slot.into();
        let banked = match store.load_bank(&slot) {
            Ok(value) => value.unwrap_or(0),
            Err(err) => {
                log::error!("failed to load banked reward from {slot}: {err}");
                0
            }
        };
        log::info!("ledger opened on {slot} with {banked} banked");
        Self {
            store,
            slot,
            temporary: 0,
            banked,
            pending_bomb: false,
            persist_failures: 0,
        }
    }

    #[must_use]
    pub const fn temporary(&self) -> u64 {
        self.temporary
    }

    #[must_use]
    pub const fn banked(&self) -> u64 {
        self.banked
    }

    #[must_use]
    pub const fn pending_bomb_decision(&self) -> bool {
        self.pending_bomb
    }

    /// Number of writes that failed since the ledger was opened.
    #[must_use]
    pub const fn persist_failures(&self) -> u32 {
        self.persist_failures
    }

    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn apply_outcome(&mut self, slice: &SliceDefinition) -> LedgerEffect {
        match slice.reward_type {
            RewardType::Bomb => {
                let forfeited = self.temporary;
                self.temporary = 0;
                self.pending_bomb = true;
                LedgerEffect::BombTriggered { forfeited }
            }
            reward_type => {
                let amount = slice.effective_amount();
                if reward_type == RewardType::Gold {
                    self.temporary = self.temporary.saturating_add(u64::from(amount));
                }
                LedgerEffect::RewardAccrued {
                    reward_type,
                    amount,
                }
            }
        }
    }

    /// Bank gold from a repeated item directly; it survives a later bomb.
    pub fn convert_duplicate_item(&mut self, gold_value: u64) -> u64 {
        self.banked = self.banked.saturating_add(gold_value);
        self.persist();
        self.banked
    }

    /// Move the temporary total into the bank and return the new banked total.
    pub fn walk_away(&mut self) -> u64 {
        self.banked = self.banked.saturating_add(self.temporary);
        self.temporary = 0;
        self.persist();
        self.banked
    }

    /// Pay `cost` from the bank to cancel a bomb. Temporary rewards are kept.
    pub fn try_revive(&mut self, cost: u64) -> bool {
        if self.banked < cost {
            return false;
        }
        self.banked -= cost;
        self.pending_bomb = false;
        self.persist();
        true
    }

    /// Forfeit the temporary total after a bomb; the bank is untouched.
    pub fn give_up(&mut self) {
        self.temporary = 0;
        self.pending_bomb = false;
    }

    pub fn reset_all(&mut self) {
        self.temporary = 0;
        self.banked = 0;
        self.pending_bomb = false;
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save_bank(&self.slot, self.banked) {
            self.persist_failures = self.persist_failures.saturating_add(1);
            log::error!(
                "failed to save banked reward {} to {}: {err}",
                self.banked,
                self.slot
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBankStore;
    use std::fmt;

    const SLOT: &str = "WG_BANKED";

    #[derive(Debug)]
    struct DiskFull;

    impl fmt::Display for DiskFull {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk full")
        }
    }

    impl std::error::Error for DiskFull {}

    struct BrokenStore;

    impl BankStore for BrokenStore {
        type Error = DiskFull;

        fn load_bank(&self, _slot: &str) -> Result<Option<u64>, Self::Error> {
            Err(DiskFull)
        }

        fn save_bank(&self, _slot: &str, _value: u64) -> Result<(), Self::Error> {
            Err(DiskFull)
        }
    }

    fn ledger_with(banked: u64) -> RewardLedger<MemoryBankStore> {
        RewardLedger::open(MemoryBankStore::with_balance(SLOT, banked), SLOT)
    }

    fn gold(amount: u32) -> SliceDefinition {
        SliceDefinition::new(RewardType::Gold, amount)
    }

    #[test]
    fn opening_loads_the_bank() {
        let ledger = ledger_with(90);
        assert_eq!(ledger.banked(), 90);
        assert_eq!(ledger.temporary(), 0);
        assert!(!ledger.pending_bomb_decision());

        let fresh = RewardLedger::open(MemoryBankStore::new(), SLOT);
        assert_eq!(fresh.banked(), 0);
    }

    #[test]
    fn only_gold_accrues_into_temporary() {
        let mut ledger = ledger_with(0);
        assert_eq!(
            ledger.apply_outcome(&gold(50)),
            LedgerEffect::RewardAccrued {
                reward_type: RewardType::Gold,
                amount: 50,
            }
        );
        ledger.apply_outcome(&SliceDefinition::new(RewardType::Money, 300));
        ledger.apply_outcome(&SliceDefinition::new(RewardType::Chests, 2));
        let item = ledger.apply_outcome(&SliceDefinition::item("icon.sword", 100));
        assert_eq!(
            item,
            LedgerEffect::RewardAccrued {
                reward_type: RewardType::Item,
                amount: 0,
            }
        );
        assert_eq!(ledger.temporary(), 50);
    }

    #[test]
    fn bomb_zeroes_temporary_and_awaits_decision() {
        for prior in [0, 1, 75, 10_000] {
            let mut ledger = ledger_with(5);
            ledger.apply_outcome(&gold(prior));
            let effect = ledger.apply_outcome(&SliceDefinition::bomb());
            assert_eq!(
                effect,
                LedgerEffect::BombTriggered {
                    forfeited: u64::from(prior)
                }
            );
            assert_eq!(ledger.temporary(), 0);
            assert_eq!(ledger.banked(), 5);
            assert!(ledger.pending_bomb_decision());
        }
    }

    #[test]
    fn walk_away_banks_exactly_the_temporary_total() {
        let mut ledger = ledger_with(30);
        ledger.apply_outcome(&gold(120));
        assert_eq!(ledger.walk_away(), 150);
        assert_eq!(ledger.temporary(), 0);
        assert_eq!(ledger.store().get(SLOT), Some(150));

        assert_eq!(ledger.walk_away(), 150);
        assert_eq!(ledger.temporary(), 0);
    }

    #[test]
    fn revive_needs_enough_banked_gold() {
        let mut ledger = ledger_with(10);
        ledger.apply_outcome(&gold(40));
        ledger.apply_outcome(&SliceDefinition::bomb());
        ledger.apply_outcome(&gold(15));

        assert!(!ledger.try_revive(25));
        assert_eq!(ledger.banked(), 10);
        assert_eq!(ledger.temporary(), 15);
        assert!(ledger.pending_bomb_decision());

        assert!(ledger.try_revive(10));
        assert_eq!(ledger.banked(), 0);
        assert_eq!(ledger.temporary(), 15);
        assert!(!ledger.pending_bomb_decision());
        assert_eq!(ledger.store().get(SLOT), Some(0));
    }

    #[test]
    fn give_up_forfeits_temporary_only() {
        let mut ledger = ledger_with(60);
        ledger.apply_outcome(&gold(20));
        ledger.apply_outcome(&SliceDefinition::bomb());
        ledger.apply_outcome(&gold(20));
        ledger.give_up();
        assert_eq!(ledger.temporary(), 0);
        assert_eq!(ledger.banked(), 60);
        assert!(!ledger.pending_bomb_decision());
    }

    #[test]
    fn duplicate_items_bank_immediately() {
        let mut ledger = ledger_with(0);
        ledger.apply_outcome(&gold(80));
        assert_eq!(ledger.convert_duplicate_item(100), 100);
        ledger.apply_outcome(&SliceDefinition::bomb());
        assert_eq!(ledger.banked(), 100);
        assert_eq!(ledger.store().get(SLOT), Some(100));
    }

    #[test]
    fn reset_all_clears_and_persists() {
        let mut ledger = ledger_with(500);
        ledger.apply_outcome(&gold(5));
        ledger.reset_all();
        assert_eq!(ledger.banked(), 0);
        assert_eq!(ledger.temporary(), 0);
        assert_eq!(ledger.store().get(SLOT), Some(0));
    }

    #[test]
    fn failed_writes_keep_memory_authoritative() {
        let mut ledger = RewardLedger::open(BrokenStore, SLOT);
        assert_eq!(ledger.banked(), 0);
        ledger.apply_outcome(&gold(70));
        assert_eq!(ledger.walk_away(), 70);
        assert_eq!(ledger.banked(), 70);
        assert_eq!(ledger.persist_failures(), 1);
        ledger.convert_duplicate_item(30);
        assert_eq!(ledger.banked(), 100);
        assert_eq!(ledger.persist_failures(), 2);
    }
}
