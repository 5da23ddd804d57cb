//! Session coordinator: sequences spin, settle, reward and zone progression.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BankStore;
use crate::config::{WheelConfig, WheelConfigError};
use crate::constants::FIRST_ZONE;
use crate::data::SliceDefinition;
use crate::event::{EventBus, EventSink, SessionEvent, SubscriberId};
use crate::ledger::{LedgerEffect, RewardLedger};
use crate::rng::SpinRng;
use crate::spin::{SpinOutcome, SpinResolver};
use crate::zones::ZoneLadder;

/// Where the session is in its spin cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Spinning,
    AwaitingBombDecision,
}

/// Read-only snapshot of the mutable session core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_zone: u32,
    pub temporary_reward: u64,
    pub banked_reward: u64,
    pub is_spinning: bool,
    pub pending_bomb_decision: bool,
}

/// Reason an operation was refused. The session is unchanged when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionRejected {
    #[error("a spin is already in progress")]
    SpinInProgress,
    #[error("no spin is in progress")]
    NoSpinInProgress,
    #[error("a bomb decision is pending")]
    BombDecisionPending,
    #[error("no bomb decision is pending")]
    NoBombPending,
    #[error("walking away is only allowed on safe or super zones (zone {zone})")]
    NotSafeZone { zone: u32 },
    #[error("revive costs {cost} but only {banked} is banked")]
    InsufficientFunds { cost: u64, banked: u64 },
}

/// Result of a settled spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinReport {
    /// Slice that paid out, after settlement.
    pub index: usize,
    /// Index drawn before animation.
    pub drawn_index: usize,
    pub slice: Option<SliceDefinition>,
    pub effect: Option<LedgerEffect>,
    /// Gold banked because the item had already been earned this run.
    pub converted_gold: Option<u64>,
    /// Zone after the spin was applied.
    pub zone: u32,
}

impl SpinReport {
    #[must_use]
    pub const fn is_bomb(&self) -> bool {
        matches!(self.effect, Some(LedgerEffect::BombTriggered { .. }))
    }
}

/// One player's run on the wheel. Owns the ladder, the ledger and the event bus.
#[derive(Debug)]
pub struct WheelSession<S: BankStore> {
    config: WheelConfig,
    ladder: ZoneLadder,
    ledger: RewardLedger<S>,
    resolver: SpinResolver,
    rng: SpinRng,
    seed: u64,
    phase: SessionPhase,
    in_flight: Option<SpinOutcome>,
    collected_items: HashSet<String>,
    events: EventBus,
    spins_completed: u64,
}

impl<S: BankStore> WheelSession<S> {
    /// Start a session at zone 1 with the banked total loaded from `store`.
    ///
    /// Presets whose slot count differs from `config.slice_count` are logged
    /// and added to the ladder's issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot resolve spins.
    pub fn new(
        config: WheelConfig,
        mut ladder: ZoneLadder,
        store: S,
        seed: u64,
    ) -> Result<Self, WheelConfigError> {
        let resolver = SpinResolver::new(&config)?;
        let mismatched = ladder.report_slice_counts(config.slice_count);
        if mismatched > 0 {
            log::error!(
                "{mismatched} preset(s) do not have {} slices; their missing slots pay nothing",
                config.slice_count
            );
        }
        let ledger = RewardLedger::open(store, config.save_slot.clone());
        ladder.set_zone(FIRST_ZONE);
        Ok(Self {
            config,
            ladder,
            ledger,
            resolver,
            rng: SpinRng::from_user_seed(seed),
            seed,
            phase: SessionPhase::Idle,
            in_flight: None,
            collected_items: HashSet::new(),
            events: EventBus::new(),
            spins_completed: 0,
        })
    }

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> SubscriberId {
        self.events.subscribe(sink)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Publish the current zone and totals, for views attached after construction.
    pub fn announce(&mut self) {
        self.publish(SessionEvent::ZoneChanged {
            zone: self.ladder.current_zone(),
        });
        self.publish_rewards();
    }

    /// Start a spin with a random landing draw.
    ///
    /// # Errors
    ///
    /// Rejected unless the session is idle.
    pub fn spin(&mut self) -> Result<SpinOutcome, ActionRejected> {
        self.start_spin(None)
    }

    /// Start a spin forced onto `target` (wrapped to the wheel size).
    ///
    /// # Errors
    ///
    /// Rejected unless the session is idle.
    pub fn spin_to(&mut self, target: usize) -> Result<SpinOutcome, ActionRejected> {
        self.start_spin(Some(target))
    }

    fn start_spin(&mut self, target: Option<usize>) -> Result<SpinOutcome, ActionRejected> {
        self.ensure_idle()?;
        self.phase = SessionPhase::Spinning;
        self.publish(SessionEvent::SpinStarted);

        let outcome = self.resolver.resolve(
            self.ladder.active_preset(),
            self.config.slice_count,
            &mut self.rng,
            target,
        );
        self.in_flight = Some(outcome);
        self.publish(SessionEvent::SpinResolved {
            target_index: outcome.landing_index,
            rotation_magnitude: outcome.rotation_magnitude,
            duration_secs: outcome.duration_secs,
        });
        Ok(outcome)
    }

    /// Finish the in-flight spin at the angle the renderer stopped on.
    ///
    /// # Errors
    ///
    /// Rejected when no spin is in flight.
    pub fn on_spin_animation_complete(
        &mut self,
        final_angle: f32,
    ) -> Result<SpinReport, ActionRejected> {
        let outcome = match (self.phase, self.in_flight) {
            (SessionPhase::Spinning, Some(outcome)) => outcome,
            _ => return Err(ActionRejected::NoSpinInProgress),
        };
        self.in_flight = None;
        self.spins_completed = self.spins_completed.saturating_add(1);

        let index = self
            .resolver
            .settle(&outcome, final_angle, self.config.slice_count);
        if index != outcome.landing_index {
            log::debug!(
                "spin drew slice {} but settled on {index} at {final_angle}",
                outcome.landing_index
            );
        }
        let slice = self.ladder.active_preset().slice(index).cloned();
        self.publish(SessionEvent::SpinCompleted {
            index,
            slice: slice.clone(),
        });

        let Some(definition) = slice.as_ref() else {
            log::warn!(
                "zone {} preset {} has no slice at {index}",
                self.ladder.current_zone(),
                self.ladder.active_preset().id
            );
            let zone = self.advance();
            return Ok(SpinReport {
                index,
                drawn_index: outcome.landing_index,
                slice,
                effect: None,
                converted_gold: None,
                zone,
            });
        };

        let effect = self.ledger.apply_outcome(definition);
        if let LedgerEffect::BombTriggered { forfeited } = effect {
            self.phase = SessionPhase::AwaitingBombDecision;
            log::info!(
                "bomb at zone {}: {forfeited} temporary reward at risk",
                self.ladder.current_zone()
            );
            self.publish(SessionEvent::BombTriggered { forfeited });
            self.publish_rewards();
            return Ok(SpinReport {
                index,
                drawn_index: outcome.landing_index,
                slice,
                effect: Some(effect),
                converted_gold: None,
                zone: self.ladder.current_zone(),
            });
        }

        let converted_gold = self.collect_item(definition);
        self.publish_rewards();
        let zone = self.advance();
        Ok(SpinReport {
            index,
            drawn_index: outcome.landing_index,
            slice,
            effect: Some(effect),
            converted_gold,
            zone,
        })
    }

    /// Finish the in-flight spin at the angle it was resolved to, without a renderer.
    ///
    /// # Errors
    ///
    /// Rejected when no spin is in flight.
    pub fn complete_spin(&mut self) -> Result<SpinReport, ActionRejected> {
        let angle = self
            .in_flight
            .map(|outcome| outcome.end_rotation())
            .ok_or(ActionRejected::NoSpinInProgress)?;
        self.on_spin_animation_complete(angle)
    }

    /// Bank the temporary total. Only allowed while idle on a safe or super zone.
    ///
    /// # Errors
    ///
    /// Rejected outside idle or on a normal zone.
    pub fn walk_away(&mut self) -> Result<u64, ActionRejected> {
        self.ensure_idle()?;
        if !self.ladder.allows_walk_away() {
            let zone = self.ladder.current_zone();
            log::debug!("walk away refused on zone {zone}");
            return Err(ActionRejected::NotSafeZone { zone });
        }
        let banked = self.ledger.walk_away();
        self.collected_items.clear();
        log::info!("walked away at zone {} with {banked} banked", self.ladder.current_zone());
        self.publish(SessionEvent::WalkAway { banked });
        self.publish_rewards();
        Ok(banked)
    }

    /// Revive at the configured cost.
    ///
    /// # Errors
    ///
    /// See [`WheelSession::revive_with_cost`].
    pub fn revive(&mut self) -> Result<u64, ActionRejected> {
        self.revive_with_cost(self.config.revive_cost)
    }

    /// Pay `cost` from the bank to keep the temporary rewards and continue on this zone.
    ///
    /// # Errors
    ///
    /// Rejected when no bomb decision is pending or the bank cannot cover `cost`;
    /// in the latter case the decision stays pending.
    pub fn revive_with_cost(&mut self, cost: u64) -> Result<u64, ActionRejected> {
        self.ensure_bomb_pending()?;
        if !self.ledger.try_revive(cost) {
            let banked = self.ledger.banked();
            log::debug!("revive refused: cost {cost}, banked {banked}");
            return Err(ActionRejected::InsufficientFunds { cost, banked });
        }
        self.phase = SessionPhase::Idle;
        log::info!("revived for {cost}, {} banked", self.ledger.banked());
        self.publish_rewards();
        Ok(self.ledger.banked())
    }

    /// Accept the bomb: forfeit temporary rewards and restart from zone 1.
    ///
    /// # Errors
    ///
    /// Rejected when no bomb decision is pending.
    pub fn give_up(&mut self) -> Result<(), ActionRejected> {
        self.ensure_bomb_pending()?;
        self.ledger.give_up();
        self.collected_items.clear();
        self.phase = SessionPhase::Idle;
        self.publish_rewards();
        let zone = self.ladder.set_zone(FIRST_ZONE);
        self.publish(SessionEvent::ZoneChanged { zone });
        Ok(())
    }

    /// Zero both totals and return to zone 1.
    ///
    /// # Errors
    ///
    /// Rejected while a spin is in flight.
    pub fn reset(&mut self) -> Result<(), ActionRejected> {
        if self.phase == SessionPhase::Spinning {
            return Err(ActionRejected::SpinInProgress);
        }
        self.ledger.reset_all();
        self.collected_items.clear();
        self.phase = SessionPhase::Idle;
        self.publish_rewards();
        let zone = self.ladder.set_zone(FIRST_ZONE);
        self.publish(SessionEvent::ZoneChanged { zone });
        Ok(())
    }

    /// Deterministically reseed the spin stream.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SpinRng::from_user_seed(seed);
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState {
            current_zone: self.ladder.current_zone(),
            temporary_reward: self.ledger.temporary(),
            banked_reward: self.ledger.banked(),
            is_spinning: self.phase == SessionPhase::Spinning,
            pending_bomb_decision: self.ledger.pending_bomb_decision(),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<&SpinOutcome> {
        self.in_flight.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &WheelConfig {
        &self.config
    }

    #[must_use]
    pub const fn ladder(&self) -> &ZoneLadder {
        &self.ladder
    }

    #[must_use]
    pub const fn ledger(&self) -> &RewardLedger<S> {
        &self.ledger
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn spins_completed(&self) -> u64 {
        self.spins_completed
    }

    /// Draws taken from the spin stream since the last (re)seed.
    #[must_use]
    pub const fn spin_draws(&self) -> u64 {
        self.rng.draws()
    }

    #[must_use]
    pub fn has_collected(&self, item: &str) -> bool {
        self.collected_items.contains(item)
    }

    fn collect_item(&mut self, slice: &SliceDefinition) -> Option<u64> {
        let key = slice.item_key()?;
        if self.collected_items.insert(key.to_string()) {
            return None;
        }
        let gold = u64::from(slice.item_gold_conversion_value);
        self.ledger.convert_duplicate_item(gold);
        log::info!("duplicate item {key} converted to {gold} banked gold");
        self.publish(SessionEvent::ItemConverted {
            item: key.to_string(),
            gold,
        });
        Some(gold)
    }

    fn advance(&mut self) -> u32 {
        self.phase = SessionPhase::Idle;
        let zone = self.ladder.advance_zone();
        self.publish(SessionEvent::ZoneChanged { zone });
        zone
    }

    fn ensure_idle(&self) -> Result<(), ActionRejected> {
        match self.phase {
            SessionPhase::Idle => Ok(()),
            SessionPhase::Spinning => Err(ActionRejected::SpinInProgress),
            SessionPhase::AwaitingBombDecision => Err(ActionRejected::BombDecisionPending),
        }
    }

    fn ensure_bomb_pending(&self) -> Result<(), ActionRejected> {
        if self.phase == SessionPhase::AwaitingBombDecision {
            Ok(())
        } else {
            Err(ActionRejected::NoBombPending)
        }
    }

    fn publish_rewards(&mut self) {
        self.publish(SessionEvent::RewardChanged {
            temporary: self.ledger.temporary(),
            banked: self.ledger.banked(),
        });
    }

    fn publish(&mut self, event: SessionEvent) {
        self.events.publish(&event);
    }
}
