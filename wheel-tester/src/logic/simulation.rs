use anyhow::Result;
use serde::{Deserialize, Serialize};
use wheel_game::{
    EventLog, MemoryBankStore, OutcomePolicy, SessionPhase, SessionState, StaticContent,
    WheelConfig, WheelEngine, WheelSession,
};

use crate::logic::policy::{Decision, PlayStrategy, PlayerPolicy, PolicyView};

/// Configuration for one simulated run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: PlayStrategy,
    pub max_spins: u32,
    pub outcome_policy: OutcomePolicy,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: PlayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_spins: 200,
            outcome_policy: OutcomePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_max_spins(mut self, max_spins: u32) -> Self {
        self.max_spins = max_spins;
        self
    }

    #[must_use]
    pub fn with_outcome_policy(mut self, policy: OutcomePolicy) -> Self {
        self.outcome_policy = policy;
        self
    }
}

/// Tallies for one finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub spins: u32,
    pub bombs: u32,
    pub revives: u32,
    pub give_ups: u32,
    pub walk_aways: u32,
    pub items_converted: u32,
    pub highest_zone: u32,
    pub final_zone: u32,
    pub final_banked: u64,
    pub violations: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Drives a session with a policy and checks the ledger rules after every step.
pub struct SimulationSession {
    session: WheelSession<MemoryBankStore>,
    events: EventLog,
    max_spins: u32,
    summary: RunSummary,
}

impl SimulationSession {
    /// Build a fresh session over the bundled content with an empty bank.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled content cannot be loaded.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let wheel_config = WheelConfig::default().with_outcome_policy(config.outcome_policy);
        let engine = WheelEngine::new(StaticContent, MemoryBankStore::new(), wheel_config);
        let mut session = engine.create_session(config.seed)?;
        let events = EventLog::new();
        session.subscribe(events.clone());
        Ok(Self {
            session,
            events,
            max_spins: config.max_spins,
            summary: RunSummary {
                seed: config.seed,
                highest_zone: 1,
                final_zone: 1,
                ..RunSummary::default()
            },
        })
    }

    pub fn run(mut self, policy: &mut dyn PlayerPolicy) -> RunSummary {
        while self.summary.spins < self.max_spins {
            let view = self.view();
            let decision = policy.decide(&view);
            log::trace!("{} at zone {}: {decision:?}", policy.name(), view.state.current_zone);
            self.apply(decision, view.state);
        }
        self.check_event_counts();
        let state = self.session.state();
        self.summary.final_zone = state.current_zone;
        self.summary.final_banked = state.banked_reward;
        self.summary
    }

    fn view(&self) -> PolicyView {
        let ladder = self.session.ladder();
        PolicyView {
            state: self.session.state(),
            allows_walk_away: ladder.allows_walk_away(),
            is_super_zone: ladder.is_super_zone(),
            max_zone: ladder.max_zone(),
            revive_cost: self.session.config().revive_cost,
        }
    }

    fn apply(&mut self, decision: Decision, before: SessionState) {
        match decision {
            Decision::Spin => self.spin(before),
            Decision::WalkAway => match self.session.walk_away() {
                Ok(banked) => {
                    self.summary.walk_aways += 1;
                    let expected = before.banked_reward + before.temporary_reward;
                    self.check(banked == expected, || {
                        format!("walk away banked {banked}, expected {expected}")
                    });
                    let after = self.session.state();
                    self.check(after.temporary_reward == 0, || {
                        "temporary reward survived a walk away".to_string()
                    });
                }
                Err(err) => self.fallback(decision, &err.to_string(), before),
            },
            Decision::Revive => {
                let cost = self.session.config().revive_cost;
                match self.session.revive() {
                    Ok(banked) => {
                        self.summary.revives += 1;
                        self.check(banked + cost == before.banked_reward, || {
                            format!("revive left {banked} banked from {}", before.banked_reward)
                        });
                        self.check(self.session.phase() == SessionPhase::Idle, || {
                            "revive did not clear the bomb decision".to_string()
                        });
                    }
                    Err(err) => self.fallback(decision, &err.to_string(), before),
                }
            }
            Decision::GiveUp => match self.session.give_up() {
                Ok(()) => {
                    self.summary.give_ups += 1;
                    let after = self.session.state();
                    self.check(after.current_zone == 1 && after.temporary_reward == 0, || {
                        format!("give up left zone {} with {}", after.current_zone, after.temporary_reward)
                    });
                    self.check(after.banked_reward == before.banked_reward, || {
                        "give up changed the bank".to_string()
                    });
                }
                Err(err) => self.fallback(decision, &err.to_string(), before),
            },
        }
    }

    /// A refused action must leave the session untouched; play continues with the safe choice.
    fn fallback(&mut self, decision: Decision, reason: &str, before: SessionState) {
        log::debug!("{decision:?} refused: {reason}");
        let after = self.session.state();
        self.check(after == before, || {
            format!("refused {decision:?} still changed the session")
        });
        if self.session.phase() == SessionPhase::AwaitingBombDecision {
            self.apply(Decision::GiveUp, after);
        } else {
            self.spin(after);
        }
    }

    fn spin(&mut self, before: SessionState) {
        if let Err(err) = self.session.spin() {
            self.summary
                .violations
                .push(format!("spin refused at zone {}: {err}", before.current_zone));
            // Burn the budget so a stuck session cannot loop forever.
            self.summary.spins = self.max_spins;
            return;
        }
        self.summary.spins += 1;
        let report = match self.session.complete_spin() {
            Ok(report) => report,
            Err(err) => {
                self.summary.violations.push(format!("spin never settled: {err}"));
                return;
            }
        };
        let after = self.session.state();
        if report.converted_gold.is_some() {
            self.summary.items_converted += 1;
        }
        self.summary.highest_zone = self.summary.highest_zone.max(after.current_zone);

        if report.is_bomb() {
            self.summary.bombs += 1;
            let wheel_type = self.session.ladder().active_preset().wheel_type;
            self.check(wheel_type.allows_bomb(), || {
                format!("bomb on {wheel_type} wheel at zone {}", after.current_zone)
            });
            self.check(after.temporary_reward == 0 && after.pending_bomb_decision, || {
                "bomb did not wipe the temporary reward".to_string()
            });
            self.check(after.current_zone == before.current_zone, || {
                "bomb moved the zone".to_string()
            });
        } else {
            self.check(after.temporary_reward >= before.temporary_reward, || {
                format!(
                    "temporary reward fell from {} to {}",
                    before.temporary_reward, after.temporary_reward
                )
            });
            self.check(after.banked_reward >= before.banked_reward, || {
                "a spin reduced the bank".to_string()
            });
            let max_zone = self.session.ladder().max_zone();
            let expected_zone = (before.current_zone + 1).min(max_zone);
            self.check(after.current_zone == expected_zone, || {
                format!(
                    "zone went from {} to {}",
                    before.current_zone, after.current_zone
                )
            });
        }
    }

    fn check_event_counts(&mut self) {
        let completed = self.events.count("spin_completed");
        let spins = usize::try_from(self.summary.spins).unwrap_or(usize::MAX);
        let walks = usize::try_from(self.summary.walk_aways).unwrap_or(usize::MAX);
        self.check(completed == spins, || {
            format!("{completed} spin_completed events for {spins} spins")
        });
        let walked = self.events.count("walk_away");
        self.check(walked == walks, || {
            format!("{walked} walk_away events for {walks} walk aways")
        });
    }

    fn check(&mut self, holds: bool, describe: impl FnOnce() -> String) {
        if !holds {
            let violation = describe();
            log::warn!("seed {}: {violation}", self.summary.seed);
            self.summary.violations.push(violation);
        }
    }
}

/// Run one seeded simulation with the strategy's policy.
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn simulate(config: SimulationConfig) -> Result<RunSummary> {
    let mut policy = config.strategy.create_policy();
    let session = SimulationSession::new(config)?;
    Ok(session.run(policy.as_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_strategy_plays_clean() {
        for strategy in PlayStrategy::ALL {
            for seed in [1, 7, 1337] {
                let summary = simulate(SimulationConfig::new(strategy, seed)).unwrap();
                assert!(summary.passed(), "{strategy} seed {seed}: {:?}", summary.violations);
                assert_eq!(summary.spins, 200);
            }
        }
    }

    #[test]
    fn draw_policy_runs_are_clean_too() {
        let config = SimulationConfig::new(PlayStrategy::Greedy, 99)
            .with_outcome_policy(OutcomePolicy::DrawAuthoritative)
            .with_max_spins(80);
        let summary = simulate(config).unwrap();
        assert!(summary.passed(), "{:?}", summary.violations);
        assert_eq!(summary.spins, 80);
    }

    #[test]
    fn runs_are_deterministic() {
        let config = SimulationConfig::new(PlayStrategy::Reviver, 4242).with_max_spins(60);
        assert_eq!(simulate(config).unwrap(), simulate(config).unwrap());
    }

    #[test]
    fn cautious_players_bank_something_eventually() {
        let summary =
            simulate(SimulationConfig::new(PlayStrategy::Cautious, 3).with_max_spins(400)).unwrap();
        assert!(summary.walk_aways > 0 || summary.bombs > 0);
        assert!(summary.highest_zone >= 2);
    }
}
