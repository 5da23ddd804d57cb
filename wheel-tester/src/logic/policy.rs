use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use wheel_game::SessionState;

/// What the automated player wants to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Spin,
    WalkAway,
    Revive,
    GiveUp,
}

/// Everything a policy may look at before deciding.
#[derive(Debug, Clone, Copy)]
pub struct PolicyView {
    pub state: SessionState,
    pub allows_walk_away: bool,
    pub is_super_zone: bool,
    pub max_zone: u32,
    pub revive_cost: u64,
}

impl PolicyView {
    #[must_use]
    pub const fn can_afford_revive(&self) -> bool {
        self.state.banked_reward >= self.revive_cost
    }
}

/// Policy interface for automated play.
pub trait PlayerPolicy {
    fn name(&self) -> &'static str;

    fn decide(&mut self, view: &PolicyView) -> Decision;
}

/// Built-in play styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStrategy {
    /// Banks at the first protected zone and never pays to revive.
    Cautious,
    /// Rides to a super zone and revives whenever it can.
    Greedy,
    /// Banks once the pot is worth it; revives when affordable.
    Reviver,
}

impl PlayStrategy {
    pub const ALL: [Self; 3] = [Self::Cautious, Self::Greedy, Self::Reviver];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::Greedy => "greedy",
            Self::Reviver => "reviver",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Reviver => Box::new(ReviverPolicy {
                bank_threshold: REVIVER_BANK_THRESHOLD,
            }),
        }
    }
}

impl fmt::Display for PlayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cautious" => Ok(Self::Cautious),
            "greedy" => Ok(Self::Greedy),
            "reviver" => Ok(Self::Reviver),
            other => bail!("Unknown policy: {other}"),
        }
    }
}

/// Expand CLI policy tokens, honouring `all`.
///
/// # Errors
///
/// Returns an error for an unrecognized token.
pub fn resolve_strategies(tokens: &[String]) -> anyhow::Result<Vec<PlayStrategy>> {
    let mut strategies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for strategy in PlayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let strategy: PlayStrategy = token.parse()?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        strategies.extend(PlayStrategy::ALL);
    }
    Ok(strategies)
}

const REVIVER_BANK_THRESHOLD: u64 = 200;

struct CautiousPolicy;
struct GreedyPolicy;
struct ReviverPolicy {
    bank_threshold: u64,
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "cautious"
    }

    fn decide(&mut self, view: &PolicyView) -> Decision {
        if view.state.pending_bomb_decision {
            return Decision::GiveUp;
        }
        if view.allows_walk_away && view.state.temporary_reward > 0 {
            return Decision::WalkAway;
        }
        Decision::Spin
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn decide(&mut self, view: &PolicyView) -> Decision {
        if view.state.pending_bomb_decision {
            return if view.can_afford_revive() {
                Decision::Revive
            } else {
                Decision::GiveUp
            };
        }
        let at_top = view.state.current_zone >= view.max_zone;
        if view.allows_walk_away
            && view.state.temporary_reward > 0
            && (view.is_super_zone || at_top)
        {
            return Decision::WalkAway;
        }
        Decision::Spin
    }
}

impl PlayerPolicy for ReviverPolicy {
    fn name(&self) -> &'static str {
        "reviver"
    }

    fn decide(&mut self, view: &PolicyView) -> Decision {
        if view.state.pending_bomb_decision {
            return if view.can_afford_revive() {
                Decision::Revive
            } else {
                Decision::GiveUp
            };
        }
        if view.allows_walk_away && view.state.temporary_reward >= self.bank_threshold {
            return Decision::WalkAway;
        }
        Decision::Spin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(zone: u32, temporary: u64, banked: u64, pending: bool) -> PolicyView {
        PolicyView {
            state: SessionState {
                current_zone: zone,
                temporary_reward: temporary,
                banked_reward: banked,
                is_spinning: false,
                pending_bomb_decision: pending,
            },
            allows_walk_away: zone % 5 == 0,
            is_super_zone: zone % 30 == 0,
            max_zone: 60,
            revive_cost: 25,
        }
    }

    #[test]
    fn cautious_banks_at_first_safe_zone() {
        let mut policy = PlayStrategy::Cautious.create_policy();
        assert_eq!(policy.decide(&view(4, 100, 0, false)), Decision::Spin);
        assert_eq!(policy.decide(&view(5, 100, 0, false)), Decision::WalkAway);
        assert_eq!(policy.decide(&view(5, 0, 0, false)), Decision::Spin);
        assert_eq!(policy.decide(&view(3, 0, 500, true)), Decision::GiveUp);
    }

    #[test]
    fn greedy_waits_for_super_zones() {
        let mut policy = PlayStrategy::Greedy.create_policy();
        assert_eq!(policy.decide(&view(5, 900, 0, false)), Decision::Spin);
        assert_eq!(policy.decide(&view(30, 900, 0, false)), Decision::WalkAway);
        assert_eq!(policy.decide(&view(7, 0, 25, true)), Decision::Revive);
        assert_eq!(policy.decide(&view(7, 0, 24, true)), Decision::GiveUp);
    }

    #[test]
    fn reviver_banks_over_threshold() {
        let mut policy = PlayStrategy::Reviver.create_policy();
        assert_eq!(policy.decide(&view(5, 150, 0, false)), Decision::Spin);
        assert_eq!(policy.decide(&view(10, 250, 0, false)), Decision::WalkAway);
    }

    #[test]
    fn resolves_policy_tokens() {
        let all = resolve_strategies(&["all".to_string()]).unwrap();
        assert_eq!(all, PlayStrategy::ALL.to_vec());
        let some = resolve_strategies(&["Greedy".to_string(), "greedy".to_string()]).unwrap();
        assert_eq!(some, vec![PlayStrategy::Greedy]);
        assert!(resolve_strategies(&["reckless".to_string()]).is_err());
    }
}
