use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use wheel_game::OutcomePolicy;

use crate::logic::policy::PlayStrategy;
use crate::logic::simulation::{RunSummary, SimulationConfig, simulate};

/// Aggregate of every run of one strategy on one seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResult {
    pub strategy: PlayStrategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub mean_banked: f64,
    pub mean_highest_zone: f64,
    pub total_bombs: u64,
    pub total_revives: u64,
    pub total_walk_aways: u64,
    pub total_items_converted: u64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct LogicTester {
    verbose: bool,
    max_spins: u32,
    outcome_policy: OutcomePolicy,
}

impl LogicTester {
    pub const fn new(verbose: bool, max_spins: u32, outcome_policy: OutcomePolicy) -> Self {
        Self {
            verbose,
            max_spins,
            outcome_policy,
        }
    }

    pub fn run_strategy(
        &self,
        strategy: PlayStrategy,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<PolicyResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🎡 Testing policy: {} (seed: {seed})",
                        strategy.label().bright_white()
                    );
                }
                self.run_single(strategy, seed, iterations)
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn run_single(&self, strategy: PlayStrategy, seed: u64, iterations: usize) -> PolicyResult {
        let mut summaries = Vec::with_capacity(iterations);
        let mut failures = Vec::new();
        let mut durations = Vec::with_capacity(iterations);

        for iteration in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(iteration).unwrap_or(u64::MAX));
            let config = SimulationConfig::new(strategy, iteration_seed)
                .with_max_spins(self.max_spins)
                .with_outcome_policy(self.outcome_policy);
            let started = Instant::now();
            match simulate(config) {
                Ok(summary) => {
                    for violation in &summary.violations {
                        failures.push(format!(
                            "iteration {iteration} (seed {iteration_seed}): {violation}"
                        ));
                    }
                    if self.verbose {
                        print_iteration(iteration, &summary);
                    }
                    summaries.push(summary);
                }
                Err(err) => failures.push(format!("iteration {iteration}: {err:#}")),
            }
            durations.push(started.elapsed());
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };
        let successful_iterations = summaries.iter().filter(|s| s.passed()).count();

        PolicyResult {
            strategy,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations,
            failures,
            mean_banked: mean(&summaries, |s| s.final_banked as f64),
            mean_highest_zone: mean(&summaries, |s| f64::from(s.highest_zone)),
            total_bombs: summaries.iter().map(|s| u64::from(s.bombs)).sum(),
            total_revives: summaries.iter().map(|s| u64::from(s.revives)).sum(),
            total_walk_aways: summaries.iter().map(|s| u64::from(s.walk_aways)).sum(),
            total_items_converted: summaries.iter().map(|s| u64::from(s.items_converted)).sum(),
            average_duration,
        }
    }
}

fn print_iteration(iteration: usize, summary: &RunSummary) {
    let status = if summary.passed() {
        "ok".green()
    } else {
        "violations".red()
    };
    println!(
        "   #{iteration} seed {}: {status} banked {} highest zone {} bombs {}",
        summary.seed, summary.final_banked, summary.highest_zone, summary.bombs
    );
}

#[allow(clippy::cast_precision_loss)]
fn mean(summaries: &[RunSummary], value: impl Fn(&RunSummary) -> f64) -> f64 {
    if summaries.is_empty() {
        return 0.0;
    }
    summaries.iter().map(value).sum::<f64>() / summaries.len() as f64
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_each_seed_separately() {
        let tester = LogicTester::new(false, 50, OutcomePolicy::AngleAuthoritative);
        let results = tester.run_strategy(PlayStrategy::Cautious, &[1, 2], 3);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.iterations_run, 3);
            assert_eq!(result.successful_iterations, 3);
            assert!(result.mean_highest_zone >= 1.0);
        }
    }

    #[test]
    fn zero_iterations_yield_an_empty_pass() {
        let tester = LogicTester::new(false, 10, OutcomePolicy::DrawAuthoritative);
        let results = tester.run_strategy(PlayStrategy::Greedy, &[5], 0);
        assert!(results[0].passed);
        assert_eq!(results[0].average_duration, Duration::ZERO);
        assert!(results[0].mean_banked.abs() < f64::EPSILON);
    }

    #[test]
    fn results_serialize_for_reports() {
        let tester = LogicTester::new(false, 20, OutcomePolicy::AngleAuthoritative);
        let result = tester.run_strategy(PlayStrategy::Reviver, &[8], 1).remove(0);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"strategy\":\"reviver\""));
        let restored: PolicyResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.seed, 8);
    }
}
