use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::PolicyResult;

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[PolicyResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[PolicyResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Wheel Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total runs: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.strategy.label().bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} clean",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Mean banked: {:.1}  Mean highest zone: {:.1}",
            result.mean_banked, result.mean_highest_zone
        )?;
        writeln!(
            out,
            "   Bombs: {}  Revives: {}  Walk aways: {}  Items converted: {}",
            result.total_bombs,
            result.total_revives,
            result.total_walk_aways,
            result.total_items_converted
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Violations:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[PolicyResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[PolicyResult]) -> Result<()> {
    writeln!(out, "# Wheel Simulation Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    writeln!(
        out,
        "| Status | Policy | Seed | Clean | Mean banked | Mean highest zone | Bombs | Revives | Walk aways |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "| {status} | {} | {} | {}/{} | {:.1} | {:.1} | {} | {} | {} |",
            result.strategy.label(),
            result.seed,
            result.successful_iterations,
            result.iterations_run,
            result.mean_banked,
            result.mean_highest_zone,
            result.total_bombs,
            result.total_revives,
            result.total_walk_aways
        )?;
    }

    let failing: Vec<&PolicyResult> = results.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Violations\n")?;
        for result in failing {
            writeln!(out, "### {} seed {}\n", result.strategy.label(), result.seed)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::PlayStrategy;

    fn sample(passed: bool) -> PolicyResult {
        PolicyResult {
            strategy: PlayStrategy::Greedy,
            seed: 42,
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["zone went from 3 to 5".to_string()]
            },
            mean_banked: 125.0,
            mean_highest_zone: 9.5,
            total_bombs: 4,
            total_revives: 1,
            total_walk_aways: 2,
            total_items_converted: 0,
            average_duration: Duration::from_millis(3),
        }
    }

    fn render(report: impl Fn(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        report(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_lists_violations() {
        let text = render(|out| {
            generate_console_report(out, &[sample(true), sample(false)], Duration::ZERO)
        });
        assert!(text.contains("Total runs: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("zone went from 3 to 5"));
    }

    #[test]
    fn markdown_has_a_table_row_per_result() {
        let text = render(|out| generate_markdown_report(out, &[sample(true)]));
        assert!(text.contains("# Wheel Simulation Results"));
        assert!(text.contains("| ✅ | greedy | 42 | 2/2 |"));
        assert!(!text.contains("## Violations"));
    }

    #[test]
    fn json_is_an_array_of_results() {
        let text = render(|out| generate_json_report(out, &[sample(false)]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["strategy"], "greedy");
    }

    #[test]
    fn empty_results_do_not_divide_by_zero() {
        let text = render(|out| generate_console_report(out, &[], Duration::ZERO));
        assert!(text.contains("Success rate: 0.0%"));
    }
}
