mod logic;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{LogicTester, PolicyResult, resolve_seed_inputs, resolve_strategies};
use util::split_csv;
use wheel_game::OutcomePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutcomeMode {
    /// Pay the slice under the pointer at the final angle
    Angle,
    /// Pay the drawn slice; the rotation is cosmetic
    Draw,
}

impl From<OutcomeMode> for OutcomePolicy {
    fn from(mode: OutcomeMode) -> Self {
        match mode {
            OutcomeMode::Angle => Self::AngleAuthoritative,
            OutcomeMode::Draw => Self::DrawAuthoritative,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "wheel-tester", version)]
#[command(about = "Automated simulation and invariant checks for the risk wheel game logic")]
struct Args {
    /// Seeds to run (comma-separated integers or start..end ranges)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Runs per policy and seed; each run offsets the seed by its iteration
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Policies to run (cautious, greedy, reviver or all; comma-separated)
    #[arg(long, default_value = "all")]
    policy: String,

    /// Spin budget per run
    #[arg(long, default_value_t = 200)]
    max_spins: u32,

    /// Which value decides the paying slice
    #[arg(long, value_enum, default_value_t = OutcomeMode::Angle)]
    outcome: OutcomeMode,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let strategies = resolve_strategies(&split_csv(&args.policy))?;
    log::info!(
        "running {} policies over {} seeds, {} iterations each",
        strategies.len(),
        seeds.len(),
        args.iterations
    );

    let tester = LogicTester::new(args.verbose, args.max_spins, args.outcome.into());
    let results: Vec<PolicyResult> = strategies
        .iter()
        .flat_map(|strategy| tester.run_strategy(*strategy, &seeds, args.iterations))
        .collect();

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎡 Wheel Game Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn write_reports(args: &Args, results: &[PolicyResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(output_target.writer(), results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Wheel Simulation Results\n\n_No runs executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(output_target.writer(), results)?;
            }
        }
        _ => {
            logic::reports::generate_console_report(
                output_target.writer(),
                results,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
