mod logic;
mod storage;
mod util;

use anyhow::{Context, Result, bail};
use ascend_game::MemoryStorage;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    PlacementStrategy, RunPlan, RunSummary, StrategyAggregate, aggregate_runs, announce_run,
    resolve_seed_inputs, run_session,
};
use storage::FileStorage;
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for terminals
    Console,
    /// Machine-readable runs and aggregates
    Json,
    /// Markdown tables
    Markdown,
    /// One row per run
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "ascend-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs and invariant checks for the Ascend game engine")]
struct Args {
    /// Placement strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated; ranges like 1..10 are expanded)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of runs per strategy and seed (run i uses seed + i)
    #[arg(long, default_value_t = 10)]
    iterations: u64,

    /// Stop a run after clearing this many levels
    #[arg(long, default_value_t = 9)]
    max_levels: u32,

    /// Stop a run after this many level attempts
    #[arg(long, default_value_t = 50)]
    max_attempts: u32,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Print one line per run
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist progress in this directory so runs resume where the last one stopped
    #[arg(long)]
    progress_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    if shows_banner(&args) {
        announce_banner();
    }

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let summaries = run_strategies(&args, &strategies, &seeds);
    let aggregates = aggregate_runs(&summaries);

    write_reports(&args, &summaries, &aggregates, start_time)?;

    if summaries.iter().any(|s| !s.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in PlacementStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:15} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

// Machine-readable reports on stdout stay clean.
fn shows_banner(args: &Args) -> bool {
    args.output.is_some() || args.report == ReportFormat::Console
}

fn announce_banner() {
    println!("{}", "🎮 Ascend Automated Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn expand_strategies(strategies_arg: &str) -> Result<Vec<PlacementStrategy>> {
    let mut strategies: Vec<PlacementStrategy> = Vec::new();
    for token in split_csv(strategies_arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(PlacementStrategy::ALL);
            continue;
        }
        let Some(strategy) = PlacementStrategy::parse(&token) else {
            bail!("Unknown strategy: {token}");
        };
        strategies.push(strategy);
    }
    let mut deduped: Vec<PlacementStrategy> = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        if !deduped.contains(&strategy) {
            deduped.push(strategy);
        }
    }
    if deduped.is_empty() {
        deduped.extend(PlacementStrategy::ALL);
    }
    Ok(deduped)
}

fn run_strategies(args: &Args, strategies: &[PlacementStrategy], seeds: &[u64]) -> Vec<RunSummary> {
    let mut summaries = Vec::new();
    let announce = args.verbose && shows_banner(args);
    if let Some(dir) = args.progress_dir.as_ref() {
        log::info!("persisting progress under {}", dir.display());
    }

    for &strategy in strategies {
        let plan = RunPlan {
            strategy,
            max_levels: args.max_levels.max(1),
            max_attempts: args.max_attempts.max(1),
        };
        for &seed in seeds {
            for iteration in 0..args.iterations.max(1) {
                let run_seed = seed.wrapping_add(iteration);
                let summary = match args.progress_dir.as_ref() {
                    Some(dir) => run_session(plan, run_seed, FileStorage::new(dir)),
                    None => run_session(plan, run_seed, MemoryStorage::new()),
                };
                if announce {
                    announce_run(&summary);
                }
                summaries.push(summary);
            }
        }
    }

    summaries
}

fn write_reports(
    args: &Args,
    summaries: &[RunSummary],
    aggregates: &[StrategyAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(&mut output_target, summaries, aggregates)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, summaries, aggregates)?;
        }
        ReportFormat::Csv => {
            logic::reports::generate_csv_report(&mut output_target, summaries)?;
        }
        ReportFormat::Console => {
            let duration = start_time.elapsed();
            if summaries.is_empty() {
                writeln!(&mut output_target, "No runs executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    summaries,
                    aggregates,
                    duration,
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
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
