use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::runner::{RunSummary, StrategyAggregate};

#[derive(Serialize)]
struct JsonReport<'a> {
    runs: &'a [RunSummary],
    aggregates: &'a [StrategyAggregate],
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[RunSummary],
    aggregates: &[StrategyAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Playthrough Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "======================".cyan())?;

    let total = summaries.len();
    let clean = summaries.iter().filter(|s| s.passed()).count();
    writeln!(writer, "Total runs: {total}")?;
    writeln!(writer, "Clean: {}", clean.to_string().green())?;
    writeln!(writer, "With violations: {}", (total - clean).to_string().red())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for aggregate in aggregates {
        let status = if aggregate.violations == 0 {
            "✅".green()
        } else {
            "❌".red()
        };
        writeln!(writer, "{} {}", status, aggregate.strategy.bold())?;
        writeln!(writer, "   Runs: {}", aggregate.runs)?;
        writeln!(
            writer,
            "   Levels cleared per run: {:.2} (best level {})",
            aggregate.mean_levels_cleared, aggregate.max_level_reached
        )?;
        writeln!(writer, "   Attempt win rate: {:.1}%", aggregate.attempt_win_rate)?;
        writeln!(
            writer,
            "   Losses: {:.1}% wrong placement, {:.1}% impossible move",
            aggregate.wrong_placement_share, aggregate.impossible_move_share
        )?;
        writeln!(writer, "   Placements per run: {:.1}", aggregate.mean_placements)?;
        writeln!(writer)?;
    }

    let failing: Vec<&RunSummary> = summaries.iter().filter(|s| !s.passed()).collect();
    if !failing.is_empty() {
        writeln!(writer, "{}", "🚨 Invariant Violations".bright_red().bold())?;
        writeln!(writer, "{}", "=======================".red())?;
        for summary in failing {
            writeln!(writer, "{} seed {}", summary.strategy.bold(), summary.seed)?;
            for violation in &summary.violations {
                writeln!(writer, "     • {}", violation.red())?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[RunSummary],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    let report = JsonReport {
        runs: summaries,
        aggregates,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    summaries: &[RunSummary],
    aggregates: &[StrategyAggregate],
) -> Result<()> {
    writeln!(writer, "# Ascend Playthrough Results\n")?;

    let total = summaries.len();
    let clean = summaries.iter().filter(|s| s.passed()).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total runs**: {total}")?;
    writeln!(writer, "- **Clean**: {clean}")?;
    writeln!(writer, "- **With violations**: {}\n", total - clean)?;

    writeln!(writer, "## Strategies\n")?;
    writeln!(
        writer,
        "| Strategy | Runs | Levels cleared | Best level | Win rate | Wrong placement | Impossible move |"
    )?;
    writeln!(writer, "|---|---|---|---|---|---|---|")?;
    for aggregate in aggregates {
        writeln!(
            writer,
            "| {} | {} | {:.2} | {} | {:.1}% | {:.1}% | {:.1}% |",
            aggregate.strategy,
            aggregate.runs,
            aggregate.mean_levels_cleared,
            aggregate.max_level_reached,
            aggregate.attempt_win_rate,
            aggregate.wrong_placement_share,
            aggregate.impossible_move_share
        )?;
    }
    writeln!(writer)?;

    let failing: Vec<&RunSummary> = summaries.iter().filter(|s| !s.passed()).collect();
    if !failing.is_empty() {
        writeln!(writer, "## Violations\n")?;
        for summary in failing {
            writeln!(writer, "### ❌ {} seed {}\n", summary.strategy, summary.seed)?;
            for violation in &summary.violations {
                writeln!(writer, "- {violation}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

pub fn generate_csv_report<W: Write + ?Sized>(writer: &mut W, summaries: &[RunSummary]) -> Result<()> {
    writeln!(
        writer,
        "strategy,seed,starting_level,highest_level,levels_cleared,attempts,wrong_placements,impossible_moves,fails_recorded,placements,generator_draws,violations"
    )?;
    for s in summaries {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            s.strategy,
            s.seed,
            s.starting_level,
            s.highest_level,
            s.levels_cleared,
            s.attempts,
            s.wrong_placements,
            s.impossible_moves,
            s.fails_recorded,
            s.placements,
            s.generator_draws,
            s.violations.len()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::PlacementStrategy;
    use crate::logic::runner::{RunPlan, aggregate_runs, run_session};
    use ascend_game::MemoryStorage;

    fn sample() -> (Vec<RunSummary>, Vec<StrategyAggregate>) {
        let plan = RunPlan {
            strategy: PlacementStrategy::Leftmost,
            max_levels: 2,
            max_attempts: 5,
        };
        let mut summaries = vec![
            run_session(plan, 1, MemoryStorage::new()),
            run_session(plan, 2, MemoryStorage::new()),
        ];
        summaries[1].violations.push("synthetic".to_string());
        let aggregates = aggregate_runs(&summaries);
        (summaries, aggregates)
    }

    #[test]
    fn json_report_parses_back() {
        let (summaries, aggregates) = sample();
        let mut buffer = Vec::new();
        generate_json_report(&mut buffer, &summaries, &aggregates).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["runs"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["aggregates"][0]["strategy"], "Leftmost");
        assert_eq!(value["aggregates"][0]["violations"], 1);
    }

    #[test]
    fn csv_report_has_a_row_per_run() {
        let (summaries, _) = sample();
        let mut buffer = Vec::new();
        generate_csv_report(&mut buffer, &summaries).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strategy,seed"));
        assert!(lines[1].starts_with("Leftmost,1,"));
        assert!(lines[2].ends_with(",1"));
    }

    #[test]
    fn markdown_report_lists_violations() {
        let (summaries, aggregates) = sample();
        let mut buffer = Vec::new();
        generate_markdown_report(&mut buffer, &summaries, &aggregates).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# Ascend Playthrough Results"));
        assert!(text.contains("| Leftmost | 2 |"));
        assert!(text.contains("- synthetic"));
    }

    #[test]
    fn console_report_mentions_each_strategy() {
        let (summaries, aggregates) = sample();
        let mut buffer = Vec::new();
        generate_console_report(&mut buffer, &summaries, &aggregates, Duration::from_millis(5))
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Total runs: 2"));
        assert!(text.contains("Leftmost"));
        assert!(text.contains("synthetic"));
    }
}
