use std::time::{Duration, Instant};

use ascend_game::numbers::{percent, u32_to_usize, usize_to_f64};
use ascend_game::{
    GameController, GameEvent, GameStatus, LossReason, NumberGenerator, ProgressStorage,
};
use colored::Colorize;
use serde::Serialize;

use super::policy::{PlacementPolicy, PlacementStrategy};

/// Limits applied to a single automated run.
#[derive(Debug, Clone, Copy)]
pub struct RunPlan {
    pub strategy: PlacementStrategy,
    pub max_levels: u32,
    pub max_attempts: u32,
}

/// Outcome of one seeded run under one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub strategy: String,
    pub seed: u64,
    pub starting_level: u32,
    pub highest_level: u32,
    pub levels_cleared: u32,
    pub attempts: u32,
    pub wrong_placements: u32,
    pub impossible_moves: u32,
    pub fails_recorded: u32,
    pub placements: u64,
    pub generator_draws: u64,
    #[serde(skip)]
    pub duration: Duration,
    pub violations: Vec<String>,
}

impl RunSummary {
    fn new(strategy: PlacementStrategy, seed: u64) -> Self {
        Self {
            strategy: strategy.label().to_string(),
            seed,
            starting_level: 1,
            highest_level: 1,
            levels_cleared: 0,
            attempts: 0,
            wrong_placements: 0,
            impossible_moves: 0,
            fails_recorded: 0,
            placements: 0,
            generator_draws: 0,
            duration: Duration::ZERO,
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn losses(&self) -> u32 {
        self.wrong_placements + self.impossible_moves
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Per-strategy rollup across every run.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: String,
    pub runs: usize,
    pub mean_levels_cleared: f64,
    pub max_level_reached: u32,
    pub attempt_win_rate: f64,
    pub wrong_placement_share: f64,
    pub impossible_move_share: f64,
    pub mean_placements: f64,
    pub violations: usize,
}

/// Play one session from whatever progress `storage` holds.
///
/// The run stops once `max_levels` levels are cleared or `max_attempts`
/// level attempts have been played.
pub fn run_session<S: ProgressStorage>(plan: RunPlan, seed: u64, storage: S) -> RunSummary {
    let started = Instant::now();
    let mut summary = RunSummary::new(plan.strategy, seed);
    let mut controller = GameController::new(storage, Vec::new(), seed);
    let mut policy = plan.strategy.create_policy(seed);
    let starting_fails = controller.fail_count();
    summary.starting_level = controller.level();

    if let Err(err) = controller.start() {
        summary.violations.push(format!("start rejected: {err}"));
    }
    summary.attempts = 1;

    loop {
        match controller.status() {
            GameStatus::InProgress => {
                if !take_turn(&mut controller, policy.as_mut(), &mut summary) {
                    break;
                }
            }
            GameStatus::LevelComplete => {
                summary.levels_cleared += 1;
                if summary.levels_cleared >= plan.max_levels
                    || summary.attempts >= plan.max_attempts
                {
                    break;
                }
                if let Err(err) = controller.advance_level() {
                    summary.violations.push(format!("advance rejected: {err}"));
                    break;
                }
                summary.attempts += 1;
            }
            GameStatus::Lost(reason) => {
                match reason {
                    LossReason::WrongPlacement => summary.wrong_placements += 1,
                    LossReason::ImpossibleMove => summary.impossible_moves += 1,
                }
                if summary.attempts >= plan.max_attempts {
                    break;
                }
                controller.restart();
                summary.attempts += 1;
            }
            GameStatus::Idle => {
                summary.violations.push("session fell back to idle".to_string());
                break;
            }
        }
    }

    summary.highest_level = controller.level();
    summary.fails_recorded = controller.fail_count().saturating_sub(starting_fails);
    summary.generator_draws = controller.generator_draws();
    check_ledger(&controller, &mut summary);
    summary.duration = started.elapsed();
    log::debug!(
        "{} seed {}: cleared {} level(s) in {} attempt(s)",
        summary.strategy,
        seed,
        summary.levels_cleared,
        summary.attempts
    );
    summary
}

// Returns false when the run cannot continue.
fn take_turn<S: ProgressStorage>(
    controller: &mut GameController<S, Vec<GameEvent>, NumberGenerator>,
    policy: &mut (dyn PlacementPolicy + Send),
    summary: &mut RunSummary,
) -> bool {
    let Some(value) = controller.current_number() else {
        summary
            .violations
            .push("in progress without a pending number".to_string());
        return false;
    };
    let decision = policy.pick_slot(controller.board(), value, controller.round_info());
    if let Some(rationale) = decision.rationale.as_deref() {
        log::trace!("{} places {value} at {} ({rationale})", policy.name(), decision.slot);
    }
    match controller.place_at(decision.slot) {
        Ok(status) => {
            summary.placements += 1;
            if status == GameStatus::InProgress && !controller.board().is_sorted() {
                summary.violations.push(format!(
                    "unsorted board while in progress: {:?}",
                    controller.board_snapshot()
                ));
                return false;
            }
            true
        }
        Err(err) => {
            summary
                .violations
                .push(format!("{} chose slot {}: {err}", policy.name(), decision.slot));
            false
        }
    }
}

// Every loss is a recorded fail and a Lost event; the runner never forfeits.
fn check_ledger<S: ProgressStorage>(
    controller: &GameController<S, Vec<GameEvent>, NumberGenerator>,
    summary: &mut RunSummary,
) {
    let lost_events = controller
        .listener()
        .iter()
        .filter(|event| matches!(event, GameEvent::Lost { .. }))
        .count();
    if u32_to_usize(summary.losses()) != lost_events {
        summary.violations.push(format!(
            "{} losses observed but {lost_events} lost events emitted",
            summary.losses()
        ));
    }
    if summary.fails_recorded != summary.losses() {
        summary.violations.push(format!(
            "fail count grew by {} for {} losses",
            summary.fails_recorded,
            summary.losses()
        ));
    }
}

/// Print a one-line outcome for a finished run.
pub fn announce_run(summary: &RunSummary) {
    let status = if summary.passed() {
        "✅".green()
    } else {
        "❌".red()
    };
    println!(
        "{} [{} seed {}] cleared {} | level {} -> {} | losses {} | {:?}",
        status,
        summary.strategy.bold(),
        summary.seed,
        summary.levels_cleared,
        summary.starting_level,
        summary.highest_level,
        summary.losses(),
        summary.duration
    );
    for violation in &summary.violations {
        println!("     • {}", violation.red());
    }
}

/// Group runs by strategy in first-seen order.
#[must_use]
pub fn aggregate_runs(summaries: &[RunSummary]) -> Vec<StrategyAggregate> {
    let mut order: Vec<&str> = Vec::new();
    for summary in summaries {
        if !order.contains(&summary.strategy.as_str()) {
            order.push(summary.strategy.as_str());
        }
    }

    order
        .into_iter()
        .map(|strategy| {
            let runs: Vec<&RunSummary> = summaries
                .iter()
                .filter(|summary| summary.strategy == strategy)
                .collect();
            aggregate_strategy(strategy, &runs)
        })
        .collect()
}

fn aggregate_strategy(strategy: &str, runs: &[&RunSummary]) -> StrategyAggregate {
    let count = runs.len();
    let cleared: usize = runs.iter().map(|r| u32_to_usize(r.levels_cleared)).sum();
    let attempts: usize = runs.iter().map(|r| u32_to_usize(r.attempts)).sum();
    let wrong: usize = runs.iter().map(|r| u32_to_usize(r.wrong_placements)).sum();
    let impossible: usize = runs.iter().map(|r| u32_to_usize(r.impossible_moves)).sum();
    let placements: u64 = runs.iter().map(|r| r.placements).sum();
    let losses = wrong + impossible;
    let runs_f = usize_to_f64(count.max(1));

    StrategyAggregate {
        strategy: strategy.to_string(),
        runs: count,
        mean_levels_cleared: usize_to_f64(cleared) / runs_f,
        max_level_reached: runs.iter().map(|r| r.highest_level).max().unwrap_or(1),
        attempt_win_rate: percent(cleared, attempts),
        wrong_placement_share: percent(wrong, losses),
        impossible_move_share: percent(impossible, losses),
        mean_placements: usize_to_f64(usize::try_from(placements).unwrap_or(usize::MAX)) / runs_f,
        violations: runs.iter().filter(|r| !r.passed()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascend_game::{MemoryStorage, PROGRESS_KEY, ProgressRecord, load_record};

    fn plan(strategy: PlacementStrategy) -> RunPlan {
        RunPlan {
            strategy,
            max_levels: 3,
            max_attempts: 25,
        }
    }

    #[test]
    fn sorted_strategies_never_lose_by_wrong_placement() {
        for strategy in [
            PlacementStrategy::Leftmost,
            PlacementStrategy::Proportional,
            PlacementStrategy::Random,
        ] {
            for seed in 0..10 {
                let summary = run_session(plan(strategy), seed, MemoryStorage::new());
                assert!(summary.passed(), "{strategy} seed {seed}: {:?}", summary.violations);
                assert_eq!(summary.wrong_placements, 0);
                assert!(summary.attempts <= 25);
            }
        }
    }

    #[test]
    fn blind_play_keeps_the_ledger_consistent() {
        for seed in 0..10 {
            let summary = run_session(plan(PlacementStrategy::Blind), seed, MemoryStorage::new());
            assert!(summary.passed(), "seed {seed}: {:?}", summary.violations);
            assert_eq!(summary.fails_recorded, summary.losses());
        }
    }

    #[test]
    fn progress_carries_into_the_next_run() {
        let storage = MemoryStorage::new();
        let first = run_session(plan(PlacementStrategy::Proportional), 5, storage.clone());
        let record = load_record(&storage);
        assert_eq!(record.level, first.highest_level);
        assert_eq!(record.fails, first.fails_recorded);

        let second = run_session(plan(PlacementStrategy::Proportional), 6, storage.clone());
        assert_eq!(second.starting_level, first.highest_level);
        assert!(storage.raw(PROGRESS_KEY).is_some());
    }

    #[test]
    fn attempt_cap_is_respected() {
        let summary = run_session(
            RunPlan {
                strategy: PlacementStrategy::Blind,
                max_levels: 9,
                max_attempts: 1,
            },
            3,
            MemoryStorage::new(),
        );
        assert_eq!(summary.attempts, 1);
        assert!(summary.levels_cleared <= 1);
    }

    #[test]
    fn resumes_from_stored_level() {
        let storage = MemoryStorage::new();
        storage.insert_raw(PROGRESS_KEY, &ProgressRecord { level: 4, fails: 2 }.to_json().unwrap());
        let summary = run_session(plan(PlacementStrategy::Leftmost), 1, storage);
        assert_eq!(summary.starting_level, 4);
        assert!(summary.highest_level >= 4);
    }

    #[test]
    fn aggregates_group_by_strategy() {
        let mut summaries = Vec::new();
        for seed in 0..3 {
            summaries.push(run_session(plan(PlacementStrategy::Leftmost), seed, MemoryStorage::new()));
            summaries.push(run_session(plan(PlacementStrategy::Blind), seed, MemoryStorage::new()));
        }
        let aggregates = aggregate_runs(&summaries);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].strategy, "Leftmost");
        assert_eq!(aggregates[0].runs, 3);
        assert!(aggregates[0].wrong_placement_share.abs() < f64::EPSILON);
        assert_eq!(aggregates[1].strategy, "Blind");
        assert_eq!(aggregates[1].violations, 0);
        assert!(aggregates[1].max_level_reached >= 1);
    }
}
