pub mod policy;
pub mod reports;
pub mod runner;
pub mod seeds;

pub use policy::PlacementStrategy;
pub use runner::{RunPlan, RunSummary, StrategyAggregate, aggregate_runs, announce_run, run_session};
pub use seeds::resolve_seed_inputs;
