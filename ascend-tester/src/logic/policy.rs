use std::fmt;

use ascend_game::{RoundInfo, SequenceBoard, derive_stream_seed};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const POLICY_STREAM: &[u8] = b"policy";

/// Decision returned by a [`PlacementPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub slot: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(slot: usize, rationale: Option<String>) -> Self {
        Self { slot, rationale }
    }
}

/// Policy interface for automated play strategies.
pub trait PlacementPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the slot for `value` on the current board.
    fn pick_slot(&mut self, board: &SequenceBoard, value: u32, info: RoundInfo) -> PolicyDecision;
}

/// Built-in placement strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementStrategy {
    Leftmost,
    Proportional,
    Random,
    Blind,
}

impl PlacementStrategy {
    pub const ALL: [Self; 4] = [
        Self::Leftmost,
        Self::Proportional,
        Self::Random,
        Self::Blind,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PlacementStrategy::Leftmost => "Leftmost",
            PlacementStrategy::Proportional => "Proportional",
            PlacementStrategy::Random => "Random",
            PlacementStrategy::Blind => "Blind",
        }
    }

    /// Command-line key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            PlacementStrategy::Leftmost => "leftmost",
            PlacementStrategy::Proportional => "proportional",
            PlacementStrategy::Random => "random",
            PlacementStrategy::Blind => "blind",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            PlacementStrategy::Leftmost => "first slot that keeps the row sorted",
            PlacementStrategy::Proportional => {
                "valid slot nearest the value's position within its range"
            }
            PlacementStrategy::Random => "uniform pick among sorted-preserving slots",
            PlacementStrategy::Blind => "first empty slot, ignoring order",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(token.trim()))
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlacementPolicy + Send> {
        match self {
            PlacementStrategy::Leftmost => Box::new(LeftmostPolicy),
            PlacementStrategy::Proportional => Box::new(ProportionalPolicy),
            PlacementStrategy::Random => Box::new(RandomPolicy::new(seed)),
            PlacementStrategy::Blind => Box::new(BlindPolicy),
        }
    }
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct LeftmostPolicy;
struct ProportionalPolicy;
struct BlindPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, POLICY_STREAM)),
        }
    }
}

impl PlacementPolicy for LeftmostPolicy {
    fn name(&self) -> &'static str {
        "Leftmost"
    }

    fn pick_slot(&mut self, board: &SequenceBoard, value: u32, _info: RoundInfo) -> PolicyDecision {
        let slot = board
            .valid_indices(value)
            .first()
            .copied()
            .unwrap_or_else(|| first_empty(board));
        PolicyDecision::new(slot, None)
    }
}

impl PlacementPolicy for ProportionalPolicy {
    fn name(&self) -> &'static str {
        "Proportional"
    }

    fn pick_slot(&mut self, board: &SequenceBoard, value: u32, info: RoundInfo) -> PolicyDecision {
        let target = proportional_target(board.len(), value, info.total_rounds);
        let slot = board
            .valid_indices(value)
            .into_iter()
            .min_by_key(|&index| index.abs_diff(target))
            .unwrap_or_else(|| first_empty(board));
        PolicyDecision::new(slot, Some(format!("target {target}")))
    }
}

impl PlacementPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_slot(&mut self, board: &SequenceBoard, value: u32, _info: RoundInfo) -> PolicyDecision {
        let valid = board.valid_indices(value);
        if valid.is_empty() {
            return PolicyDecision::new(first_empty(board), Some("no valid slot".to_string()));
        }
        let pick = self.rng.gen_range(0..valid.len());
        PolicyDecision::new(valid[pick], Some(format!("{} candidates", valid.len())))
    }
}

impl PlacementPolicy for BlindPolicy {
    fn name(&self) -> &'static str {
        "Blind"
    }

    fn pick_slot(&mut self, board: &SequenceBoard, _value: u32, _info: RoundInfo) -> PolicyDecision {
        PolicyDecision::new(first_empty(board), None)
    }
}

fn first_empty(board: &SequenceBoard) -> usize {
    (0..board.len())
        .find(|&index| board.is_empty_at(index))
        .unwrap_or(0)
}

// Map `value` onto the board as if values up to the level's final range
// were spread evenly across the slots.
fn proportional_target(len: usize, value: u32, total_rounds: u32) -> usize {
    if len <= 1 {
        return 0;
    }
    let max_value = u64::from(total_rounds.max(1)) * 2;
    let offset = u64::from(value.saturating_sub(1)).min(max_value - 1);
    let last = u64::try_from(len - 1).unwrap_or(u64::MAX);
    let scaled = offset * last / (max_value - 1).max(1);
    usize::try_from(scaled).unwrap_or(len - 1)
}
