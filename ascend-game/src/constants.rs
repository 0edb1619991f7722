//! Centralized balance and tuning constants for Ascend game logic.
//!
//! Level shapes and number ranges live here so that difficulty can only be
//! adjusted through reviewed code changes rather than external assets.

use crate::level::LevelConfig;

// Logging ------------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "ASCEND_DEBUG_LOGS";

// Persistence --------------------------------------------------------------
/// Storage key under which the progress record is written.
pub const PROGRESS_KEY: &str = "ascend.progress";

// Number generation --------------------------------------------------------
/// Upper bound of the draw range grows by this much per round.
pub(crate) const RANGE_PER_ROUND: u32 = 2;
/// Lowest value the generator can produce.
pub(crate) const RANGE_FLOOR: u32 = 1;

// Seed streams -------------------------------------------------------------
pub(crate) const STREAM_NUMBERS: &[u8] = b"numbers";

// Level table --------------------------------------------------------------
/// Ordered level table. Levels past the end reuse the final entry.
pub const LEVEL_TABLE: [LevelConfig; 9] = [
    LevelConfig::new(1, 5, 4),
    LevelConfig::new(2, 7, 6),
    LevelConfig::new(3, 9, 8),
    LevelConfig::new(4, 10, 9),
    LevelConfig::new(5, 12, 11),
    LevelConfig::new(6, 14, 13),
    LevelConfig::new(7, 16, 15),
    LevelConfig::new(8, 17, 16),
    LevelConfig::new(9, 18, 17),
];

/// Largest slot count any level asks for; boards up to this size stay inline.
pub const MAX_SLOTS: usize = 18;
