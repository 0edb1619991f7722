//! Level table lookups and the persisted level/fail progression.

use serde::{Deserialize, Serialize};

use crate::ProgressStorage;
use crate::constants::LEVEL_TABLE;
use crate::numbers::{percent, u32_to_usize};
use crate::progress::{ProgressRecord, SaveError, load_record, save_record};

/// Shape of one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    pub slots: u32,
    pub rounds: u32,
}

impl LevelConfig {
    #[must_use]
    pub const fn new(level: u32, slots: u32, rounds: u32) -> Self {
        Self {
            level,
            slots,
            rounds,
        }
    }

    /// Slot count as a board length.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        u32_to_usize(self.slots)
    }
}

/// Table lookup for `level`, clamped to the final entry past the end.
///
/// Level 0 maps to the first entry.
#[must_use]
pub fn config_for(level: u32) -> LevelConfig {
    let last = LEVEL_TABLE[LEVEL_TABLE.len() - 1];
    LEVEL_TABLE
        .iter()
        .find(|cfg| cfg.level == level.max(1))
        .copied()
        .unwrap_or(last)
}

/// Owns the progress record and the active level configuration.
///
/// Every mutation writes the record back through the storage seam. Write
/// failures are logged; the in-memory record stays authoritative.
#[derive(Debug)]
pub struct LevelProgression<S: ProgressStorage> {
    storage: S,
    record: ProgressRecord,
    active: LevelConfig,
}

impl<S: ProgressStorage> LevelProgression<S> {
    /// Build the progression from whatever `storage` holds.
    pub fn load(storage: S) -> Self {
        let record = load_record(&storage);
        Self {
            storage,
            record,
            active: config_for(record.level),
        }
    }

    /// Table lookup; see [`config_for`].
    #[must_use]
    pub fn config_for(level: u32) -> LevelConfig {
        config_for(level)
    }

    /// Re-read the record from storage, replacing the in-memory copy.
    pub fn load_progress(&mut self) -> ProgressRecord {
        self.record = load_record(&self.storage);
        self.active = config_for(self.record.level);
        self.record
    }

    /// Write the current record to storage.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the record cannot be serialized or written.
    pub fn save_progress(&self) -> Result<(), SaveError<S::Error>> {
        save_record(&self.storage, &self.record)
    }

    pub(crate) fn persist(&self) {
        if let Err(err) = self.save_progress() {
            log::warn!("progress not saved: {err}");
        }
    }

    /// Move to the next level. Fails carry over.
    pub fn advance(&mut self) -> LevelConfig {
        self.record.level = self.record.level.saturating_add(1);
        self.active = config_for(self.record.level);
        log::debug!("advanced to level {}", self.record.level);
        self.persist();
        self.active
    }

    /// Re-select the configuration for `level` without touching fails.
    pub fn reset_to_level(&mut self, level: u32) -> LevelConfig {
        let level = level.max(1);
        let changed = level != self.record.level;
        self.record.level = level;
        self.active = config_for(level);
        if changed {
            self.persist();
        }
        self.active
    }

    /// Bump the fail counter and persist it. Returns the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.record.fails = self.record.fails.saturating_add(1);
        self.persist();
        self.record.fails
    }

    /// Reset to level 1 with zero fails and drop the stored record.
    pub fn clear_progress(&mut self) -> LevelConfig {
        self.record = ProgressRecord::default();
        self.active = config_for(self.record.level);
        if let Err(err) = self.storage.remove(crate::constants::PROGRESS_KEY) {
            log::warn!("stored progress not removed: {err}");
        }
        self.active
    }

    /// Share of the level table already cleared, `0.0..=100.0`.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let cleared = usize::try_from(self.record.level.saturating_sub(1)).unwrap_or(usize::MAX);
        percent(cleared, LEVEL_TABLE.len())
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.record.level
    }

    #[must_use]
    pub const fn fails(&self) -> u32 {
        self.record.fails
    }

    #[must_use]
    pub const fn record(&self) -> ProgressRecord {
        self.record
    }

    #[must_use]
    pub const fn active_config(&self) -> LevelConfig {
        self.active
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the progression, returning its storage.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }
}
