//! Ascend Game Engine
//!
//! Platform-agnostic core logic for the Ascend number-placement puzzle: draw a
//! number, place it in a slot, keep the row ascending, clear the level's
//! rounds. This crate provides the rules without UI or platform-specific
//! dependencies; hosts observe it through [`GameListener`] events and persist
//! it through [`ProgressStorage`].

pub mod board;
pub mod constants;
pub mod controller;
pub mod event;
pub mod generator;
pub mod level;
pub mod numbers;
pub mod progress;
pub mod seed;

// Re-export commonly used types
pub use board::{BoardError, SequenceBoard};
pub use constants::{LEVEL_TABLE, PROGRESS_KEY};
pub use controller::{GameController, GameError, GameStatus, RoundInfo, RoundState};
pub use event::{GameEvent, GameListener, LossReason, NoopListener};
pub use generator::{NumberGenerator, NumberSource};
pub use level::{LevelConfig, LevelProgression, config_for};
pub use progress::{MemoryStorage, ProgressRecord, SaveError, load_record, save_record};
pub use seed::derive_stream_seed;

/// Trait for abstracting durable key/value storage of the progress record.
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read. A missing key is `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Overwrite the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be written.
    fn write(&self, key: &str, payload: &str) -> Result<(), Self::Error>;

    /// Remove whatever is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be removed.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Start a session on `storage` right away, returning it in `InProgress`.
pub fn start_session<S, L>(storage: S, listener: L, seed: u64) -> GameController<S, L>
where
    S: ProgressStorage,
    L: GameListener,
{
    let mut controller = GameController::new(storage, listener, seed);
    controller.restart();
    controller
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_leftmost<S: ProgressStorage, L: GameListener>(controller: &mut GameController<S, L>) {
        while controller.status() == GameStatus::InProgress {
            let value = controller.current_number().unwrap();
            let slot = controller.board().valid_indices(value)[0];
            controller.place_at(slot).unwrap();
        }
    }

    #[test]
    fn progress_survives_new_session() {
        for seed in 0..100 {
            let storage = MemoryStorage::new();
            let mut controller = start_session(storage.clone(), NoopListener, seed);
            play_leftmost(&mut controller);
            if controller.status() != GameStatus::LevelComplete {
                continue;
            }
            controller.advance_level().unwrap();
            let fails_before = controller.fail_count();
            drop(controller);

            let resumed = GameController::new(storage, NoopListener, seed + 1);
            assert_eq!(resumed.level(), 2);
            assert_eq!(resumed.fail_count(), fails_before);
            assert_eq!(resumed.status(), GameStatus::Idle);
            assert_eq!(resumed.board().len(), 7);
            return;
        }
        panic!("no seed cleared level 1");
    }

    #[test]
    fn start_session_does_not_count_a_fail() {
        let controller = start_session(MemoryStorage::new(), NoopListener, 77);
        assert_eq!(controller.status(), GameStatus::InProgress);
        assert_eq!(controller.fail_count(), 0);
    }
}
