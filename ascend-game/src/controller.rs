//! Round lifecycle state machine.
//!
//! `Idle → InProgress → {Lost, LevelComplete}`. Terminal states hold until
//! [`GameController::restart`] or [`GameController::advance_level`].

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ProgressStorage;
use crate::board::{BoardError, SequenceBoard};
use crate::constants::DEBUG_ENV_VAR;
use crate::event::{GameEvent, GameListener, LossReason};
use crate::generator::{NumberGenerator, NumberSource};
use crate::level::{LevelConfig, LevelProgression};

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

/// Lifecycle position of the current level attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum GameStatus {
    Idle,
    InProgress,
    Lost(LossReason),
    LevelComplete,
}

impl GameStatus {
    /// True for `Lost` and `LevelComplete`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Lost(_) | Self::LevelComplete)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in progress",
            Self::Lost(_) => "lost",
            Self::LevelComplete => "level complete",
        }
    }
}

/// Commands rejected by the controller. None of them mutate state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("slot {index} is outside a board of {len} slots")]
    OutOfRange { index: usize, len: usize },
    #[error("slot {index} is already filled")]
    SlotOccupied { index: usize },
    #[error("cannot {action} while {}", .status.label())]
    InvalidStateTransition {
        action: &'static str,
        status: GameStatus,
    },
}

impl From<BoardError> for GameError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::OutOfRange { index, len } => Self::OutOfRange { index, len },
            BoardError::SlotOccupied { index } => Self::SlotOccupied { index },
        }
    }
}

/// Round counters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub current_round: u32,
    pub total_rounds: u32,
    pub current_level: u32,
}

/// Per-attempt round bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// One-based; exceeds the round count once the level is complete.
    pub current_round: u32,
    /// Set only while a number awaits placement.
    pub current_number: Option<u32>,
    pub last_generated: Option<u32>,
}

/// Orchestrates number source, board and progression for one game session.
#[derive(Debug)]
pub struct GameController<S, L, N = NumberGenerator>
where
    S: ProgressStorage,
    L: GameListener,
    N: NumberSource,
{
    progression: LevelProgression<S>,
    board: SequenceBoard,
    numbers: N,
    current_round: u32,
    current_number: Option<u32>,
    status: GameStatus,
    listener: L,
}

impl<S, L> GameController<S, L, NumberGenerator>
where
    S: ProgressStorage,
    L: GameListener,
{
    /// Create an idle session drawing from the number stream of `seed`.
    /// Progress is loaded from `storage`.
    pub fn new(storage: S, listener: L, seed: u64) -> Self {
        Self::with_source(storage, listener, NumberGenerator::from_session_seed(seed))
    }

    /// Raw generator draws this session, rerolls included.
    #[must_use]
    pub const fn generator_draws(&self) -> u64 {
        self.numbers.draws()
    }
}

impl<S, L, N> GameController<S, L, N>
where
    S: ProgressStorage,
    L: GameListener,
    N: NumberSource,
{
    /// Create an idle session drawing from an arbitrary number source.
    pub fn with_source(storage: S, listener: L, numbers: N) -> Self {
        let progression = LevelProgression::load(storage);
        let board = SequenceBoard::new(progression.active_config().slot_count());
        Self {
            progression,
            board,
            numbers,
            current_round: 1,
            current_number: None,
            status: GameStatus::Idle,
            listener,
        }
    }

    /// Begin the stored level. Only legal from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidStateTransition`] once the session has started.
    pub fn start(&mut self) -> Result<GameStatus, GameError> {
        if self.status != GameStatus::Idle {
            return Err(GameError::InvalidStateTransition {
                action: "start",
                status: self.status,
            });
        }
        self.begin_level();
        Ok(self.status)
    }

    /// Place the pending number at `index`.
    ///
    /// Returns the status after the placement: still `InProgress`,
    /// `Lost(WrongPlacement)`, `Lost(ImpossibleMove)` for the next draw, or
    /// `LevelComplete`.
    ///
    /// # Errors
    ///
    /// Rejects with no mutation when the game is not in progress, the index is
    /// out of range, or the slot is filled.
    pub fn place_at(&mut self, index: usize) -> Result<GameStatus, GameError> {
        let Some(value) = self.pending_number() else {
            return Err(GameError::InvalidStateTransition {
                action: "place",
                status: self.status,
            });
        };
        self.board.check_slot(index)?;

        if !self.board.place(index, value)? {
            self.lose(LossReason::WrongPlacement);
            return Ok(self.status);
        }

        self.current_number = None;
        self.emit(GameEvent::PlacementAccepted { index, value });
        self.current_round = self.current_round.saturating_add(1);

        if self.current_round > self.config().rounds {
            self.status = GameStatus::LevelComplete;
            self.progression.persist();
            log::debug!("level {} complete", self.progression.level());
            self.emit(GameEvent::LevelComplete {
                level: self.progression.level(),
            });
        } else {
            self.deal_number();
        }
        Ok(self.status)
    }

    /// Restart the current level from round 1.
    ///
    /// Restarting while `InProgress` is a voluntary forfeit and counts as a
    /// fail. Restarting after a loss does not count again.
    pub fn restart(&mut self) -> GameStatus {
        if self.status == GameStatus::InProgress {
            let fails = self.progression.record_failure();
            log::debug!("voluntary restart, fails now {fails}");
        }
        self.progression.reset_to_level(self.progression.level());
        self.begin_level();
        self.status
    }

    /// Move on to the next level. Only legal from `LevelComplete`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidStateTransition`] from any other state.
    pub fn advance_level(&mut self) -> Result<GameStatus, GameError> {
        if self.status != GameStatus::LevelComplete {
            return Err(GameError::InvalidStateTransition {
                action: "advance",
                status: self.status,
            });
        }
        self.progression.advance();
        self.emit(GameEvent::LevelAdvanced {
            level: self.progression.level(),
        });
        self.begin_level();
        Ok(self.status)
    }

    /// Wipe stored progress and return to level 1 with zero fails.
    ///
    /// An idle session stays idle; a running one starts level 1 immediately.
    pub fn clear_progress(&mut self) -> GameStatus {
        let cfg = self.progression.clear_progress();
        if self.status == GameStatus::Idle {
            self.board.reset(cfg.slot_count());
            self.current_round = 1;
            self.current_number = None;
            self.numbers.reset();
        } else {
            self.begin_level();
        }
        self.status
    }

    /// Cells left to right; `None` marks an empty slot.
    #[must_use]
    pub fn board_snapshot(&self) -> Vec<Option<u32>> {
        self.board.snapshot()
    }

    #[must_use]
    pub const fn board(&self) -> &SequenceBoard {
        &self.board
    }

    #[must_use]
    pub fn round_info(&self) -> RoundInfo {
        RoundInfo {
            current_round: self.current_round,
            total_rounds: self.config().rounds,
            current_level: self.progression.level(),
        }
    }

    #[must_use]
    pub fn round_state(&self) -> RoundState {
        RoundState {
            current_round: self.current_round,
            current_number: self.current_number,
            last_generated: self.numbers.last(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub const fn fail_count(&self) -> u32 {
        self.progression.fails()
    }

    /// Number awaiting placement, if any.
    #[must_use]
    pub const fn current_number(&self) -> Option<u32> {
        self.current_number
    }

    /// Draw range of the following round while more rounds remain.
    #[must_use]
    pub fn next_number_range(&self) -> Option<RangeInclusive<u32>> {
        (self.status == GameStatus::InProgress && self.current_round < self.config().rounds)
            .then(|| NumberGenerator::range_for(self.current_round.saturating_add(1)))
    }

    /// Share of the level table already cleared, `0.0..=100.0`.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.progression.progress_percent()
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.progression.level()
    }

    #[must_use]
    pub const fn progression(&self) -> &LevelProgression<S> {
        &self.progression
    }

    #[must_use]
    pub const fn number_source(&self) -> &N {
        &self.numbers
    }

    #[must_use]
    pub const fn listener(&self) -> &L {
        &self.listener
    }

    pub const fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Consume the session, returning storage and listener.
    #[must_use]
    pub fn into_parts(self) -> (S, L) {
        (self.progression.into_storage(), self.listener)
    }

    const fn config(&self) -> LevelConfig {
        self.progression.active_config()
    }

    const fn pending_number(&self) -> Option<u32> {
        match self.status {
            GameStatus::InProgress => self.current_number,
            _ => None,
        }
    }

    fn begin_level(&mut self) {
        let cfg = self.config();
        self.board.reset(cfg.slot_count());
        self.numbers.reset();
        self.current_round = 1;
        self.current_number = None;
        self.status = GameStatus::InProgress;
        log::debug!(
            "level {} started: {} slots, {} rounds",
            self.progression.level(),
            cfg.slots,
            cfg.rounds
        );
        self.deal_number();
    }

    fn deal_number(&mut self) {
        if self.current_round > self.config().rounds {
            return;
        }
        let value = self.numbers.next_number(self.current_round);
        self.current_number = Some(value);
        self.emit(GameEvent::NumberReady {
            value,
            round: self.current_round,
        });
        self.trace_board();

        if !self.board.has_valid_placement(value) {
            self.lose(LossReason::ImpossibleMove);
        }
    }

    fn lose(&mut self, reason: LossReason) {
        self.status = GameStatus::Lost(reason);
        self.current_number = None;
        let fails = self.progression.record_failure();
        log::debug!(
            "level {} lost in round {}: {}, fails now {fails}",
            self.progression.level(),
            self.current_round,
            reason.label()
        );
        self.emit(GameEvent::Lost { reason });
    }

    fn emit(&mut self, event: GameEvent) {
        self.listener.on_event(&event);
    }

    fn trace_board(&self) {
        if debug_log_enabled() {
            let cells: Vec<String> = self
                .board
                .cells()
                .iter()
                .map(|cell| cell.map_or_else(|| "_".to_string(), |v| v.to_string()))
                .collect();
            println!(
                "Level {} round {}/{}: place {:?} into [{}]",
                self.progression.level(),
                self.current_round,
                self.config().rounds,
                self.current_number,
                cells.join(", ")
            );
        }
    }
}
