//! Slot board holding the player's partial sequence.
//!
//! The board never rejects a placement for breaking order; it reports
//! sortedness and leaves the gameplay consequence to the controller.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::MAX_SLOTS;

/// Cell storage; every configured level fits inline.
pub type Cells = SmallVec<[Option<u32>; MAX_SLOTS]>;

/// Precondition violations raised by [`SequenceBoard::place`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("slot {index} is outside a board of {len} slots")]
    OutOfRange { index: usize, len: usize },
    #[error("slot {index} is already filled")]
    SlotOccupied { index: usize },
}

/// Fixed-length row of slots that are either empty or hold a placed number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceBoard {
    cells: Cells,
}

impl SequenceBoard {
    /// Allocate a board of `slot_count` empty cells.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        let mut board = Self::default();
        board.reset(slot_count);
        board
    }

    /// Build a board from explicit cells.
    #[must_use]
    pub fn from_cells(cells: &[Option<u32>]) -> Self {
        Self {
            cells: cells.iter().copied().collect(),
        }
    }

    /// Drop all contents and allocate `slot_count` empty cells.
    pub fn reset(&mut self, slot_count: usize) {
        self.cells.clear();
        self.cells.resize(slot_count, None);
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a board with no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value at `index`, `None` when empty or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.cells.get(index).copied().flatten()
    }

    /// True when `index` is in range and unfilled.
    #[must_use]
    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    /// Check that `index` can receive a value without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] or [`BoardError::SlotOccupied`].
    pub fn check_slot(&self, index: usize) -> Result<(), BoardError> {
        match self.cells.get(index) {
            None => Err(BoardError::OutOfRange {
                index,
                len: self.cells.len(),
            }),
            Some(Some(_)) => Err(BoardError::SlotOccupied { index }),
            Some(None) => Ok(()),
        }
    }

    /// Write `value` into the empty cell at `index` and report sortedness.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] for an index past the end and
    /// [`BoardError::SlotOccupied`] for a filled cell. Neither mutates the board.
    pub fn place(&mut self, index: usize, value: u32) -> Result<bool, BoardError> {
        self.check_slot(index)?;
        self.cells[index] = Some(value);
        Ok(self.is_sorted())
    }

    /// True iff every adjacent pair of filled cells satisfies left <= right.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        cells_sorted(&self.cells)
    }

    /// True iff some empty cell accepts `value` while keeping the board sorted.
    #[must_use]
    pub fn has_valid_placement(&self, value: u32) -> bool {
        self.empty_indices()
            .any(|index| self.accepts_at(index, value))
    }

    /// Every empty index that accepts `value` while keeping the board sorted.
    #[must_use]
    pub fn valid_indices(&self, value: u32) -> Vec<usize> {
        self.empty_indices()
            .filter(|&index| self.accepts_at(index, value))
            .collect()
    }

    /// True when no empty cells remain.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Count of filled cells.
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Borrow the raw cells.
    #[must_use]
    pub fn cells(&self) -> &[Option<u32>] {
        &self.cells
    }

    /// Owned copy of the cells, left to right.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Option<u32>> {
        self.cells.to_vec()
    }

    fn empty_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.is_none().then_some(index))
    }

    // Trial insertion on a scratch copy.
    fn accepts_at(&self, index: usize, value: u32) -> bool {
        let mut trial = self.cells.clone();
        trial[index] = Some(value);
        cells_sorted(&trial)
    }
}

fn cells_sorted(cells: &[Option<u32>]) -> bool {
    let mut previous: Option<u32> = None;
    for &value in cells.iter().flatten() {
        if let Some(prev) = previous
            && prev > value
        {
            return false;
        }
        previous = Some(value);
    }
    true
}
