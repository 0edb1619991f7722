use ascend_game::SequenceBoard;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn random_cells(rng: &mut ChaCha20Rng, len: usize, max_value: u32) -> Vec<Option<u32>> {
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.55) {
                Some(rng.gen_range(1..=max_value))
            } else {
                None
            }
        })
        .collect()
}

// Sorted filled cells, built left to right.
fn random_sorted_cells(rng: &mut ChaCha20Rng, len: usize) -> Vec<Option<u32>> {
    let mut floor = 1;
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.5) {
                floor += rng.gen_range(0..=3);
                Some(floor)
            } else {
                None
            }
        })
        .collect()
}

fn adjacent_pairs_ordered(cells: &[Option<u32>]) -> bool {
    let filled: Vec<u32> = cells.iter().flatten().copied().collect();
    filled.windows(2).all(|pair| pair[0] <= pair[1])
}

// Neighbour-bound oracle: on a sorted board `value` fits at an empty index
// iff it is no smaller than the nearest filled cell to the left and no larger
// than the nearest filled cell to the right.
fn oracle_has_placement(cells: &[Option<u32>], value: u32) -> bool {
    if !adjacent_pairs_ordered(cells) {
        return false;
    }
    (0..cells.len()).filter(|&i| cells[i].is_none()).any(|i| {
        let left = cells[..i].iter().rev().flatten().next();
        let right = cells[i + 1..].iter().flatten().next();
        left.is_none_or(|&l| l <= value) && right.is_none_or(|&r| value <= r)
    })
}

#[test]
fn sortedness_matches_adjacent_pair_rule() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
    for _ in 0..2_000 {
        let len = rng.gen_range(0..=18);
        let cells = random_cells(&mut rng, len, 12);
        let board = SequenceBoard::from_cells(&cells);
        assert_eq!(
            board.is_sorted(),
            adjacent_pairs_ordered(&cells),
            "cells {cells:?}"
        );
    }
}

#[test]
fn placement_check_matches_oracle_on_sorted_boards() {
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    for _ in 0..2_000 {
        let len = rng.gen_range(1..=10);
        let cells = random_sorted_cells(&mut rng, len);
        let board = SequenceBoard::from_cells(&cells);
        assert!(board.is_sorted());
        for value in 1..=20 {
            assert_eq!(
                board.has_valid_placement(value),
                oracle_has_placement(&cells, value),
                "cells {cells:?} value {value}"
            );
        }
    }
}

#[test]
fn placement_check_matches_oracle_on_arbitrary_boards() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    for _ in 0..2_000 {
        let len = rng.gen_range(1..=10);
        let cells = random_cells(&mut rng, len, 8);
        let board = SequenceBoard::from_cells(&cells);
        for value in 1..=9 {
            assert_eq!(
                board.has_valid_placement(value),
                oracle_has_placement(&cells, value),
                "cells {cells:?} value {value}"
            );
        }
    }
}

#[test]
fn every_valid_index_keeps_board_sorted() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    for _ in 0..500 {
        let len = rng.gen_range(1..=18);
        let cells = random_sorted_cells(&mut rng, len);
        let value = rng.gen_range(1..=30);
        let board = SequenceBoard::from_cells(&cells);
        let valid = board.valid_indices(value);
        assert_eq!(valid.is_empty(), !board.has_valid_placement(value));
        for index in 0..len {
            if !board.is_empty_at(index) {
                continue;
            }
            let mut trial = board.clone();
            let sorted = trial.place(index, value).unwrap();
            assert_eq!(sorted, valid.contains(&index), "cells {cells:?} value {value} index {index}");
        }
    }
}

#[test]
fn failed_place_never_mutates() {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    for _ in 0..500 {
        let len = rng.gen_range(1..=10);
        let cells = random_cells(&mut rng, len, 9);
        let mut board = SequenceBoard::from_cells(&cells);
        let before = board.snapshot();
        let index = rng.gen_range(0..len + 3);
        if board.is_empty_at(index) {
            continue;
        }
        assert!(board.place(index, 1).is_err());
        assert_eq!(board.snapshot(), before);
    }
}
