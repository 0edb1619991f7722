//! Round-relative number generation with an anti-repeat rule.

use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::constants::{RANGE_FLOOR, RANGE_PER_ROUND, STREAM_NUMBERS};
use crate::seed::derive_stream_seed;

/// Source of the numbers a session asks the player to place.
pub trait NumberSource {
    /// Number to place in `round`.
    fn next_number(&mut self, round: u32) -> u32;

    /// Most recent value handed out since the last reset.
    fn last(&self) -> Option<u32>;

    /// Forget history; called whenever a level starts or restarts.
    fn reset(&mut self);
}

/// Produces the number the player must place next.
///
/// Round `r` draws uniformly from `1..=2r`. A draw never equals the previous
/// one unless the range holds a single value.
#[derive(Debug, Clone)]
pub struct NumberGenerator {
    rng: ChaCha20Rng,
    last: Option<u32>,
    draws: u64,
}

impl NumberGenerator {
    /// Build a generator seeded directly with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            last: None,
            draws: 0,
        }
    }

    /// Build a generator on the number stream derived from a session seed.
    #[must_use]
    pub fn from_session_seed(seed: u64) -> Self {
        Self::new(derive_stream_seed(seed, STREAM_NUMBERS))
    }

    /// Inclusive draw range for `round`. Round 0 is treated as round 1.
    #[must_use]
    pub const fn range_for(round: u32) -> RangeInclusive<u32> {
        let round = if round == 0 { 1 } else { round };
        let upper = round.saturating_mul(RANGE_PER_ROUND);
        let upper = if upper < RANGE_FLOOR { RANGE_FLOOR } else { upper };
        RANGE_FLOOR..=upper
    }

    /// Draw the number for `round`, rerolling repeats of the previous draw.
    pub fn next_number(&mut self, round: u32) -> u32 {
        let range = Self::range_for(round);
        let single_value = range.end() <= range.start();
        loop {
            let value = self.rng.gen_range(range.clone());
            self.draws = self.draws.saturating_add(1);
            if single_value || self.last != Some(value) {
                self.last = Some(value);
                return value;
            }
        }
    }

    /// Most recent value handed out, if any since the last reset.
    #[must_use]
    pub const fn last(&self) -> Option<u32> {
        self.last
    }

    /// Forget the previous draw; called whenever a level starts or restarts.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Raw draws performed, rerolls included.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl NumberSource for NumberGenerator {
    fn next_number(&mut self, round: u32) -> u32 {
        Self::next_number(self, round)
    }

    fn last(&self) -> Option<u32> {
        Self::last(self)
    }

    fn reset(&mut self) {
        Self::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_one_draws_only_one_or_two() {
        let mut generator = NumberGenerator::new(7);
        for _ in 0..200 {
            let value = generator.next_number(1);
            assert!((1..=2).contains(&value), "got {value}");
        }
    }

    #[test]
    fn draws_stay_within_round_range() {
        let mut generator = NumberGenerator::new(99);
        for round in 1..=17 {
            for _ in 0..50 {
                let value = generator.next_number(round);
                assert!(value >= 1 && value <= 2 * round, "round {round} drew {value}");
            }
        }
    }

    #[test]
    fn consecutive_draws_never_repeat() {
        let mut generator = NumberGenerator::new(1234);
        let mut previous = None;
        for i in 0..500 {
            let round = (i % 6) + 1;
            let value = generator.next_number(round);
            assert_ne!(Some(value), previous);
            previous = Some(value);
        }
    }

    #[test]
    fn round_one_alternates_between_its_two_values() {
        let mut generator = NumberGenerator::new(5);
        let first = generator.next_number(1);
        let second = generator.next_number(1);
        assert_eq!(first + second, 3);
    }

    #[test]
    fn reset_clears_last_value() {
        let mut generator = NumberGenerator::new(11);
        generator.next_number(3);
        assert!(generator.last().is_some());
        generator.reset();
        assert_eq!(generator.last(), None);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = NumberGenerator::from_session_seed(2024);
        let mut b = NumberGenerator::from_session_seed(2024);
        for round in 1..=10 {
            assert_eq!(a.next_number(round), b.next_number(round));
        }
        assert_eq!(a.draws(), b.draws());
        assert!(a.draws() >= 10);
    }

    #[test]
    fn range_for_clamps_round_zero() {
        assert_eq!(NumberGenerator::range_for(0), 1..=2);
        assert_eq!(NumberGenerator::range_for(4), 1..=8);
    }
}
