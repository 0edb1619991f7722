//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to f64, returning 0.0 if it cannot be represented.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Widen a `u32` counter to `usize`, saturating at `usize::MAX`.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    cast::<u32, usize>(value).unwrap_or(usize::MAX)
}

/// Percentage of `part` over `whole`, clamped to `0.0..=100.0`.
///
/// Returns 0.0 when `whole` is zero.
#[must_use]
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let ratio = usize_to_f64(part) / usize_to_f64(whole);
    (ratio * 100.0).clamp(0.0, 100.0)
}
