//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 half-to-even and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_even_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.round_ties_even().clamp(min, max);
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Round a f32 half-to-even through f64 precision.
#[must_use]
pub fn round_even_f32_to_i64(value: f32) -> i64 {
    round_even_f64_to_i64(f64::from(value))
}

/// Convert a slice index or count to f32 for angle math.
#[must_use]
pub fn usize_to_f32(value: usize) -> f32 {
    cast::<usize, f32>(value).unwrap_or(0.0)
}

/// Convert a non-negative i64 into an index, returning 0 for negative input.
#[must_use]
pub fn i64_to_usize(value: i64) -> usize {
    cast::<i64, usize>(value).unwrap_or(0)
}

/// Convert a whole-degree count to f32.
#[must_use]
pub fn u32_to_f32(value: u32) -> f32 {
    cast::<u32, f32>(value).unwrap_or(0.0)
}
