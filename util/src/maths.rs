//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the inclusive range `[min, max]`.
///
/// Returns the clamped value and whether clamping took place.
pub fn clamp<T>(value: T, min: T, max: T) -> (T, bool)
where
    T: Float
{
    if value > max {
        (max, true)
    }
    else if value < min {
        (min, true)
    }
    else {
        (value, false)
    }
}

/// Move `current` towards `target` by no more than `max_step`.
///
/// Returns the new value and whether the step was limited. A non-positive
/// `max_step` leaves `current` unchanged.
pub fn step_towards<T>(current: T, target: T, max_step: T) -> (T, bool)
where
    T: Float
{
    let zero = T::zero();

    if max_step <= zero {
        return (current, current != target)
    }

    let (step, limited) = clamp(target - current, -max_step, max_step);

    if limited {
        (current + step, true)
    }
    else {
        (target, false)
    }
}

/// Returns true if `a` and `b` are no further apart than `tolerance`.
pub fn within_tolerance<T>(a: T, b: T, tolerance: T) -> bool
where
    T: Float
{
    (a - b).abs() <= tolerance
}
