//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit `value` to the closed range `[min, max]`.
///
/// Unlike `f64::clamp` this does not panic when `min > max`, in that case `max` wins. NaN values
/// are passed through unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret < min {
        ret = min
    }
    if ret > max {
        ret = max
    }

    ret
}

/// Limit `value` to the symmetric range `[-limit, limit]`.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float,
{
    let limit = limit.abs();
    clamp(value, -limit, limit)
}

/// Return `true` if `a` and `b` differ by no more than `eps`.
pub fn approx_eq<T>(a: T, b: T, eps: T) -> bool
where
    T: Float,
{
    (a - b).abs() <= eps
}
