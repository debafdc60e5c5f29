//! Scalar helpers shared by the cue evaluator and the stage models.

/// Linear interpolation: `a + (b - a) * t`. `t` is not clamped.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]: where `value` sits within `[lo, hi]`, as a fraction.
///
/// Not clamped; values outside the window map outside `[0, 1]`.
/// A degenerate window (`lo == hi`) yields 0.
pub fn inverse_lerp(lo: f32, hi: f32, value: f32) -> f32 {
    if lo == hi {
        return 0.0;
    }
    (value - lo) / (hi - lo)
}

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Exponential ease-out over `[0, 1]`: fast start, settles at 1.
pub fn ease_out_expo(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}
