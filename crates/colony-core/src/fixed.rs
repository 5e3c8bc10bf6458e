use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization and edge inputs
/// (data files, the solar sine), never for accumulating state.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Round to the nearest integer, with halves rounding toward +infinity
/// (`-0.5` becomes `0`, `2.5` becomes `3`).
#[inline]
pub fn round_half_up(v: Fixed64) -> Fixed64 {
    v.saturating_add(Fixed64::from_num(0.5)).floor()
}

/// `floor(v / 2)`, used for demolition refunds.
#[inline]
pub fn half_floor(v: Fixed64) -> Fixed64 {
    (v / Fixed64::from_num(2)).floor()
}

/// `numerator / denominator` as a fraction clamped to `[0, 1]`.
/// A zero denominator counts as complete.
#[inline]
pub fn fraction(numerator: Ticks, denominator: Ticks) -> Fixed64 {
    if denominator == 0 || numerator >= denominator {
        return Fixed64::from_num(1);
    }
    Fixed64::from_num(numerator) / Fixed64::from_num(denominator)
}
