pub mod vec;

pub use vec::*;

/// components at or below this magnitude are treated as "joint not moving"
pub const NEGLIGIBLE_COMPONENT: f64 = 1e-12;

/// `min` over an iterator of floats, `f64::INFINITY` when empty
pub fn min_or_infinity(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(f64::INFINITY, f64::min)
}
