//! Waypoint generation from parametric joint-space curves.

use crate::math::JointVector;

/// slack on the last parameter value so `duration` itself is sampled despite rounding
const ENDPOINT_SLACK: f64 = 1e-9;

/// Evaluates `curve` at `0, step, 2 * step, ...` up to and including `duration`.
/// A non-positive or non-finite `step`, or a negative `duration`, only yields
/// the starting point.
pub fn sample_curve(
    curve: impl Fn(f64) -> JointVector,
    duration: f64,
    step: f64,
) -> Vec<JointVector> {
    if !(step.is_finite() && step > 0. && duration.is_finite() && duration > 0.) {
        return vec![curve(0.)];
    }
    let n_steps = ((duration + ENDPOINT_SLACK) / step).floor() as usize;
    (0..=n_steps).map(|k| curve(k as f64 * step)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_included() {
        let points = sample_curve(|t| JointVector::from([t]), 20., 0.1);
        assert_eq!(points.len(), 201);
        assert_eq!(points[0], JointVector::from([0.]));
        assert!((points[200][0] - 20.).abs() < 1e-9);
    }

    #[test]
    fn degenerate_steps_give_the_start() {
        let curve = |t: f64| JointVector::from([t, -t]);
        assert_eq!(sample_curve(curve, 1., 0.), vec![JointVector::from([0., -0.])]);
        assert_eq!(sample_curve(curve, 0., 0.1).len(), 1);
    }
}
