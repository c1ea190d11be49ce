//! Node speed solver.
//!
//! Segment caps and zero nodes interact non-locally: a stop several segments
//! ahead limits how fast we may go now. The solver alternates forward passes
//! (how fast can we be here given where we come from) and backward passes (how
//! fast can we be here and still brake for what comes next) until no node speed
//! moves by more than the tolerance.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{geometry::Segment, limits::SegmentCaps, reversal::Reversals};
use crate::error::RetimeError;

pub const DEFAULT_MAX_ITERATIONS: usize = 500;
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SolverSettings {
    /// hard cap on forward/backward passes
    pub max_iterations: usize,
    /// largest node speed change still counted as converged
    pub tolerance: f64,
    /// return the last iterate with a warning instead of failing when the cap is hit
    pub allow_unconverged: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            allow_unconverged: false,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), RetimeError> {
        if self.max_iterations == 0 {
            return Err(RetimeError::InvalidSolverSettings(
                "at least one pass is required".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.) {
            return Err(RetimeError::InvalidSolverSettings(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VelocityProfile {
    pub node_speeds: Vec<f64>,
    pub iterations: usize,
    /// largest node speed change during the last pass
    pub residual: f64,
    pub converged: bool,
}

/// Everything the solver needs to know about the path.
pub struct ProfileProblem<'a> {
    pub segments: &'a [Segment],
    pub caps: &'a [SegmentCaps],
    /// per-node speed bounds on top of the segment caps
    pub node_caps: &'a [f64],
    pub reversals: &'a Reversals,
}

impl ProfileProblem<'_> {
    fn n_nodes(&self) -> usize {
        self.segments.len() + 1
    }

    /// tightest of the caps touching `node`
    fn node_limit(&self, node: usize) -> f64 {
        let before = node.checked_sub(1).map(|i| self.caps[i].speed);
        let after = self.caps.get(node).map(|c| c.speed);
        [before, after, Some(self.node_caps[node])]
            .into_iter()
            .flatten()
            .fold(f64::INFINITY, f64::min)
    }

    fn clamp_to_caps(&self, speeds: &mut [f64]) {
        let last = speeds.len() - 1;
        for node in 1..last {
            speeds[node] = speeds[node].min(self.node_limit(node));
        }
        self.force_zero_nodes(speeds);
    }

    fn force_zero_nodes(&self, speeds: &mut [f64]) {
        for &node in &self.reversals.zero_nodes {
            speeds[node] = 0.;
        }
    }

    /// Fastest speed at the far end of `segment` when entering it at `speed`.
    /// Zero-length segments pass the speed through unchanged. Limits are
    /// validated before solving, so `v² + 2aL` is never negative here.
    fn reachable_speed(&self, segment: usize, speed: f64) -> f64 {
        let length = self.segments[segment].length;
        if length <= 0. {
            return speed;
        }
        let caps = self.caps[segment];
        (speed * speed + 2. * caps.acceleration * length)
            .sqrt()
            .min(caps.speed)
    }

    fn forward_pass(&self, speeds: &mut [f64]) {
        for segment in 0..self.segments.len() {
            let next = segment + 1;
            if self.reversals.is_zero_node(next) {
                continue;
            }
            let reachable = self.reachable_speed(segment, speeds[segment]);
            speeds[next] = speeds[next].min(reachable);
        }
    }

    fn backward_pass(&self, speeds: &mut [f64]) {
        for segment in (0..self.segments.len()).rev() {
            if self.reversals.is_zero_node(segment) {
                continue;
            }
            let reachable = self.reachable_speed(segment, speeds[segment + 1]);
            speeds[segment] = speeds[segment].min(reachable);
        }
    }
}

/// change between two iterates, treating equal infinities as no change
fn residual(previous: &[f64], current: &[f64]) -> f64 {
    previous
        .iter()
        .zip(current)
        .map(|(a, b)| if a == b { 0. } else { (a - b).abs() })
        .fold(0., f64::max)
}

pub fn solve(
    problem: &ProfileProblem<'_>,
    settings: &SolverSettings,
) -> Result<VelocityProfile, RetimeError> {
    settings.validate()?;

    let n_nodes = problem.n_nodes();
    let mut speeds: Vec<f64> = (0..n_nodes).map(|node| problem.node_limit(node)).collect();
    problem.force_zero_nodes(&mut speeds);

    let mut residual_now = f64::INFINITY;
    for iteration in 1..=settings.max_iterations {
        let previous = speeds.clone();

        problem.clamp_to_caps(&mut speeds);
        problem.forward_pass(&mut speeds);
        problem.backward_pass(&mut speeds);
        problem.force_zero_nodes(&mut speeds);

        residual_now = residual(&previous, &speeds);
        trace!(iteration, residual = residual_now, "velocity profile pass");
        if residual_now < settings.tolerance {
            debug!(iterations = iteration, "velocity profile converged");
            return Ok(VelocityProfile {
                node_speeds: speeds,
                iterations: iteration,
                residual: residual_now,
                converged: true,
            });
        }
    }

    Ok(VelocityProfile {
        node_speeds: speeds,
        iterations: settings.max_iterations,
        residual: residual_now,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::JointVector,
        retiming::{
            geometry::build_segments,
            limits::{segment_caps, JointLimits},
            reversal::detect_reversals,
        },
    };
    use approx::assert_abs_diff_eq;

    fn solve_path(path: &[f64], limits: JointLimits, settings: SolverSettings) -> VelocityProfile {
        let waypoints: Vec<JointVector> = path.iter().map(|p| JointVector::from([*p])).collect();
        let segments = build_segments(&waypoints).unwrap();
        let caps = segment_caps(&segments, &limits);
        let reversals = detect_reversals(&segments);
        let node_caps = vec![f64::INFINITY; waypoints.len()];
        let problem = ProfileProblem {
            segments: &segments,
            caps: &caps,
            node_caps: &node_caps,
            reversals: &reversals,
        };
        solve(&problem, &settings).unwrap()
    }

    #[test]
    fn endpoints_and_reversals_stay_at_zero() {
        let profile = solve_path(
            &[0., 5., 10., 3.],
            JointLimits::uniform(1, 1., 1.),
            SolverSettings::default(),
        );
        assert!(profile.converged);
        assert_eq!(profile.node_speeds[0], 0.);
        assert_eq!(profile.node_speeds[2], 0.);
        assert_eq!(profile.node_speeds[3], 0.);
        assert_abs_diff_eq!(profile.node_speeds[1], 1.);
    }

    #[test]
    fn speeds_respect_acceleration_reachability() {
        // two short segments, cruise speed cannot be reached
        let profile = solve_path(
            &[0., 0.1, 0.2],
            JointLimits::uniform(1, 10., 1.),
            SolverSettings::default(),
        );
        assert_abs_diff_eq!(profile.node_speeds[1], (2. * 0.1_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn reachable_speed_never_drops_below_entry() {
        let waypoints = [JointVector::from([0.]), JointVector::from([0.1])];
        let segments = build_segments(&waypoints).unwrap();
        let caps = segment_caps(&segments, &JointLimits::uniform(1, 10., 1.));
        let reversals = detect_reversals(&segments);
        let node_caps = [f64::INFINITY; 2];
        let problem = ProfileProblem {
            segments: &segments,
            caps: &caps,
            node_caps: &node_caps,
            reversals: &reversals,
        };

        assert_abs_diff_eq!(problem.reachable_speed(0, 0.), 0.2_f64.sqrt(), epsilon = 1e-12);
        assert!(problem.reachable_speed(0, 3.) >= 3.);
        assert_eq!(problem.reachable_speed(0, 20.), 10.);
        assert_eq!(problem.reachable_speed(0, f64::INFINITY), 10.);
    }

    #[test]
    fn zero_length_segments_pass_speed_through() {
        let profile = solve_path(
            &[0., 1., 1., 2.],
            JointLimits::uniform(1, 1., 1.),
            SolverSettings::default(),
        );
        assert_eq!(profile.node_speeds[1], profile.node_speeds[2]);
        assert!(profile.node_speeds.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn iteration_cap_is_reported() {
        let profile = solve_path(
            &[0., 0.1, 0.2],
            JointLimits::uniform(1, 10., 1.),
            SolverSettings {
                max_iterations: 1,
                ..Default::default()
            },
        );
        // the first pass pulls the middle node from its cap down to what is reachable
        assert!(!profile.converged);
        assert_eq!(profile.iterations, 1);
    }

    #[test]
    fn solver_is_deterministic() {
        let path = [0., 0.3, 1.7, 1.2, 4., 4.1, 2.];
        let limits = JointLimits::uniform(1, 0.7, 0.4);
        let a = solve_path(&path, limits.clone(), SolverSettings::default());
        let b = solve_path(&path, limits, SolverSettings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad = SolverSettings {
            tolerance: 0.,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = SolverSettings {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
