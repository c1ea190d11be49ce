//! The immutable output of [`crate::retiming::retime`].

use std::{cmp::Ordering, collections::BTreeSet};

use serde::Serialize;

use super::Trajectory;
use crate::{
    error::RetimeError,
    math::JointVector,
    retiming::{
        timing::{self, SegmentProfile},
        Reversals, Segment, SegmentCaps,
    },
};

/// upper bound on the number of samples a single call may produce
pub const MAX_SAMPLES: usize = 10_000_000;

/// Joint state at one instant.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub t: f64,
    pub position: JointVector,
    pub velocity: JointVector,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SolverReport {
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
}

/// Everything an external plotter needs to show how a path was retimed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RetimeDiagnostics {
    pub per_joint_flip_nodes: Vec<usize>,
    pub global_reversal_nodes: Vec<usize>,
    pub zero_nodes: Vec<usize>,
    pub node_speeds: Vec<f64>,
    pub node_times: Vec<f64>,
    pub segment_durations: Vec<f64>,
    pub total_duration: f64,
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
}

/// A joint-space path with its time law.
///
/// Built once by [`crate::retiming::retime`] and never mutated afterwards, so a
/// single instance can be shared (e.g. through an `Arc`) between a control loop
/// and a visualization without any locking.
#[derive(Debug, Clone)]
pub struct RetimedTrajectory {
    waypoints: Vec<JointVector>,
    segments: Vec<Segment>,
    caps: Vec<SegmentCaps>,
    profiles: Vec<SegmentProfile>,
    node_speeds: Vec<f64>,
    node_times: Vec<f64>,
    reversals: Reversals,
    solver: SolverReport,
    total_duration: f64,
    samples: Option<Vec<TrajectorySample>>,
}

impl RetimedTrajectory {
    pub(crate) fn new(
        waypoints: Vec<JointVector>,
        segments: Vec<Segment>,
        caps: Vec<SegmentCaps>,
        profiles: Vec<SegmentProfile>,
        node_speeds: Vec<f64>,
        reversals: Reversals,
        solver: SolverReport,
    ) -> Self {
        let node_times = timing::node_times(&profiles);
        let total_duration = node_times.last().copied().unwrap_or(0.);
        Self {
            waypoints,
            segments,
            caps,
            profiles,
            node_speeds,
            node_times,
            reversals,
            solver,
            total_duration,
            samples: None,
        }
    }

    /// Precomputes samples every `dt` seconds, see [`RetimedTrajectory::sample`].
    pub fn with_samples(mut self, dt: f64) -> Result<Self, RetimeError> {
        self.samples = Some(self.sample(dt)?);
        Ok(self)
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn joint_count(&self) -> usize {
        self.waypoints.first().map(JointVector::len).unwrap_or(0)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// waypoints actually followed, after smoothing
    pub fn waypoints(&self) -> &[JointVector] {
        &self.waypoints
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_caps(&self) -> &[SegmentCaps] {
        &self.caps
    }

    pub fn segment_profiles(&self) -> &[SegmentProfile] {
        &self.profiles
    }

    pub fn segment_durations(&self) -> Vec<f64> {
        self.profiles.iter().map(SegmentProfile::duration).collect()
    }

    pub fn node_speeds(&self) -> &[f64] {
        &self.node_speeds
    }

    /// time at which each node is reached
    pub fn node_times(&self) -> &[f64] {
        &self.node_times
    }

    pub fn zero_nodes(&self) -> &BTreeSet<usize> {
        &self.reversals.zero_nodes
    }

    pub fn reversals(&self) -> &Reversals {
        &self.reversals
    }

    pub fn solver_report(&self) -> SolverReport {
        self.solver
    }

    pub fn dense_samples(&self) -> Option<&[TrajectorySample]> {
        self.samples.as_deref()
    }

    /// Segment owning time `t` and the time elapsed since it started.
    /// `None` past the end of the trajectory or when there is no segment.
    fn locate(&self, t: f64) -> Option<(usize, f64)> {
        if self.segments.is_empty() || t >= self.total_duration {
            return None;
        }
        let t = t.max(0.);
        let idx = self
            .node_times
            .partition_point(|&node_time| node_time <= t)
            .saturating_sub(1)
            .min(self.segments.len() - 1);
        Some((idx, t - self.node_times[idx]))
    }

    fn final_waypoint(&self) -> JointVector {
        self.waypoints.last().cloned().unwrap_or_default()
    }

    pub fn position(&self, t: f64) -> JointVector {
        match self.locate(t) {
            Some((i, tau)) => {
                &self.waypoints[i] + &(&self.segments[i].direction * self.profiles[i].offset_at(tau))
            }
            None => self.final_waypoint(),
        }
    }

    pub fn velocity(&self, t: f64) -> JointVector {
        match self.locate(t) {
            Some((i, tau)) => &self.segments[i].direction * self.profiles[i].speed_at(tau),
            None => JointVector::zeros(self.joint_count()),
        }
    }

    pub fn acceleration(&self, t: f64) -> JointVector {
        match self.locate(t) {
            Some((i, tau)) => &self.segments[i].direction * self.profiles[i].acceleration_at(tau),
            None => JointVector::zeros(self.joint_count()),
        }
    }

    pub fn sample_at(&self, t: f64) -> TrajectorySample {
        TrajectorySample {
            t,
            position: self.position(t),
            velocity: self.velocity(t),
        }
    }

    /// Samples at `0, dt, 2dt, ...` up to half a step past the end. The last
    /// sample is pinned to the final waypoint with zero velocity.
    pub fn sample(&self, dt: f64) -> Result<Vec<TrajectorySample>, RetimeError> {
        if !(dt.is_finite() && dt > 0.) {
            return Err(RetimeError::InvalidSampleInterval(dt));
        }
        let n_samples = ((self.total_duration + dt / 2.) / dt).ceil().max(1.);
        if n_samples > MAX_SAMPLES as f64 {
            return Err(RetimeError::TooManySamples {
                interval: dt,
                duration: self.total_duration,
                max: MAX_SAMPLES,
            });
        }
        let n_samples = n_samples as usize;
        let mut samples: Vec<TrajectorySample> =
            (0..n_samples).map(|k| self.sample_at(k as f64 * dt)).collect();
        if let Some(last) = samples.last_mut() {
            last.position = self.final_waypoint();
            last.velocity = JointVector::zeros(self.joint_count());
        }
        Ok(samples)
    }

    /// highest absolute speed reached by each joint
    pub fn peak_joint_speeds(&self) -> JointVector {
        let mut peaks = vec![0_f64; self.joint_count()];
        for (segment, profile) in self.segments.iter().zip(&self.profiles) {
            for (peak, u) in peaks.iter_mut().zip(segment.direction.iter()) {
                *peak = (*peak).max(u.abs() * profile.peak_speed());
            }
        }
        JointVector::new(peaks)
    }

    pub fn diagnostics(&self) -> RetimeDiagnostics {
        RetimeDiagnostics {
            per_joint_flip_nodes: self.reversals.per_joint.iter().copied().collect(),
            global_reversal_nodes: self.reversals.global.iter().copied().collect(),
            zero_nodes: self.reversals.zero_nodes.iter().copied().collect(),
            node_speeds: self.node_speeds.clone(),
            node_times: self.node_times.clone(),
            segment_durations: self.segment_durations(),
            total_duration: self.total_duration,
            iterations: self.solver.iterations,
            residual: self.solver.residual,
            converged: self.solver.converged,
        }
    }
}

impl Trajectory<JointVector, JointVector> for RetimedTrajectory {
    fn get_position(&self, t: f64) -> JointVector {
        self.position(t)
    }

    fn get_velocity(&self, t: f64) -> JointVector {
        self.velocity(t)
    }

    fn get_acceleration(&self, t: f64) -> JointVector {
        self.acceleration(t)
    }

    fn get_total_runtime(&self) -> f64 {
        self.total_duration
    }

    fn get_final_destination(&self) -> JointVector {
        self.final_waypoint()
    }

    fn get_max_speed(&self) -> Option<JointVector> {
        self.get_time_sections()
            .map(|t| self.get_velocity(t))
            .max_by(|v1, v2| v1.norm().partial_cmp(&v2.norm()).unwrap_or(Ordering::Equal))
    }

    fn get_time_sections(&self) -> impl Iterator<Item = f64> {
        self.node_times
            .iter()
            .zip(&self.profiles)
            .flat_map(|(start, profile)| profile.phases().iter().map(move |p| start + p.end_time))
    }
}
