//! Time parameterization of joint-space paths.
//!
//! [`retime`] runs the whole pipeline: optional corner smoothing, segment
//! geometry, reversal detection, conversion of joint limits into path limits,
//! the node speed solver and finally per-segment timing. The result is an
//! immutable [`RetimedTrajectory`] that can be sampled at any time.

pub mod geometry;
pub mod limits;
pub mod reversal;
pub mod smoothing;
pub mod solver;
pub mod timing;

pub use geometry::Segment;
pub use limits::{JointLimits, SegmentCaps};
pub use reversal::Reversals;
pub use smoothing::{CornerSmoother, FixedRadiusSmoothing, NoSmoothing, SmoothingPolicy};
pub use solver::SolverSettings;

use tracing::{debug, info, warn};

use crate::{
    config::RetimeOptions,
    error::RetimeError,
    math::JointVector,
    trajectories::{retimed::SolverReport, RetimedTrajectory},
};

use solver::ProfileProblem;

/// Builds the trajectory following `waypoints` as fast as `limits` allow.
pub fn retime(
    waypoints: &[JointVector],
    limits: &JointLimits,
    options: &RetimeOptions,
) -> Result<RetimedTrajectory, RetimeError> {
    let smoother = options.smoothing.smoother()?;
    retime_with(smoother.as_ref(), waypoints, limits, options)
}

/// Same as [`retime`] with a caller supplied smoothing strategy. The smoothing
/// policy stored in `options` is ignored.
pub fn retime_with(
    smoother: &dyn CornerSmoother,
    waypoints: &[JointVector],
    limits: &JointLimits,
    options: &RetimeOptions,
) -> Result<RetimedTrajectory, RetimeError> {
    options.validate()?;
    let n_joints = geometry::validate_waypoints(waypoints)?;
    limits.check_joint_count(n_joints)?;

    let waypoints = smoother.smooth(waypoints);
    if waypoints.len() < 2 {
        debug!("single waypoint path, nothing to retime");
    }
    let segments = geometry::build_segments(&waypoints)?;
    limits.validate_for(&segments)?;

    let reversals = reversal::detect_reversals(&segments);
    debug!(
        waypoints = waypoints.len(),
        global = reversals.global.len(),
        per_joint = reversals.per_joint.len(),
        zero_nodes = reversals.zero_nodes.len(),
        "detected reversals"
    );

    let caps = limits::segment_caps(&segments, limits);
    let node_caps = match options.corner_velocity_jump {
        Some(jump) => limits::corner_caps(&segments, jump),
        None => vec![f64::INFINITY; waypoints.len()],
    };

    let problem = ProfileProblem {
        segments: &segments,
        caps: &caps,
        node_caps: &node_caps,
        reversals: &reversals,
    };
    let profile = solver::solve(&problem, &options.solver)?;
    if !profile.converged {
        if !options.solver.allow_unconverged {
            return Err(RetimeError::NotConverged {
                iterations: profile.iterations,
                residual: profile.residual,
            });
        }
        warn!(
            iterations = profile.iterations,
            residual = profile.residual,
            "velocity profile did not converge, using last iterate"
        );
    }

    let profiles = timing::time_segments(&segments, &caps, &profile.node_speeds);
    let report = SolverReport {
        iterations: profile.iterations,
        residual: profile.residual,
        converged: profile.converged,
    };
    let trajectory = RetimedTrajectory::new(
        waypoints,
        segments,
        caps,
        profiles,
        profile.node_speeds,
        reversals,
        report,
    );
    info!(
        total_duration = trajectory.total_duration(),
        segments = trajectory.segment_count(),
        "retimed path"
    );

    match options.sample_interval {
        Some(dt) => trajectory.with_samples(dt),
        None => Ok(trajectory),
    }
}
