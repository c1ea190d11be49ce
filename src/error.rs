use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Speed,
    Acceleration,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Speed => write!(f, "speed"),
            LimitKind::Acceleration => write!(f, "acceleration"),
        }
    }
}

/// Everything that can go wrong while turning a joint-space path into a trajectory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetimeError {
    #[error("cannot retime an empty path")]
    EmptyPath,

    #[error("waypoints must have at least one joint")]
    NoJoints,

    #[error("waypoint {index} has {found} joints, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("waypoint {index} has a non-finite coordinate on joint {joint}")]
    NonFiniteWaypoint { index: usize, joint: usize },

    #[error(
        "limits give {speeds} max speeds and {accelerations} max accelerations for {joints} joints"
    )]
    LimitsMismatch {
        joints: usize,
        speeds: usize,
        accelerations: usize,
    },

    #[error("joint {joint} moves in segment {segment} but its max {kind} is {value}")]
    InvalidLimit {
        joint: usize,
        segment: usize,
        kind: LimitKind,
        value: f64,
    },

    #[error("invalid smoothing policy: {0}")]
    InvalidSmoothing(String),

    #[error("invalid solver settings: {0}")]
    InvalidSolverSettings(String),

    #[error("sampling interval must be finite and positive, got {0}")]
    InvalidSampleInterval(f64),

    #[error("corner velocity jump must be finite and non-negative, got {0}")]
    InvalidCornerJump(f64),

    #[error("sampling a {duration} s trajectory every {interval} s needs more than {max} samples")]
    TooManySamples {
        interval: f64,
        duration: f64,
        max: usize,
    },

    #[error("a {distance} move at max acceleration {acceleration} needs more than {duration} s")]
    MoveTooShort {
        distance: f64,
        acceleration: f64,
        duration: f64,
    },

    #[error("velocity profile did not converge after {iterations} passes (residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },
}
