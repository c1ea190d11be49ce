//! Projection of per-joint limits onto the 1-D path speed and acceleration.

use serde::{Deserialize, Serialize};

use super::geometry::{node_directions, Segment};
use crate::{
    error::{LimitKind, RetimeError},
    math::{min_or_infinity, NEGLIGIBLE_COMPONENT},
};

/// Per-joint kinematic limits, in joint units per second (squared).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JointLimits {
    pub max_speed: Vec<f64>,
    pub max_acceleration: Vec<f64>,
}

impl JointLimits {
    pub fn new(max_speed: impl Into<Vec<f64>>, max_acceleration: impl Into<Vec<f64>>) -> Self {
        Self {
            max_speed: max_speed.into(),
            max_acceleration: max_acceleration.into(),
        }
    }

    /// same limits on every joint
    pub fn uniform(n_joints: usize, max_speed: f64, max_acceleration: f64) -> Self {
        Self::new(vec![max_speed; n_joints], vec![max_acceleration; n_joints])
    }

    pub fn check_joint_count(&self, n_joints: usize) -> Result<(), RetimeError> {
        if self.max_speed.len() != n_joints || self.max_acceleration.len() != n_joints {
            return Err(RetimeError::LimitsMismatch {
                joints: n_joints,
                speeds: self.max_speed.len(),
                accelerations: self.max_acceleration.len(),
            });
        }
        Ok(())
    }

    /// Every joint that moves somewhere along the path needs finite, strictly
    /// positive limits. Joints that never move are not checked.
    pub fn validate_for(&self, segments: &[Segment]) -> Result<(), RetimeError> {
        for (i, segment) in segments.iter().enumerate() {
            for joint in (0..segment.direction.len()).filter(|j| segment.moves_joint(*j)) {
                for (kind, value) in [
                    (LimitKind::Speed, self.max_speed[joint]),
                    (LimitKind::Acceleration, self.max_acceleration[joint]),
                ] {
                    if !(value.is_finite() && value > 0.) {
                        return Err(RetimeError::InvalidLimit {
                            joint,
                            segment: i,
                            kind,
                            value,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Path speed and path acceleration bounds of one segment.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SegmentCaps {
    pub speed: f64,
    pub acceleration: f64,
}

impl SegmentCaps {
    /// caps of a segment along which no joint moves
    pub const UNBOUNDED: SegmentCaps = SegmentCaps {
        speed: f64::INFINITY,
        acceleration: f64::INFINITY,
    };
}

/// The tightest `limit_j / |u_j|` over the joints moving along each segment.
pub fn segment_caps(segments: &[Segment], limits: &JointLimits) -> Vec<SegmentCaps> {
    segments
        .iter()
        .map(|segment| {
            if segment.is_degenerate() {
                return SegmentCaps::UNBOUNDED;
            }
            let moving = segment
                .direction
                .iter()
                .enumerate()
                .filter(|(_, u)| u.abs() > NEGLIGIBLE_COMPONENT)
                .map(|(j, u)| (j, u.abs()));
            let (speeds, accels): (Vec<f64>, Vec<f64>) = moving
                .map(|(j, u)| (limits.max_speed[j] / u, limits.max_acceleration[j] / u))
                .unzip();
            SegmentCaps {
                speed: min_or_infinity(speeds),
                acceleration: min_or_infinity(accels),
            }
        })
        .collect()
}

/// Node speed caps keeping every joint's instantaneous velocity jump across a
/// corner at or below `max_jump`. Nodes without a corner are unbounded.
pub fn corner_caps(segments: &[Segment], max_jump: f64) -> Vec<f64> {
    node_directions(segments)
        .into_iter()
        .map(|dirs| match (dirs.incoming, dirs.outgoing) {
            (Some(incoming), Some(outgoing)) => {
                let turn = incoming.max_abs_diff(outgoing);
                if turn > NEGLIGIBLE_COMPONENT {
                    max_jump / turn
                } else {
                    f64::INFINITY
                }
            }
            _ => f64::INFINITY,
        })
        .collect()
}
