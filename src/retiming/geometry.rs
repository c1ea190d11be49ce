//! Straight-line segments between consecutive waypoints.

use serde::Serialize;

use crate::{
    error::RetimeError,
    math::{JointVector, NEGLIGIBLE_COMPONENT},
};

/// The straight joint-space interval between two consecutive waypoints.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Segment {
    pub displacement: JointVector,
    pub length: f64,
    /// unit direction, the zero vector for zero-length segments
    pub direction: JointVector,
}

impl Segment {
    pub fn between(from: &JointVector, to: &JointVector) -> Self {
        let displacement = to - from;
        let length = displacement.norm();
        let direction = displacement.direction();
        Self {
            displacement,
            length,
            direction,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.length <= 0.
    }

    /// whether joint `joint` has a non-negligible share of this segment's motion
    pub fn moves_joint(&self, joint: usize) -> bool {
        !self.is_degenerate() && self.direction[joint].abs() > NEGLIGIBLE_COMPONENT
    }
}

/// Checks every waypoint has the same, non-zero, number of finite coordinates.
/// Returns that number of joints.
pub fn validate_waypoints(waypoints: &[JointVector]) -> Result<usize, RetimeError> {
    let first = waypoints.first().ok_or(RetimeError::EmptyPath)?;
    let n_joints = first.len();
    if n_joints == 0 {
        return Err(RetimeError::NoJoints);
    }

    for (index, waypoint) in waypoints.iter().enumerate() {
        if waypoint.len() != n_joints {
            return Err(RetimeError::DimensionMismatch {
                index,
                expected: n_joints,
                found: waypoint.len(),
            });
        }
        if let Some(joint) = waypoint.iter().position(|c| !c.is_finite()) {
            return Err(RetimeError::NonFiniteWaypoint { index, joint });
        }
    }
    Ok(n_joints)
}

pub fn build_segments(waypoints: &[JointVector]) -> Result<Vec<Segment>, RetimeError> {
    validate_waypoints(waypoints)?;
    Ok(waypoints
        .windows(2)
        .map(|pair| Segment::between(&pair[0], &pair[1]))
        .collect())
}

/// Directions of motion on either side of a node.
///
/// `incoming` is the direction of the last moving segment ending at or before the
/// node, `outgoing` the first moving segment starting at or after it. Runs of
/// zero-length segments are looked through so that a reversal hidden behind a
/// repeated waypoint still shows up on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDirections<'a> {
    pub incoming: Option<&'a JointVector>,
    pub outgoing: Option<&'a JointVector>,
}

pub fn node_directions(segments: &[Segment]) -> Vec<NodeDirections<'_>> {
    let n_nodes = segments.len() + 1;

    let mut incoming = Vec::with_capacity(n_nodes);
    let mut last = None;
    incoming.push(None);
    for segment in segments {
        if !segment.is_degenerate() {
            last = Some(&segment.direction);
        }
        incoming.push(last);
    }

    let mut outgoing = vec![None; n_nodes];
    let mut next = None;
    for (i, segment) in segments.iter().enumerate().rev() {
        if !segment.is_degenerate() {
            next = Some(&segment.direction);
        }
        outgoing[i] = next;
    }

    incoming
        .into_iter()
        .zip(outgoing)
        .map(|(incoming, outgoing)| NodeDirections { incoming, outgoing })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn segments_carry_length_and_unit_direction() {
        let waypoints = vec![
            JointVector::from([0., 0.]),
            JointVector::from([3., 4.]),
            JointVector::from([3., 4.]),
        ];
        let segments = build_segments(&waypoints).unwrap();
        assert_eq!(segments.len(), 2);
        assert_abs_diff_eq!(segments[0].length, 5.);
        assert_abs_diff_eq!(segments[0].direction[0], 0.6);
        assert_abs_diff_eq!(segments[0].direction[1], 0.8);
        assert!(segments[1].is_degenerate());
        assert_eq!(segments[1].direction, JointVector::zeros(2));
    }

    #[test]
    fn single_waypoint_has_no_segments() {
        let segments = build_segments(&[JointVector::from([1., 2., 3.])]).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert_eq!(build_segments(&[]), Err(RetimeError::EmptyPath));
        assert_eq!(
            build_segments(&[JointVector::new(vec![])]),
            Err(RetimeError::NoJoints)
        );
        assert_eq!(
            build_segments(&[JointVector::from([0., 0.]), JointVector::from([1.])]),
            Err(RetimeError::DimensionMismatch {
                index: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            build_segments(&[JointVector::from([0., f64::NAN])]),
            Err(RetimeError::NonFiniteWaypoint { index: 0, joint: 1 })
        );
    }

    #[test]
    fn node_directions_look_through_repeated_waypoints() {
        let waypoints = vec![
            JointVector::from([0.]),
            JointVector::from([1.]),
            JointVector::from([1.]),
            JointVector::from([0.]),
        ];
        let segments = build_segments(&waypoints).unwrap();
        let dirs = node_directions(&segments);
        assert_eq!(dirs.len(), 4);
        assert_eq!(dirs[0].incoming, None);
        assert_eq!(dirs[3].outgoing, None);
        // both nodes of the repeated waypoint see the reversal
        for node in [1, 2] {
            assert_eq!(dirs[node].incoming.map(|d| d[0]), Some(1.));
            assert_eq!(dirs[node].outgoing.map(|d| d[0]), Some(-1.));
        }
    }
}
