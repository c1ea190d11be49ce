//! Detection of the nodes where the path speed has to drop to zero.
//!
//! All joints share a single path parameter, so as soon as one joint has to
//! turn back the whole arm has to come to a halt at that node.

use std::collections::BTreeSet;

use serde::Serialize;

use super::geometry::{node_directions, Segment};
use crate::math::NEGLIGIBLE_COMPONENT;

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Reversals {
    /// nodes where the whole direction vector turns back (negative dot product)
    pub global: BTreeSet<usize>,
    /// nodes where at least one joint changes its direction of travel
    pub per_joint: BTreeSet<usize>,
    /// endpoints, global reversals and per-joint flips
    pub zero_nodes: BTreeSet<usize>,
}

impl Reversals {
    pub fn is_zero_node(&self, node: usize) -> bool {
        self.zero_nodes.contains(&node)
    }
}

fn flips_sign(incoming: f64, outgoing: f64) -> bool {
    incoming.abs() > NEGLIGIBLE_COMPONENT
        && outgoing.abs() > NEGLIGIBLE_COMPONENT
        && incoming * outgoing < 0.
}

pub fn detect_reversals(segments: &[Segment]) -> Reversals {
    let n_nodes = segments.len() + 1;
    let mut reversals = Reversals::default();

    let directions = node_directions(segments);
    for (node, dirs) in directions.iter().enumerate().take(n_nodes - 1).skip(1) {
        let (Some(incoming), Some(outgoing)) = (dirs.incoming, dirs.outgoing) else {
            continue;
        };
        if incoming.dot(outgoing) < 0. {
            reversals.global.insert(node);
        }
        if incoming
            .iter()
            .zip(outgoing.iter())
            .any(|(a, b)| flips_sign(*a, *b))
        {
            reversals.per_joint.insert(node);
        }
    }

    reversals.zero_nodes.insert(0);
    reversals.zero_nodes.insert(n_nodes - 1);
    reversals.zero_nodes.extend(&reversals.global);
    reversals.zero_nodes.extend(&reversals.per_joint);
    reversals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::JointVector, retiming::geometry::build_segments};

    fn reversals_of(path: &[[f64; 2]]) -> Reversals {
        let waypoints: Vec<JointVector> = path.iter().map(|p| JointVector::from(*p)).collect();
        detect_reversals(&build_segments(&waypoints).unwrap())
    }

    #[test]
    fn endpoints_are_always_zero_nodes() {
        let r = reversals_of(&[[0., 0.], [1., 0.], [2., 0.]]);
        assert_eq!(r.zero_nodes, BTreeSet::from([0, 2]));
        assert!(r.global.is_empty());
        assert!(r.per_joint.is_empty());
    }

    #[test]
    fn single_waypoint_is_its_own_zero_node() {
        let r = reversals_of(&[[1., 1.]]);
        assert_eq!(r.zero_nodes, BTreeSet::from([0]));
    }

    #[test]
    fn full_turn_back_is_a_global_reversal() {
        let r = reversals_of(&[[0., 0.], [2., 1.], [0., 0.]]);
        assert!(r.global.contains(&1));
        assert!(r.per_joint.contains(&1));
        assert!(r.is_zero_node(1));
    }

    #[test]
    fn single_joint_flip_forces_a_stop_without_global_reversal() {
        // joint 0 keeps going forward, joint 1 turns back
        let r = reversals_of(&[[0., 0.], [2., 0.5], [4., 0.]]);
        assert!(r.global.is_empty());
        assert_eq!(r.per_joint, BTreeSet::from([1]));
        assert!(r.is_zero_node(1));
    }

    #[test]
    fn joint_starting_or_stopping_is_not_a_flip() {
        let r = reversals_of(&[[0., 0.], [1., 1.], [2., 1.], [3., 0.]]);
        assert!(!r.is_zero_node(1));
        assert!(!r.is_zero_node(2));
    }

    #[test]
    fn reversal_behind_repeated_waypoint_is_detected() {
        let r = reversals_of(&[[0., 0.], [1., 0.], [1., 0.], [0., 0.]]);
        assert!(r.is_zero_node(1));
        assert!(r.is_zero_node(2));
    }
}
