//! Point-to-point move where every joint starts and stops at the same time.
//!
//! The slowest joint sets the duration, the others are stretched to match by
//! lowering their cruise speed while keeping their full acceleration.

use std::cmp::Ordering;

use tracing::debug;

use super::{
    trapezoid::{min_duration, Trapezoid1d},
    Trajectory,
};
use crate::{
    error::{LimitKind, RetimeError},
    math::JointVector,
    retiming::{geometry, JointLimits},
};

#[derive(Debug, Clone)]
pub struct SyncedMove {
    joints: Vec<Trapezoid1d>,
    goal: JointVector,
    duration: f64,
}

impl SyncedMove {
    pub fn new(
        start: &JointVector,
        goal: &JointVector,
        limits: &JointLimits,
    ) -> Result<Self, RetimeError> {
        let n_joints = geometry::validate_waypoints(&[start.clone(), goal.clone()])?;
        limits.check_joint_count(n_joints)?;

        let distances = goal - start;
        for (joint, distance) in distances.iter().enumerate() {
            if *distance == 0. {
                continue;
            }
            for (kind, value) in [
                (LimitKind::Speed, limits.max_speed[joint]),
                (LimitKind::Acceleration, limits.max_acceleration[joint]),
            ] {
                if !(value.is_finite() && value > 0.) {
                    return Err(RetimeError::InvalidLimit {
                        joint,
                        segment: 0,
                        kind,
                        value,
                    });
                }
            }
        }

        let duration = distances
            .iter()
            .enumerate()
            .map(|(j, d)| min_duration(*d, limits.max_speed[j], limits.max_acceleration[j]))
            .fold(0., f64::max);

        let joints = (0..n_joints)
            .map(|j| {
                Trapezoid1d::with_duration(start[j], goal[j], limits.max_acceleration[j], duration)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(duration, joints = n_joints, "synchronized move");

        Ok(Self {
            joints,
            goal: goal.clone(),
            duration,
        })
    }

    pub fn joints(&self) -> &[Trapezoid1d] {
        &self.joints
    }

    pub fn peak_speeds(&self) -> JointVector {
        self.joints.iter().map(Trapezoid1d::peak_speed).collect()
    }
}

impl Trajectory<JointVector, JointVector> for SyncedMove {
    fn get_position(&self, t: f64) -> JointVector {
        if t >= self.duration {
            return self.goal.clone();
        }
        self.joints.iter().map(|j| j.get_position(t)).collect()
    }

    fn get_velocity(&self, t: f64) -> JointVector {
        if t >= self.duration {
            return JointVector::zeros(self.joints.len());
        }
        self.joints.iter().map(|j| j.get_velocity(t)).collect()
    }

    fn get_acceleration(&self, t: f64) -> JointVector {
        self.joints.iter().map(|j| j.get_acceleration(t)).collect()
    }

    fn get_total_runtime(&self) -> f64 {
        self.duration
    }

    fn get_final_destination(&self) -> JointVector {
        self.goal.clone()
    }

    fn get_max_speed(&self) -> Option<JointVector> {
        // every joint profile is symmetric and peaks halfway
        Some(self.get_velocity(self.duration / 2.))
    }

    fn get_time_sections(&self) -> impl Iterator<Item = f64> {
        let mut sections: Vec<f64> = self
            .joints
            .iter()
            .flat_map(|j| j.get_time_sections())
            .collect();
        sections.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        sections.dedup();
        sections.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn demo() -> SyncedMove {
        SyncedMove::new(
            &JointVector::from([0., 0., 0.]),
            &JointVector::from([-10., 15., 5.]),
            &JointLimits::new([1., 2., 3.], [0.5, 1., 1.]),
        )
        .unwrap()
    }

    #[test]
    fn slowest_joint_sets_the_duration() {
        // joint 0: 10 / 1 + 1 / 0.5 = 12, joint 1: 15 / 2 + 2 = 9.5, joint 2: 2 sqrt(5)
        let synced = demo();
        assert_abs_diff_eq!(synced.get_total_runtime(), 12., epsilon = 1e-12);
        assert_abs_diff_eq!(synced.peak_speeds()[0], 1., epsilon = 1e-9);
        assert!(synced.peak_speeds()[1] < 2.);
        assert!(synced.peak_speeds()[2] < 3.);
    }

    #[test]
    fn all_joints_arrive_together() {
        let synced = demo();
        let end = synced.get_total_runtime();
        assert_eq!(synced.get_position(end), JointVector::from([-10., 15., 5.]));
        assert_eq!(synced.get_velocity(end), JointVector::zeros(3));
        for joint in synced.joints() {
            assert_abs_diff_eq!(joint.get_total_runtime(), end, epsilon = 1e-9);
        }
        let just_before = synced.get_velocity(end - 1e-3);
        assert!(just_before.iter().all(|v| v.abs() < 1e-2));
    }

    #[test]
    fn long_moves_at_low_acceleration_are_accepted() {
        let limits = JointLimits::new([1e9, 1e9], [0.37, 0.37]);
        for i in 1..200 {
            let distance = 1e7 * i as f64 + 0.123;
            let goal = JointVector::from([distance, distance / 3.]);
            let synced = SyncedMove::new(&JointVector::zeros(2), &goal, &limits).unwrap();
            assert_eq!(synced.get_position(synced.get_total_runtime()), goal);
            assert!(synced.peak_speeds()[1] < synced.peak_speeds()[0]);
        }
    }

    #[test]
    fn joint_that_does_not_move_stays_still() {
        let synced = SyncedMove::new(
            &JointVector::from([1., 2.]),
            &JointVector::from([1., 5.]),
            &JointLimits::new([0., 1.], [0., 1.]),
        )
        .unwrap();
        assert_eq!(synced.get_position(1.)[0], 1.);
        assert_eq!(synced.get_velocity(1.)[0], 0.);
    }

    #[test]
    fn zero_limit_on_moving_joint_is_rejected() {
        let err = SyncedMove::new(
            &JointVector::from([0., 0.]),
            &JointVector::from([1., 1.]),
            &JointLimits::new([1., 1.], [1., 0.]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RetimeError::InvalidLimit {
                joint: 1,
                kind: LimitKind::Acceleration,
                ..
            }
        ));
    }
}
