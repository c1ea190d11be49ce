use joint_retimer::{retime, JointLimits, JointVector, RetimeOptions, RetimedTrajectory};
use proptest::prelude::*;

const DT: f64 = 0.01;

fn planar_path() -> impl Strategy<Value = Vec<JointVector>> {
    prop::collection::vec(prop::collection::vec(-5.0..5.0f64, 2), 2..7)
        .prop_map(|points| points.into_iter().map(JointVector::new).collect())
}

fn line_path() -> impl Strategy<Value = Vec<JointVector>> {
    prop::collection::vec(-5.0..5.0f64, 2..8)
        .prop_map(|points| points.into_iter().map(|p| JointVector::from([p])).collect())
}

fn planar_limits() -> impl Strategy<Value = JointLimits> {
    (0.2..2.0f64, 0.2..2.0f64, 0.2..2.0f64, 0.2..2.0f64)
        .prop_map(|(v0, v1, a0, a1)| JointLimits::new([v0, v1], [a0, a1]))
}

fn times(traj: &RetimedTrajectory) -> impl Iterator<Item = f64> + '_ {
    let n = (traj.total_duration() / DT).ceil() as usize;
    (0..=n).map(|k| k as f64 * DT)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn joint_speeds_stay_within_limits(path in planar_path(), limits in planar_limits()) {
        let traj = retime(&path, &limits, &RetimeOptions::default()).unwrap();
        let peaks = traj.peak_joint_speeds();
        for j in 0..2 {
            prop_assert!(peaks[j] <= limits.max_speed[j] * (1. + 1e-9));
        }
        for t in times(&traj) {
            let v = traj.velocity(t);
            for j in 0..2 {
                prop_assert!(v[j].abs() <= limits.max_speed[j] * (1. + 1e-9));
            }
        }
    }

    #[test]
    fn single_joint_acceleration_stays_within_limit(
        path in line_path(),
        max_speed in 0.2..2.0f64,
        max_acceleration in 0.2..2.0f64,
    ) {
        let traj = retime(
            &path,
            &JointLimits::new([max_speed], [max_acceleration]),
            &RetimeOptions::default(),
        )
        .unwrap();
        for t in times(&traj) {
            let dv = traj.velocity(t + DT)[0] - traj.velocity(t)[0];
            prop_assert!(dv.abs() / DT <= max_acceleration * (1. + 1e-6) + 1e-5);
        }
    }

    #[test]
    fn joint_acceleration_stays_within_limits_when_corners_stop(
        path in planar_path(),
        limits in planar_limits(),
    ) {
        let options = RetimeOptions {
            corner_velocity_jump: Some(0.),
            ..Default::default()
        };
        let traj = retime(&path, &limits, &options).unwrap();
        for t in times(&traj) {
            let (before, after) = (traj.velocity(t), traj.velocity(t + DT));
            for j in 0..2 {
                let accel = (after[j] - before[j]).abs() / DT;
                prop_assert!(accel <= limits.max_acceleration[j] * (1. + 1e-6) + 1e-5);
            }
        }
    }

    #[test]
    fn endpoints_are_hit_exactly(path in planar_path(), limits in planar_limits()) {
        let traj = retime(&path, &limits, &RetimeOptions::default()).unwrap();
        prop_assert_eq!(traj.position(0.), path[0].clone());
        prop_assert_eq!(traj.position(traj.total_duration()), path[path.len() - 1].clone());
        prop_assert_eq!(traj.velocity(traj.total_duration()), JointVector::zeros(2));
    }

    #[test]
    fn zero_nodes_are_standstills(path in planar_path(), limits in planar_limits()) {
        let traj = retime(&path, &limits, &RetimeOptions::default()).unwrap();
        for &node in traj.zero_nodes() {
            prop_assert_eq!(traj.node_speeds()[node], 0.);
            prop_assert_eq!(traj.velocity(traj.node_times()[node]), JointVector::zeros(2));
        }
    }

    #[test]
    fn node_times_never_decrease(path in planar_path(), limits in planar_limits()) {
        let traj = retime(&path, &limits, &RetimeOptions::default()).unwrap();
        prop_assert!(traj.node_times().windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(traj.total_duration().is_finite());
    }

    #[test]
    fn retiming_is_deterministic(path in planar_path(), limits in planar_limits()) {
        let a = retime(&path, &limits, &RetimeOptions::default()).unwrap();
        let b = retime(&path, &limits, &RetimeOptions::default()).unwrap();
        prop_assert_eq!(a.diagnostics(), b.diagnostics());
    }
}
