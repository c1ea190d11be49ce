use joint_retimer::{JointLimits, JointVector, SyncedMove, Trajectory};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let start = JointVector::from([0., 0., 0.]);
    let goal = JointVector::from([-10., 15., 5.]);
    let limits = JointLimits::new([1., 2., 3.], [0.5, 1., 1.]);

    let synced = SyncedMove::new(&start, &goal, &limits)?;
    info!(duration = synced.get_total_runtime(), "synchronized move");
    for (j, joint) in synced.joints().iter().enumerate() {
        info!(
            joint = j,
            peak_speed = joint.peak_speed(),
            accel_time = joint.accel_time(),
            cruise_time = joint.cruise_time(),
            final_position = joint.get_position(synced.get_total_runtime()),
            "joint profile"
        );
    }
    Ok(())
}
