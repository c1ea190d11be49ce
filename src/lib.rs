#![deny(clippy::unwrap_used)]
#![allow(async_fn_in_trait)]
pub mod config;
pub mod error;
pub mod math;
pub mod path;
pub mod playback;
pub mod retiming;
pub mod trajectories;

pub use config::{RetimeJob, RetimeOptions};
pub use error::RetimeError;
pub use math::JointVector;
pub use retiming::{retime, retime_with, JointLimits};
pub use trajectories::{RetimeDiagnostics, RetimedTrajectory, SyncedMove, Trajectory};
