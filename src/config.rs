//! Retiming options and job files.
//!
//! A job bundles everything a retiming call needs and is read from JSON:
//!
//! ```
//! use joint_retimer::config::RetimeJob;
//!
//! let job = RetimeJob::from_json_str(
//!     r#"{
//!         "waypoints": [[0.0, 0.0], [1.0, 0.5]],
//!         "limits": { "max_speed": [1.0, 1.0], "max_acceleration": [2.0, 2.0] },
//!         "options": { "smoothing": { "type": "None" } }
//!     }"#,
//! )
//! .expect("valid job");
//! let trajectory = job.run().expect("feasible job");
//! assert!(trajectory.total_duration() > 0.);
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::RetimeError,
    math::JointVector,
    retiming::{self, JointLimits, SmoothingPolicy, SolverSettings},
    trajectories::RetimedTrajectory,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RetimeOptions {
    pub smoothing: SmoothingPolicy,
    pub solver: SolverSettings,
    /// when set, the trajectory also carries samples taken every `sample_interval` seconds
    pub sample_interval: Option<f64>,
    /// largest instantaneous joint velocity change allowed across a corner
    pub corner_velocity_jump: Option<f64>,
}

impl RetimeOptions {
    pub fn validate(&self) -> Result<(), RetimeError> {
        self.solver.validate()?;
        if let Some(dt) = self.sample_interval {
            if !(dt.is_finite() && dt > 0.) {
                return Err(RetimeError::InvalidSampleInterval(dt));
            }
        }
        if let Some(jump) = self.corner_velocity_jump {
            if !(jump.is_finite() && jump >= 0.) {
                return Err(RetimeError::InvalidCornerJump(jump));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("couldn't read job file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("couldn't parse job: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Waypoints, limits and options of a single retiming call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RetimeJob {
    pub waypoints: Vec<JointVector>,
    pub limits: JointLimits,
    #[serde(default)]
    pub options: RetimeOptions,
}

impl RetimeJob {
    pub fn from_json_str(json: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn run(&self) -> Result<RetimedTrajectory, RetimeError> {
        retiming::retime(&self.waypoints, &self.limits, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_when_missing() {
        let job = RetimeJob::from_json_str(
            r#"{"waypoints": [[0.0], [1.0]], "limits": {"max_speed": [1.0], "max_acceleration": [1.0]}}"#,
        )
        .unwrap();
        assert_eq!(job.options, RetimeOptions::default());
        assert_eq!(job.options.solver.max_iterations, 500);
    }

    #[test]
    fn partial_solver_settings_keep_defaults() {
        let options: RetimeOptions =
            serde_json::from_str(r#"{"solver": {"tolerance": 1e-6}, "sample_interval": 0.01}"#)
                .unwrap();
        assert_eq!(options.solver.tolerance, 1e-6);
        assert_eq!(options.solver.max_iterations, 500);
        assert_eq!(options.sample_interval, Some(0.01));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = RetimeOptions {
            sample_interval: Some(0.),
            ..Default::default()
        };
        assert_eq!(
            options.validate(),
            Err(RetimeError::InvalidSampleInterval(0.))
        );
        let options = RetimeOptions {
            corner_velocity_jump: Some(-1.),
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(RetimeError::InvalidCornerJump(-1.)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            RetimeJob::from_json_str("{\"waypoints\": 3}"),
            Err(JobError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            RetimeJob::from_json_file("/definitely/not/here.json"),
            Err(JobError::Io { .. })
        ));
    }
}
