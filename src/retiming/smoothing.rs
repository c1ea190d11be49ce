//! Corner smoothing strategies.
//!
//! Sharp corners force the path speed down at the corner node. A smoother trades
//! fidelity for continuity by replacing the corner with a short bevel made of a
//! few extra waypoints. Reversal detection runs on whatever a smoother returns.

use serde::{Deserialize, Serialize};

use crate::{error::RetimeError, math::JointVector};

/// corners whose incoming and outgoing directions are this aligned are kept
const NEARLY_STRAIGHT_DOT: f64 = 0.999;

/// segments shorter than this are too small to bevel
const MIN_BEVEL_SEGMENT: f64 = 1e-9;

pub trait CornerSmoother {
    fn smooth(&self, waypoints: &[JointVector]) -> Vec<JointVector>;
}

/// Keeps the path as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSmoothing;

impl CornerSmoother for NoSmoothing {
    fn smooth(&self, waypoints: &[JointVector]) -> Vec<JointVector> {
        waypoints.to_vec()
    }
}

/// Replaces every sharp corner by a bevel starting and ending at most `radius`
/// away from it, subdivided into at most `max_subdivisions` pieces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRadiusSmoothing {
    radius: f64,
    max_subdivisions: usize,
}

impl FixedRadiusSmoothing {
    pub fn new(radius: f64, max_subdivisions: usize) -> Result<Self, RetimeError> {
        if !radius.is_finite() || radius < 0. {
            return Err(RetimeError::InvalidSmoothing(format!(
                "bevel radius must be finite and non-negative, got {radius}"
            )));
        }
        if max_subdivisions == 0 {
            return Err(RetimeError::InvalidSmoothing(
                "at least one subdivision per bevel is required".to_string(),
            ));
        }
        Ok(Self {
            radius,
            max_subdivisions,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn max_subdivisions(&self) -> usize {
        self.max_subdivisions
    }

    fn subdivisions(&self, bevel_length: f64) -> usize {
        let step = self.radius / 4.;
        let wanted = (bevel_length / step).ceil().max(1.) as usize;
        wanted.min(self.max_subdivisions)
    }
}

impl CornerSmoother for FixedRadiusSmoothing {
    fn smooth(&self, waypoints: &[JointVector]) -> Vec<JointVector> {
        if self.radius <= 0. || waypoints.len() < 3 {
            return waypoints.to_vec();
        }

        let mut smoothed = Vec::with_capacity(waypoints.len());
        smoothed.push(waypoints[0].clone());
        for window in waypoints.windows(3) {
            let (prev, corner, next) = (&window[0], &window[1], &window[2]);
            let v_in = corner - prev;
            let v_out = next - corner;
            let len_in = v_in.norm();
            let len_out = v_out.norm();
            if len_in < MIN_BEVEL_SEGMENT || len_out < MIN_BEVEL_SEGMENT {
                smoothed.push(corner.clone());
                continue;
            }

            let u_in = &v_in / len_in;
            let u_out = &v_out / len_out;
            if u_in.dot(&u_out) > NEARLY_STRAIGHT_DOT {
                smoothed.push(corner.clone());
                continue;
            }

            let d_in = self.radius.min(0.5 * len_in);
            let d_out = self.radius.min(0.5 * len_out);
            let bevel_start = corner - &(&u_in * d_in);
            let bevel_end = corner + &(&u_out * d_out);

            let n_sub = self.subdivisions((&bevel_end - &bevel_start).norm());
            smoothed.push(bevel_start.clone());
            for k in 1..n_sub {
                let alpha = k as f64 / n_sub as f64;
                smoothed.push(bevel_start.lerp(&bevel_end, alpha));
            }
            smoothed.push(bevel_end);
        }
        if let Some(last) = waypoints.last() {
            smoothed.push(last.clone());
        }
        smoothed
    }
}

/// Serializable choice of smoothing strategy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(tag = "type")]
pub enum SmoothingPolicy {
    #[default]
    None,
    FixedRadius {
        radius: f64,
        max_subdivisions: usize,
    },
}

impl SmoothingPolicy {
    pub fn smoother(&self) -> Result<Box<dyn CornerSmoother + Send + Sync>, RetimeError> {
        Ok(match *self {
            SmoothingPolicy::None => Box::new(NoSmoothing),
            SmoothingPolicy::FixedRadius {
                radius,
                max_subdivisions,
            } => Box::new(FixedRadiusSmoothing::new(radius, max_subdivisions)?),
        })
    }
}
