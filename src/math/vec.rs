use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Index, Mul, Sub};

/// A point or a direction in joint space, one coordinate per joint.
#[derive(Deserialize, Serialize, PartialEq, Clone, Debug, Default)]
#[serde(transparent)]
pub struct JointVector(Vec<f64>);

impl JointVector {
    pub fn new(coords: Vec<f64>) -> Self {
        Self(coords)
    }

    pub fn zeros(n_joints: usize) -> Self {
        Self(vec![0.; n_joints])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|c| c.powi(2)).sum::<f64>().sqrt()
    }

    pub fn dot(&self, rhs: &Self) -> f64 {
        self.0.iter().zip(&rhs.0).map(|(a, b)| a * b).sum()
    }

    /// unit vector along `self`, or the zero vector when `self` has no length
    pub fn direction(&self) -> Self {
        let norm = self.norm();
        if norm > 0. {
            self / norm
        } else {
            Self::zeros(self.len())
        }
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// largest absolute per-coordinate difference with `other`
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .fold(0., f64::max)
    }

    /// `(1 - alpha) * self + alpha * other`
    pub fn lerp(&self, other: &Self, alpha: f64) -> Self {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (1. - alpha) * a + alpha * b)
            .collect()
    }

    fn zip_with(&self, rhs: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.len(), rhs.len(), "joint count mismatch");
        self.0.iter().zip(&rhs.0).map(|(a, b)| f(*a, *b)).collect()
    }
}

impl From<Vec<f64>> for JointVector {
    fn from(coords: Vec<f64>) -> Self {
        Self(coords)
    }
}

impl<const N: usize> From<[f64; N]> for JointVector {
    fn from(coords: [f64; N]) -> Self {
        Self(coords.to_vec())
    }
}

impl FromIterator<f64> for JointVector {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for JointVector {
    type Output = f64;

    fn index(&self, joint: usize) -> &Self::Output {
        &self.0[joint]
    }
}

impl Add for &JointVector {
    type Output = JointVector;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Add for JointVector {
    type Output = JointVector;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Sub for &JointVector {
    type Output = JointVector;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Sub for JointVector {
    type Output = JointVector;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Mul<f64> for &JointVector {
    type Output = JointVector;

    fn mul(self, rhs: f64) -> Self::Output {
        self.0.iter().map(|c| c * rhs).collect()
    }
}

impl Mul<f64> for JointVector {
    type Output = JointVector;

    fn mul(self, rhs: f64) -> Self::Output {
        &self * rhs
    }
}

impl Div<f64> for &JointVector {
    type Output = JointVector;

    fn div(self, rhs: f64) -> Self::Output {
        self.0.iter().map(|c| c / rhs).collect()
    }
}

impl Div<f64> for JointVector {
    type Output = JointVector;

    fn div(self, rhs: f64) -> Self::Output {
        &self / rhs
    }
}

impl AsRef<[f64]> for JointVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}
