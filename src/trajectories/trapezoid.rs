// Rest-to-rest trapezoidal profile for a single joint

use std::cmp::Ordering;

use super::Trajectory;
use crate::error::RetimeError;

/// negative discriminants down to this fraction of (a·T)² are rounding noise and
/// clamped to zero
const DISCRIMINANT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TrapezoidPart {
    end_time: f64,
    initial_pos: f64,
    initial_vel: f64,
    accel: f64,
}

impl TrapezoidPart {
    fn position_after(&self, t: f64) -> f64 {
        self.initial_pos + (self.initial_vel * t) + (0.5 * self.accel * t * t)
    }
}

/// Shortest time to travel `distance` from rest to rest without exceeding
/// `max_speed` or `max_accel`.
pub fn min_duration(distance: f64, max_speed: f64, max_accel: f64) -> f64 {
    let distance = distance.abs();
    if distance == 0. {
        return 0.;
    }
    if distance >= max_speed * max_speed / max_accel {
        // trapezoid, the cruise speed is reached
        distance / max_speed + max_speed / max_accel
    } else {
        2. * (distance / max_accel).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Trapezoid1d {
    parts: [TrapezoidPart; 3],
    n_parts: usize,
    target: f64,
    peak_speed: f64,
}

impl Trapezoid1d {
    /// Moves from `start` to `target` in exactly `duration` seconds, accelerating
    /// and braking at `max_accel` and cruising at whatever speed makes the
    /// timing work out.
    pub fn with_duration(
        start: f64,
        target: f64,
        max_accel: f64,
        duration: f64,
    ) -> Result<Self, RetimeError> {
        let distance = (target - start).abs();
        if distance == 0. {
            // stay put for the whole move
            let mut parts = [TrapezoidPart::default(); 3];
            parts[0].end_time = duration.max(0.);
            parts[0].initial_pos = start;
            return Ok(Self {
                parts,
                n_parts: 1,
                target,
                peak_speed: 0.,
            });
        }

        let too_short = RetimeError::MoveTooShort {
            distance,
            acceleration: max_accel,
            duration,
        };
        if !(max_accel.is_finite() && max_accel > 0. && duration > 0.) {
            return Err(too_short);
        }

        let a_t = max_accel * duration;
        let mut delta = a_t * a_t - 4. * max_accel * distance;
        if delta < 0. {
            if delta < -DISCRIMINANT_TOLERANCE * a_t * a_t {
                return Err(too_short);
            }
            delta = 0.;
        }
        let v = (a_t - delta.sqrt()) / 2.;
        let t_acc = v / max_accel;
        let t_cruise = (duration - 2. * t_acc).max(0.);

        let sign = (target - start).signum();
        let (a, v) = (sign * max_accel, sign * v);

        let mut parts = [TrapezoidPart::default(); 3];
        parts[0] = TrapezoidPart {
            end_time: t_acc,
            initial_pos: start,
            initial_vel: 0.,
            accel: a,
        };
        let mut n_parts = 1;
        if t_cruise > 0. {
            parts[1] = TrapezoidPart {
                end_time: t_acc + t_cruise,
                initial_pos: parts[0].position_after(t_acc),
                initial_vel: v,
                accel: 0.,
            };
            n_parts += 1;
        }
        let before = parts[n_parts - 1];
        let before_start = if n_parts < 2 { 0. } else { parts[0].end_time };
        parts[n_parts] = TrapezoidPart {
            end_time: before.end_time + t_acc,
            initial_pos: before.position_after(before.end_time - before_start),
            initial_vel: v,
            accel: -a,
        };
        n_parts += 1;

        Ok(Self {
            parts,
            n_parts,
            target,
            peak_speed: v.abs(),
        })
    }

    /// Fastest rest-to-rest move under both limits.
    pub fn fastest(
        start: f64,
        target: f64,
        max_speed: f64,
        max_accel: f64,
    ) -> Result<Self, RetimeError> {
        let duration = min_duration(target - start, max_speed, max_accel);
        Self::with_duration(start, target, max_accel, duration)
    }

    pub fn peak_speed(&self) -> f64 {
        self.peak_speed
    }

    pub fn accel_time(&self) -> f64 {
        if self.peak_speed == 0. {
            0.
        } else {
            self.parts[0].end_time
        }
    }

    pub fn cruise_time(&self) -> f64 {
        (self.get_total_runtime() - 2. * self.accel_time()).max(0.)
    }

    fn find_part_idx(&self, t: f64) -> usize {
        for i in 0..self.n_parts {
            if t < self.parts[i].end_time {
                return i;
            }
        }
        self.n_parts - 1
    }

    fn part_start(&self, idx: usize) -> f64 {
        if idx < 1 {
            0.
        } else {
            self.parts[idx - 1].end_time
        }
    }
}

impl Trajectory<f64, f64> for Trapezoid1d {
    fn get_position(&self, tt: f64) -> f64 {
        let traj_time = tt.max(0.);
        if traj_time >= self.get_total_runtime() {
            return self.target;
        }
        let idx = self.find_part_idx(traj_time);
        self.parts[idx].position_after(traj_time - self.part_start(idx))
    }

    fn get_velocity(&self, tt: f64) -> f64 {
        let traj_time = tt.max(0.);
        if traj_time >= self.get_total_runtime() {
            return 0.;
        }
        let idx = self.find_part_idx(traj_time);
        let part = self.parts[idx];
        part.initial_vel + part.accel * (traj_time - self.part_start(idx))
    }

    fn get_acceleration(&self, tt: f64) -> f64 {
        let traj_time = tt.max(0.);
        if traj_time >= self.get_total_runtime() {
            return 0.;
        }
        self.parts[self.find_part_idx(traj_time)].accel
    }

    fn get_total_runtime(&self) -> f64 {
        self.parts[self.n_parts - 1].end_time
    }

    fn get_final_destination(&self) -> f64 {
        self.target
    }

    fn get_max_speed(&self) -> Option<f64> {
        self.get_time_sections()
            .map(|t| self.part_start(self.find_part_idx(t)))
            .map(|t| self.get_velocity(t))
            .max_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap_or(Ordering::Equal))
    }

    fn get_time_sections(&self) -> impl Iterator<Item = f64> {
        self.parts[..self.n_parts].iter().map(|p| p.end_time)
    }
}
