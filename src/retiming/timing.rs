//! Per-segment timing.
//!
//! Each segment is driven through at most three constant-acceleration phases:
//! speed up from the entry speed, cruise, slow down to the exit speed. When the
//! solver saturated the acceleration bound the profile collapses to a single
//! phase lasting `2L / (v0 + v1)`, and a stop-to-stop segment too short to
//! cruise becomes the triangle lasting `2 * sqrt(L / a)`.

use serde::Serialize;

use super::{geometry::Segment, limits::SegmentCaps};

/// speeds summing to less than this count as a standstill
const STANDSTILL_SPEED: f64 = 1e-12;

/// relative slack on the segment length before node speeds are treated as
/// inconsistent with the acceleration bound
const LENGTH_SLACK: f64 = 1e-9;

/// phases shorter than this are rounding leftovers and dropped
const MIN_PHASE_DURATION: f64 = 1e-12;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Phase {
    /// time since the start of the segment at which the phase ends
    pub end_time: f64,
    /// path displacement at the start of the phase
    pub initial_offset: f64,
    pub initial_speed: f64,
    pub acceleration: f64,
}

impl Phase {
    fn offset_after(&self, tau: f64) -> f64 {
        self.initial_offset + self.initial_speed * tau + 0.5 * self.acceleration * tau * tau
    }

    fn speed_after(&self, tau: f64) -> f64 {
        self.initial_speed + self.acceleration * tau
    }
}

/// Path speed versus time along one segment.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentProfile {
    phases: [Phase; 3],
    n_phases: usize,
    length: f64,
    peak_speed: f64,
}

impl SegmentProfile {
    pub fn new(length: f64, entry_speed: f64, exit_speed: f64, caps: SegmentCaps) -> Self {
        if length <= 0. {
            return Self::default();
        }

        let accel = caps.acceleration;
        if !(accel.is_finite() && accel > 0.) {
            return Self::average_speed(length, entry_speed, exit_speed);
        }

        let (v0, v1) = (entry_speed, exit_speed);
        let unbounded_peak = (accel * length + 0.5 * (v0 * v0 + v1 * v1)).sqrt();
        let peak = unbounded_peak.min(caps.speed).max(v0).max(v1);

        let accel_distance = (peak * peak - v0 * v0) / (2. * accel);
        let decel_distance = (peak * peak - v1 * v1) / (2. * accel);
        let cruise_distance = length - accel_distance - decel_distance;
        if cruise_distance < -LENGTH_SLACK * length {
            // node speeds ask for more than `accel` allows, spread the change over the whole segment
            return Self::average_speed(length, v0, v1);
        }
        let cruise_distance = cruise_distance.max(0.);

        let mut profile = Self {
            length,
            peak_speed: peak,
            ..Default::default()
        };
        profile.push_phase((peak - v0) / accel, v0, accel);
        if peak > 0. {
            profile.push_phase(cruise_distance / peak, peak, 0.);
        }
        profile.push_phase((peak - v1) / accel, peak, -accel);
        profile
    }

    /// single constant-acceleration phase from `v0` to `v1`
    fn average_speed(length: f64, v0: f64, v1: f64) -> Self {
        let mut profile = Self {
            length,
            peak_speed: v0.max(v1),
            ..Default::default()
        };
        if v0 + v1 > STANDSTILL_SPEED {
            let duration = 2. * length / (v0 + v1);
            profile.push_phase(duration, v0, (v1 - v0) / duration);
        }
        profile
    }

    fn push_phase(&mut self, duration: f64, initial_speed: f64, acceleration: f64) {
        if duration <= MIN_PHASE_DURATION {
            return;
        }
        let (start_time, initial_offset) = match self.last_phase() {
            Some(last) => {
                let start = self.phase_start(self.n_phases - 1);
                (last.end_time, last.offset_after(last.end_time - start))
            }
            None => (0., 0.),
        };
        self.phases[self.n_phases] = Phase {
            end_time: start_time + duration,
            initial_offset,
            initial_speed,
            acceleration,
        };
        self.n_phases += 1;
    }

    fn last_phase(&self) -> Option<&Phase> {
        self.phases[..self.n_phases].last()
    }

    fn phase_start(&self, idx: usize) -> f64 {
        if idx < 1 {
            0.
        } else {
            self.phases[idx - 1].end_time
        }
    }

    fn find_phase_idx(&self, tau: f64) -> usize {
        for i in 0..self.n_phases {
            if tau < self.phases[i].end_time {
                return i;
            }
        }
        self.n_phases - 1
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases[..self.n_phases]
    }

    pub fn duration(&self) -> f64 {
        self.last_phase().map(|p| p.end_time).unwrap_or(0.)
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn peak_speed(&self) -> f64 {
        self.peak_speed
    }

    /// path displacement `tau` seconds into the segment
    pub fn offset_at(&self, tau: f64) -> f64 {
        if self.n_phases == 0 || tau >= self.duration() {
            return self.length;
        }
        let tau = tau.max(0.);
        let idx = self.find_phase_idx(tau);
        self.phases[idx].offset_after(tau - self.phase_start(idx))
    }

    pub fn speed_at(&self, tau: f64) -> f64 {
        if self.n_phases == 0 {
            return 0.;
        }
        let tau = tau.clamp(0., self.duration());
        let idx = self.find_phase_idx(tau);
        self.phases[idx].speed_after(tau - self.phase_start(idx))
    }

    pub fn acceleration_at(&self, tau: f64) -> f64 {
        if self.n_phases == 0 || tau >= self.duration() {
            return 0.;
        }
        self.phases[self.find_phase_idx(tau.max(0.))].acceleration
    }
}

/// Profiles for every segment given the solved node speeds.
pub fn time_segments(
    segments: &[Segment],
    caps: &[SegmentCaps],
    node_speeds: &[f64],
) -> Vec<SegmentProfile> {
    segments
        .iter()
        .zip(caps)
        .enumerate()
        .map(|(i, (segment, caps))| {
            SegmentProfile::new(segment.length, node_speeds[i], node_speeds[i + 1], *caps)
        })
        .collect()
}

/// cumulative start time of every node, first node at 0
pub fn node_times(profiles: &[SegmentProfile]) -> Vec<f64> {
    let mut times = Vec::with_capacity(profiles.len() + 1);
    let mut t = 0.;
    times.push(t);
    for profile in profiles {
        t += profile.duration();
        times.push(t);
    }
    times
}
