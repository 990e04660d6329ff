use crate::types::clamp_pitch;
use std::f64::consts::{PI, TAU};

/// Tuning for the adaptive exponential filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    /// Gain used at rest and inside the dead zone.
    pub min_factor: f64,
    /// Gain approached during large, intentional motion.
    pub max_factor: f64,
    /// How quickly the gain ramps from min to max once outside the dead zone.
    pub ramp_sharpness: f64,
    /// Angular change (radians) below which motion is treated as noise.
    pub dead_zone: f64,
}

impl SmoothingParams {
    /// Factors are clamped to `[0, 1]` and ordered so that min <= max.
    pub fn new(min_factor: f64, max_factor: f64, ramp_sharpness: f64, dead_zone: f64) -> Self {
        let a = min_factor.clamp(0.0, 1.0);
        let b = max_factor.clamp(0.0, 1.0);
        Self {
            min_factor: a.min(b),
            max_factor: a.max(b),
            ramp_sharpness: ramp_sharpness.max(0.0),
            dead_zone: dead_zone.max(0.0),
        }
    }

    /// Gain for a change of magnitude `abs_diff` (radians).
    pub fn factor(&self, abs_diff: f64) -> f64 {
        if abs_diff < self.dead_zone {
            return self.min_factor;
        }
        let ramp = 1.0 - (-self.ramp_sharpness * (abs_diff - self.dead_zone)).exp();
        self.min_factor + (self.max_factor - self.min_factor) * ramp
    }
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self::new(0.1, 0.7, 4.0, 0.02)
    }
}

/// Adaptive-gain smoothing for yaw (circular) and pitch (linear).
///
/// Small jitter is held at the minimum gain so the view stays still at rest,
/// while large movements ramp toward the maximum gain so the view keeps up
/// with the hand. Both channels seed from their first sample unfiltered.
#[derive(Debug, Clone)]
pub struct AdaptiveSmoother {
    params: SmoothingParams,
    yaw: Option<f64>,
    pitch: Option<f64>,
}

impl AdaptiveSmoother {
    pub fn new(params: SmoothingParams) -> Self {
        Self {
            params,
            yaw: None,
            pitch: None,
        }
    }

    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    /// Smooth a yaw angle along the shortest arc.
    ///
    /// The result is kept in `[-π, π)`, so consecutive updates never differ
    /// by more than π.
    pub fn smooth_yaw(&mut self, yaw: f64) -> f64 {
        let smoothed = match self.yaw {
            None => yaw,
            Some(prev) => {
                let mut diff = yaw - prev;
                if diff > PI {
                    diff -= TAU;
                } else if diff < -PI {
                    diff += TAU;
                }
                wrap_pi(prev + self.params.factor(diff.abs()) * diff)
            }
        };
        self.yaw = Some(smoothed);
        smoothed
    }

    /// Smooth a pitch angle. The result is clamped to `[-π/2, π/2]`.
    pub fn smooth_pitch(&mut self, pitch: f64) -> f64 {
        let smoothed = match self.pitch {
            None => pitch,
            Some(prev) => {
                let diff = pitch - prev;
                prev + self.params.factor(diff.abs()) * diff
            }
        };
        let smoothed = clamp_pitch(smoothed);
        self.pitch = Some(smoothed);
        smoothed
    }

    /// Forget the filter history; the next samples seed both channels.
    pub fn reset(&mut self) {
        self.yaw = None;
        self.pitch = None;
    }

    pub fn is_seeded(&self) -> bool {
        self.yaw.is_some() && self.pitch.is_some()
    }
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU for inputs just below a multiple of it.
    if wrapped >= PI {
        wrapped - TAU
    } else {
        wrapped
    }
}
