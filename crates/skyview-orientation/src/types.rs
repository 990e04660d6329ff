use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Raw orientation reading as delivered by the platform sensor.
///
/// Any of the three angles may be missing while the sensor warms up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Heading in degrees, counter-clockwise from north.
    pub alpha: Option<f64>,
    /// Front-back tilt in degrees.
    pub beta: Option<f64>,
    /// Left-right tilt in degrees.
    pub gamma: Option<f64>,
    /// iOS compass heading in degrees, clockwise from true north.
    #[serde(default)]
    pub compass_heading: Option<f64>,
}

impl OrientationSample {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
            compass_heading: None,
        }
    }

    pub fn with_compass_heading(mut self, heading: f64) -> Self {
        self.compass_heading = Some(heading);
        self
    }

    /// Resolve the sample into usable Euler angles.
    ///
    /// Returns `None` if any angle is missing. A compass heading, when
    /// present, replaces `alpha` after conversion to the counter-clockwise
    /// convention.
    pub fn euler_angles(&self) -> Option<EulerAngles> {
        let (alpha, beta, gamma) = (self.alpha?, self.beta?, self.gamma?);
        let alpha = match self.compass_heading {
            Some(heading) => heading_to_alpha(heading),
            None => alpha,
        };
        Some(EulerAngles { alpha, beta, gamma })
    }
}

/// Convert a clockwise compass heading into a counter-clockwise alpha in `[0, 360)`.
pub fn heading_to_alpha(heading: f64) -> f64 {
    (360.0 - heading).rem_euclid(360.0)
}

/// Device orientation as intrinsic Z-X'-Y'' Tait-Bryan angles, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Direction the back of the device points, in the geographic frame
/// (X = east, Y = north, Z = up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldVector {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl WorldVector {
    pub fn as_dvec3(&self) -> DVec3 {
        DVec3::new(self.east, self.north, self.up)
    }

    /// Length of the projection onto the horizontal plane.
    pub fn horizontal(&self) -> f64 {
        self.east.hypot(self.north)
    }
}

/// Output of the frame transform: pointing direction plus horizon roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePointing {
    pub vector: WorldVector,
    /// Rotation of the device's top edge about the pointing axis (radians).
    pub roll: f64,
}

/// View direction in the consuming engine's convention, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewTarget {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl ViewTarget {
    /// Copy of this target with pitch clamped to `[-π/2, π/2]`.
    pub fn clamped(self) -> Self {
        Self {
            pitch: clamp_pitch(self.pitch),
            ..self
        }
    }
}

pub fn clamp_pitch(pitch: f64) -> f64 {
    pitch.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// How sensor events are captured for a session. Resolved once at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Orientation referenced to magnetic north.
    Absolute,
    /// Orientation relative to an arbitrary platform-chosen frame.
    Relative,
}
