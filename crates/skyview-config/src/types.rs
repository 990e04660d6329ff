use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orientation sampling and smoothing.
    pub orientation: OrientationConfig,
    /// Touch cancellation.
    pub gesture: GestureConfig,
    /// AR camera overlay.
    pub ar: ArConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Minimum milliseconds between processed sensor samples (16 ≈ 60 Hz).
    pub update_interval_ms: u64,
    pub smoothing: SmoothingConfig,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 16,
            smoothing: SmoothingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter gain at rest. Lower = steadier view, more lag.
    pub min_factor: f64,
    /// Filter gain during fast motion. Higher = more responsive.
    pub max_factor: f64,
    /// How quickly gain rises once motion leaves the dead zone.
    pub ramp_sharpness: f64,
    /// Angular change (radians) treated as sensor noise.
    pub dead_zone_rad: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_factor: 0.1,
            max_factor: 0.7,
            ramp_sharpness: 4.0,
            dead_zone_rad: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Single-finger drag distance (pixels) that hands control back to the user.
    pub pan_threshold_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pan_threshold_px: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    /// Match the sky view's field of view to the camera while orientation control is on.
    pub full_fov: bool,
    /// Field of view in degrees used when `full_fov` is set.
    pub fov_degrees: f64,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            full_fov: true,
            fov_degrees: 45.0,
        }
    }
}

impl ArConfig {
    /// Field of view to force while a session runs, in radians.
    pub fn session_fov(&self) -> Option<f64> {
        self.full_fov.then(|| self.fov_degrees.to_radians())
    }
}
