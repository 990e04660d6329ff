pub mod gesture;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default pan distance (pixels) that counts as taking manual control.
pub const DEFAULT_PAN_THRESHOLD_PX: f32 = 20.0;

/// Why sensor-driven view control was handed back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CancelReason {
    /// Single-finger drag further than the pan threshold.
    ManualPan { distance: f32 },
    /// Viewport became wider than tall.
    Landscape { width: u32, height: u32 },
}

/// One contact point of a touch event, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}
