use crate::{CancelReason, TouchPoint, Viewport, DEFAULT_PAN_THRESHOLD_PX};
use glam::Vec2;
use tracing::{debug, info};

type StopCallback = Box<dyn FnMut(CancelReason)>;

/// Watches touch and resize input for signs the user wants manual control.
///
/// A single-finger drag past the pan threshold, or rotating the device to
/// landscape, ends the orientation session. Pinches are ignored. The monitor
/// only fires while armed and disarms itself when it fires, so the stop
/// callback runs once per session.
pub struct CancellationMonitor {
    pan_threshold: f32,
    armed: bool,
    touch: TouchState,
    on_stop: Option<StopCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchState {
    Idle,
    Tracking { origin: Vec2 },
}

impl CancellationMonitor {
    pub fn new(pan_threshold: f32) -> Self {
        Self {
            pan_threshold: pan_threshold.max(0.0),
            armed: false,
            touch: TouchState::Idle,
            on_stop: None,
        }
    }

    /// Register a callback invoked when the monitor cancels the session.
    pub fn with_stop_callback(mut self, callback: impl FnMut(CancelReason) + 'static) -> Self {
        self.on_stop = Some(Box::new(callback));
        self
    }

    /// Start watching on behalf of a freshly started session.
    pub fn arm(&mut self) {
        self.armed = true;
        self.touch = TouchState::Idle;
    }

    /// Stop watching. Safe to call repeatedly.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.touch = TouchState::Idle;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.touch, TouchState::Tracking { .. })
    }

    pub fn on_touch_start(&mut self, touches: &[TouchPoint]) {
        if let [only] = touches {
            self.touch = TouchState::Tracking {
                origin: only.position(),
            };
        }
    }

    /// Returns the cancellation reason if this move ends the session.
    pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> Option<CancelReason> {
        let TouchState::Tracking { origin } = self.touch else {
            return None;
        };

        match touches {
            [only] => {
                let distance = only.position().distance(origin);
                if distance > self.pan_threshold {
                    debug!(distance, "Manual pan detected");
                    self.touch = TouchState::Idle;
                    return self.fire(CancelReason::ManualPan { distance });
                }
                None
            }
            [] => None,
            _ => {
                // Second finger down: a pinch, not a pan.
                self.touch = TouchState::Idle;
                None
            }
        }
    }

    pub fn on_touch_end(&mut self) {
        self.touch = TouchState::Idle;
    }

    /// Returns the cancellation reason if the new viewport is landscape.
    pub fn on_resize(&mut self, viewport: Viewport) -> Option<CancelReason> {
        if !viewport.is_landscape() {
            return None;
        }
        self.fire(CancelReason::Landscape {
            width: viewport.width,
            height: viewport.height,
        })
    }

    fn fire(&mut self, reason: CancelReason) -> Option<CancelReason> {
        if !self.armed {
            return None;
        }
        self.disarm();
        info!(?reason, "Cancelling orientation control");
        if let Some(callback) = self.on_stop.as_mut() {
            callback(reason);
        }
        Some(reason)
    }
}

impl Default for CancellationMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_PAN_THRESHOLD_PX)
    }
}
