use crate::types::ViewTarget;
use anyhow::Result;
use tracing::{debug, warn};

/// View-state sink of the rendering engine.
///
/// All angles are radians. Setters may fail; the engine is an external
/// collaborator and can reject writes transiently.
pub trait ViewConsumer {
    fn roll(&self) -> f64;
    fn fov(&self) -> f64;
    fn set_yaw(&mut self, yaw: f64) -> Result<()>;
    fn set_pitch(&mut self, pitch: f64) -> Result<()>;
    fn set_roll(&mut self, roll: f64) -> Result<()>;
    fn set_fov(&mut self, fov: f64) -> Result<()>;
}

/// Binds one session's view targets to a consumer.
///
/// Remembers the roll and field of view found on attach and puts them back
/// on detach.
pub struct ViewBinder<C: ViewConsumer> {
    consumer: C,
    saved_roll: f64,
    /// Field of view to restore, set only when the session changed it.
    saved_fov: Option<f64>,
}

impl<C: ViewConsumer> ViewBinder<C> {
    /// Take over the consumer. `ar_fov` replaces the field of view for the
    /// duration of the session.
    pub fn attach(mut consumer: C, ar_fov: Option<f64>) -> Self {
        let saved_roll = consumer.roll();
        let saved_fov = ar_fov.and_then(|fov| {
            let previous = consumer.fov();
            match consumer.set_fov(fov) {
                Ok(()) => {
                    debug!(fov, previous, "AR field of view applied");
                    Some(previous)
                }
                Err(e) => {
                    warn!(?e, "Failed to apply AR field of view");
                    None
                }
            }
        });
        Self {
            consumer,
            saved_roll,
            saved_fov,
        }
    }

    /// Write a target to the consumer with pitch clamped.
    ///
    /// Returns the target as written.
    pub fn apply(&mut self, target: ViewTarget) -> Result<ViewTarget> {
        let target = target.clamped();
        self.consumer.set_yaw(target.yaw)?;
        self.consumer.set_pitch(target.pitch)?;
        self.consumer.set_roll(target.roll)?;
        Ok(target)
    }

    /// Restore the saved roll and field of view and hand the consumer back.
    pub fn detach(mut self) -> C {
        if let Err(e) = self.consumer.set_roll(self.saved_roll) {
            warn!(?e, "Failed to restore roll");
        }
        if let Some(fov) = self.saved_fov {
            if let Err(e) = self.consumer.set_fov(fov) {
                warn!(?e, "Failed to restore field of view");
            }
        }
        self.consumer
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}
