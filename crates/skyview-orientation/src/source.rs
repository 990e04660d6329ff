use crate::types::CaptureMode;
use anyhow::Result;
use std::future::Future;

/// Platform provider of orientation events.
///
/// The sampler never polls the source. It subscribes once per session and
/// the host forwards each delivered event to
/// [`OrientationSampler::on_sample`](crate::sampler::OrientationSampler::on_sample).
pub trait SensorSource {
    /// Whether the platform exposes the north-referenced event channel.
    fn supports_absolute(&self) -> bool;

    /// Whether orientation access sits behind an explicit user consent prompt.
    fn requires_permission(&self) -> bool;

    /// Show the consent prompt and report whether access was granted.
    ///
    /// Only called when [`requires_permission`](Self::requires_permission)
    /// returns `true`.
    fn request_permission(&mut self) -> impl Future<Output = Result<bool>>;

    /// Register the orientation listener for the given channel.
    fn subscribe(&mut self, mode: CaptureMode) -> Subscription;

    /// Lock the screen to portrait. Best-effort; the default does nothing.
    fn lock_portrait(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Handle for a registered orientation listener.
///
/// Cancelling (or dropping) the handle unregisters the listener exactly once.
pub struct Subscription {
    mode: CaptureMode,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(mode: CaptureMode, release: impl FnOnce() + 'static) -> Self {
        Self {
            mode,
            release: Some(Box::new(release)),
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Unregister the listener. Further calls do nothing.
    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("mode", &self.mode)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Resolve the capture channel once for a session.
pub fn capture_mode_for<S: SensorSource>(source: &S) -> CaptureMode {
    if source.supports_absolute() {
        CaptureMode::Absolute
    } else {
        CaptureMode::Relative
    }
}
