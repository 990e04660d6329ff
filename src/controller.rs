use skyview_input::gesture::CancellationMonitor;
use skyview_input::{CancelReason, TouchPoint, Viewport};
use skyview_orientation::{
    OrientationSample, OrientationSampler, SampleOutcome, SensorSource, StartError, StartOutcome,
    ViewConsumer,
};
use std::time::Instant;
use tracing::info;

/// One orientation session plus the monitor that can end it.
///
/// The host forwards every platform event here. The monitor runs beside the
/// pipeline; when it fires, its callback runs first and then the session is
/// stopped exactly as an explicit [`stop`](Self::stop) would.
pub struct GyroController<S: SensorSource, C: ViewConsumer> {
    sampler: OrientationSampler<S, C>,
    monitor: CancellationMonitor,
}

impl<S: SensorSource, C: ViewConsumer> GyroController<S, C> {
    pub fn new(sampler: OrientationSampler<S, C>, monitor: CancellationMonitor) -> Self {
        Self { sampler, monitor }
    }

    pub async fn start(&mut self, consumer: Option<C>) -> Result<StartOutcome, StartError> {
        let outcome = self.sampler.start(consumer).await?;
        if let StartOutcome::Started(_) = outcome {
            self.monitor.arm();
        }
        Ok(outcome)
    }

    /// Stop the session. Returns the consumer if a session was running.
    pub fn stop(&mut self) -> Option<C> {
        self.monitor.disarm();
        self.sampler.stop()
    }

    pub fn on_orientation(&mut self, sample: &OrientationSample, at: Instant) -> SampleOutcome {
        self.sampler.on_sample(sample, at)
    }

    pub fn on_touch_start(&mut self, touches: &[TouchPoint]) {
        self.monitor.on_touch_start(touches);
    }

    pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> Option<CancelReason> {
        let reason = self.monitor.on_touch_move(touches)?;
        self.cancel(reason);
        Some(reason)
    }

    pub fn on_touch_end(&mut self) {
        self.monitor.on_touch_end();
    }

    pub fn on_resize(&mut self, viewport: Viewport) -> Option<CancelReason> {
        let reason = self.monitor.on_resize(viewport)?;
        self.cancel(reason);
        Some(reason)
    }

    fn cancel(&mut self, reason: CancelReason) {
        if self.stop().is_some() {
            info!(?reason, "Orientation control handed back to the user");
        }
    }

    pub fn is_active(&self) -> bool {
        self.sampler.is_active()
    }

    pub fn sampler(&self) -> &OrientationSampler<S, C> {
        &self.sampler
    }
}
