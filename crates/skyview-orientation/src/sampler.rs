use crate::binder::{ViewBinder, ViewConsumer};
use crate::smoothing::{AdaptiveSmoother, SmoothingParams};
use crate::source::{capture_mode_for, SensorSource, Subscription};
use crate::types::{CaptureMode, OrientationSample, ViewTarget};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Default minimum spacing between processed samples (~60 Hz).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(16);

/// Processed samples between debug heartbeats.
const HEARTBEAT_SAMPLES: u64 = 600;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("No view consumer supplied")]
    MissingConsumer,
    #[error("Orientation access was not granted")]
    PermissionDenied,
}

/// Successful result of [`OrientationSampler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was opened on the given channel.
    Started(CaptureMode),
    /// A session was already running; nothing changed.
    AlreadyActive,
}

/// What happened to one delivered sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// No session is running.
    Inactive,
    /// Arrived before the update interval elapsed.
    Throttled,
    /// One of the angles was missing.
    Malformed,
    /// The target was written to the consumer.
    Applied(ViewTarget),
    /// The consumer rejected the write. The session continues.
    ApplyFailed(ViewTarget),
}

/// Per-sampler tunables.
#[derive(Debug, Clone, Copy)]
pub struct SamplerSettings {
    pub update_interval: Duration,
    pub smoothing: SmoothingParams,
    /// Field of view (radians) forced on the consumer while a session runs.
    pub ar_fov: Option<f64>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            smoothing: SmoothingParams::default(),
            ar_fov: None,
        }
    }
}

/// Snapshot of the session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub active: bool,
    pub permission_granted: bool,
    pub last_sample: Option<Instant>,
}

struct Session<C: ViewConsumer> {
    binder: ViewBinder<C>,
    subscription: Subscription,
    smoother: AdaptiveSmoother,
    last_sample: Option<Instant>,
    processed: u64,
}

/// Turns platform orientation events into view targets for one consumer.
///
/// At most one session runs at a time. While no session runs every sample
/// is ignored.
pub struct OrientationSampler<S: SensorSource, C: ViewConsumer> {
    source: S,
    settings: SamplerSettings,
    session: Option<Session<C>>,
}

impl<S: SensorSource, C: ViewConsumer> OrientationSampler<S, C> {
    pub fn new(source: S, settings: SamplerSettings) -> Self {
        Self {
            source,
            settings,
            session: None,
        }
    }

    /// Ask for orientation access.
    ///
    /// Platforms without a consent gate grant immediately. A failing prompt
    /// counts as a refusal.
    pub async fn request_permission(&mut self) -> bool {
        if !self.source.requires_permission() {
            return true;
        }
        match self.source.request_permission().await {
            Ok(granted) => {
                info!(granted, "Orientation permission prompt answered");
                granted
            }
            Err(e) => {
                warn!(?e, "Orientation permission request failed");
                false
            }
        }
    }

    /// Open a session that drives `consumer`.
    ///
    /// Calling this while a session runs is a no-op and leaves the running
    /// session untouched.
    pub async fn start(&mut self, consumer: Option<C>) -> Result<StartOutcome, StartError> {
        if self.session.is_some() {
            debug!("Orientation session already active");
            return Ok(StartOutcome::AlreadyActive);
        }

        let consumer = consumer.ok_or(StartError::MissingConsumer)?;

        if !self.request_permission().await {
            warn!("Orientation permission denied");
            return Err(StartError::PermissionDenied);
        }

        let mode = capture_mode_for(&self.source);
        let subscription = self.source.subscribe(mode);

        if let Err(e) = self.source.lock_portrait() {
            warn!(?e, "Portrait lock unavailable");
        }

        self.session = Some(Session {
            binder: ViewBinder::attach(consumer, self.settings.ar_fov),
            subscription,
            smoother: AdaptiveSmoother::new(self.settings.smoothing),
            last_sample: None,
            processed: 0,
        });

        info!(?mode, "Orientation session started");
        Ok(StartOutcome::Started(mode))
    }

    /// Handle one delivered orientation event observed at `at`.
    pub fn on_sample(&mut self, raw: &OrientationSample, at: Instant) -> SampleOutcome {
        let Some(session) = self.session.as_mut() else {
            return SampleOutcome::Inactive;
        };

        if let Some(last) = session.last_sample {
            if at.saturating_duration_since(last) < self.settings.update_interval {
                return SampleOutcome::Throttled;
            }
        }
        session.last_sample = Some(at);

        let Some(angles) = raw.euler_angles() else {
            trace!(?raw, "Dropping incomplete orientation sample");
            return SampleOutcome::Malformed;
        };

        let target = crate::raw_view_target(angles);
        let target = ViewTarget {
            yaw: session.smoother.smooth_yaw(target.yaw),
            pitch: session.smoother.smooth_pitch(target.pitch),
            roll: target.roll,
        };

        session.processed += 1;
        if session.processed % HEARTBEAT_SAMPLES == 0 {
            debug!(processed = session.processed, "Orientation samples processed");
        }

        match session.binder.apply(target) {
            Ok(written) => SampleOutcome::Applied(written),
            Err(e) => {
                warn!(?e, "Error updating view");
                SampleOutcome::ApplyFailed(target.clamped())
            }
        }
    }

    /// End the session and hand the consumer back.
    ///
    /// Returns `None` if no session was running.
    pub fn stop(&mut self) -> Option<C> {
        let mut session = self.session.take()?;
        session.subscription.cancel();
        let consumer = session.binder.detach();
        info!(processed = session.processed, "Orientation session stopped");
        Some(consumer)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(session) => SessionState {
                active: true,
                permission_granted: true,
                last_sample: session.last_sample,
            },
            None => SessionState {
                active: false,
                permission_granted: false,
                last_sample: None,
            },
        }
    }

    pub fn capture_mode(&self) -> Option<CaptureMode> {
        self.session.as_ref().map(|s| s.subscription.mode())
    }

    /// Consumer of the running session, if any.
    pub fn consumer(&self) -> Option<&C> {
        self.session.as_ref().map(|s| s.binder.consumer())
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::binder::tests::FakeObserver;
    use anyhow::Result;
    use std::cell::Cell;
    use std::f64::consts::FRAC_PI_2;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub(crate) enum Prompt {
        NotRequired,
        Grant,
        Deny,
        Fail,
    }

    /// Source that records how listeners are registered.
    pub(crate) struct FakeSource {
        pub absolute: bool,
        pub prompt: Prompt,
        pub lock_fails: bool,
        pub subscribed: Rc<Cell<u32>>,
        pub listening: Rc<Cell<u32>>,
        pub prompts: u32,
    }

    impl FakeSource {
        pub(crate) fn new(prompt: Prompt) -> Self {
            Self {
                absolute: true,
                prompt,
                lock_fails: false,
                subscribed: Rc::new(Cell::new(0)),
                listening: Rc::new(Cell::new(0)),
                prompts: 0,
            }
        }
    }

    impl SensorSource for FakeSource {
        fn supports_absolute(&self) -> bool {
            self.absolute
        }

        fn requires_permission(&self) -> bool {
            self.prompt != Prompt::NotRequired
        }

        async fn request_permission(&mut self) -> Result<bool> {
            self.prompts += 1;
            match self.prompt {
                Prompt::NotRequired | Prompt::Grant => Ok(true),
                Prompt::Deny => Ok(false),
                Prompt::Fail => anyhow::bail!("prompt dismissed without a user gesture"),
            }
        }

        fn subscribe(&mut self, mode: CaptureMode) -> Subscription {
            self.subscribed.set(self.subscribed.get() + 1);
            self.listening.set(self.listening.get() + 1);
            let listening = self.listening.clone();
            Subscription::new(mode, move || listening.set(listening.get() - 1))
        }

        fn lock_portrait(&mut self) -> Result<()> {
            if self.lock_fails {
                anyhow::bail!("screen orientation lock not supported");
            }
            Ok(())
        }
    }

    fn sampler(source: FakeSource) -> OrientationSampler<FakeSource, FakeObserver> {
        OrientationSampler::new(source, SamplerSettings::default())
    }

    fn ms(base: Instant, offset: u64) -> Instant {
        base + Duration::from_millis(offset)
    }

    #[tokio::test]
    async fn start_twice_is_a_no_op() {
        let source = FakeSource::new(Prompt::NotRequired);
        let subscribed = source.subscribed.clone();
        let mut sampler = sampler(source);
        let t0 = Instant::now();

        let first = sampler.start(Some(FakeObserver::default())).await;
        assert_eq!(first.unwrap(), StartOutcome::Started(CaptureMode::Absolute));

        sampler.on_sample(&OrientationSample::new(0.0, 90.0, 0.0), t0);
        let before = sampler.state();

        let second = sampler.start(Some(FakeObserver::default())).await;
        assert_eq!(second.unwrap(), StartOutcome::AlreadyActive);
        assert_eq!(subscribed.get(), 1);
        assert_eq!(sampler.state(), before);

        // Smoothing history survived: a small step is filtered, not seeded.
        let outcome = sampler.on_sample(&OrientationSample::new(0.5, 90.0, 0.0), ms(t0, 20));
        let SampleOutcome::Applied(target) = outcome else {
            panic!("expected an applied sample, got {outcome:?}");
        };
        let raw_yaw = -(0.5_f64.to_radians());
        assert!(target.yaw.abs() < raw_yaw.abs());
    }

    #[tokio::test]
    async fn missing_consumer_is_rejected() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        let result = sampler.start(None).await;
        assert!(matches!(result, Err(StartError::MissingConsumer)));
        assert!(!sampler.is_active());
    }

    #[tokio::test]
    async fn denied_permission_blocks_start() {
        let source = FakeSource::new(Prompt::Deny);
        let subscribed = source.subscribed.clone();
        let mut sampler = sampler(source);
        let result = sampler.start(Some(FakeObserver::default())).await;
        assert!(matches!(result, Err(StartError::PermissionDenied)));
        assert_eq!(subscribed.get(), 0);
        assert!(!sampler.state().permission_granted);
    }

    #[tokio::test]
    async fn failing_prompt_counts_as_denied() {
        let mut sampler = sampler(FakeSource::new(Prompt::Fail));
        assert!(!sampler.request_permission().await);
        let result = sampler.start(Some(FakeObserver::default())).await;
        assert!(matches!(result, Err(StartError::PermissionDenied)));
    }

    #[tokio::test]
    async fn ungated_platform_skips_prompt() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        assert!(sampler.request_permission().await);
        assert_eq!(sampler.source().prompts, 0);

        let mut gated = self::sampler(FakeSource::new(Prompt::Grant));
        assert!(gated.request_permission().await);
        assert_eq!(gated.source().prompts, 1);
    }

    #[tokio::test]
    async fn relative_channel_when_absolute_missing() {
        let mut source = FakeSource::new(Prompt::NotRequired);
        source.absolute = false;
        let mut sampler = sampler(source);
        let outcome = sampler.start(Some(FakeObserver::default())).await.unwrap();
        assert_eq!(outcome, StartOutcome::Started(CaptureMode::Relative));
        assert_eq!(sampler.capture_mode(), Some(CaptureMode::Relative));
    }

    #[tokio::test]
    async fn lock_failure_does_not_abort_start() {
        let mut source = FakeSource::new(Prompt::Grant);
        source.lock_fails = true;
        let mut sampler = sampler(source);
        assert!(sampler.start(Some(FakeObserver::default())).await.is_ok());
        assert!(sampler.is_active());
    }

    #[tokio::test]
    async fn throttles_and_drops_incomplete_samples() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        let t0 = Instant::now();
        let sample = OrientationSample::new(0.0, 90.0, 0.0);

        assert_eq!(sampler.on_sample(&sample, t0), SampleOutcome::Inactive);

        sampler.start(Some(FakeObserver::default())).await.unwrap();
        assert!(matches!(sampler.on_sample(&sample, t0), SampleOutcome::Applied(_)));
        assert_eq!(sampler.on_sample(&sample, ms(t0, 10)), SampleOutcome::Throttled);
        assert!(matches!(
            sampler.on_sample(&sample, ms(t0, 16)),
            SampleOutcome::Applied(_)
        ));

        let incomplete = OrientationSample {
            gamma: None,
            ..sample
        };
        assert_eq!(sampler.on_sample(&incomplete, ms(t0, 40)), SampleOutcome::Malformed);
        // The dropped sample still counted toward the throttle window.
        assert_eq!(sampler.on_sample(&sample, ms(t0, 50)), SampleOutcome::Throttled);
        assert_eq!(sampler.state().last_sample, Some(ms(t0, 40)));
    }

    #[tokio::test]
    async fn first_sample_is_applied_unsmoothed() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        sampler.start(Some(FakeObserver::default())).await.unwrap();

        let outcome = sampler.on_sample(&OrientationSample::new(90.0, 90.0, 0.0), Instant::now());
        let SampleOutcome::Applied(target) = outcome else {
            panic!("expected an applied sample, got {outcome:?}");
        };
        assert!((target.yaw + FRAC_PI_2).abs() < 1e-9);
        assert!(target.pitch.abs() < 1e-9);

        let observer = sampler.consumer().unwrap();
        assert!((observer.yaw + FRAC_PI_2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn compass_heading_drives_yaw() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        sampler.start(Some(FakeObserver::default())).await.unwrap();

        // Heading 90 (east, clockwise) arrives as alpha 270, i.e. yaw +π/2.
        let sample = OrientationSample::new(12.0, 90.0, 0.0).with_compass_heading(90.0);
        let SampleOutcome::Applied(target) = sampler.on_sample(&sample, Instant::now()) else {
            panic!("sample was not applied");
        };
        assert!((target.yaw - FRAC_PI_2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pitch_stays_bounded_for_any_tilt() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        sampler.start(Some(FakeObserver::default())).await.unwrap();
        let t0 = Instant::now();

        let mut tick = 0;
        for beta in [0.0, 180.0, -180.0, 90.0, -90.0, 179.9, 0.1, 45.0] {
            for gamma in [-90.0, -45.0, 0.0, 45.0, 90.0] {
                tick += 20;
                let outcome =
                    sampler.on_sample(&OrientationSample::new(33.0, beta, gamma), ms(t0, tick));
                let SampleOutcome::Applied(target) = outcome else {
                    panic!("expected an applied sample, got {outcome:?}");
                };
                assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&target.pitch));
                assert!(target.yaw.is_finite() && target.roll.is_finite());
            }
        }
    }

    #[tokio::test]
    async fn consumer_failure_keeps_session_alive() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        let observer = FakeObserver {
            fail_writes: true,
            ..Default::default()
        };
        sampler.start(Some(observer)).await.unwrap();
        let t0 = Instant::now();

        let sample = OrientationSample::new(0.0, 90.0, 0.0);
        assert!(matches!(
            sampler.on_sample(&sample, t0),
            SampleOutcome::ApplyFailed(_)
        ));
        assert!(sampler.is_active());
        assert!(matches!(
            sampler.on_sample(&sample, ms(t0, 20)),
            SampleOutcome::ApplyFailed(_)
        ));
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_restores_view() {
        let source = FakeSource::new(Prompt::NotRequired);
        let listening = source.listening.clone();
        let settings = SamplerSettings {
            ar_fov: Some(45_f64.to_radians()),
            ..Default::default()
        };
        let mut sampler = OrientationSampler::new(source, settings);
        let observer = FakeObserver {
            roll: 0.1,
            fov: 1.0,
            ..Default::default()
        };

        sampler.start(Some(observer)).await.unwrap();
        assert_eq!(listening.get(), 1);
        sampler.on_sample(&OrientationSample::new(0.0, 60.0, 20.0), Instant::now());

        let observer = sampler.stop().expect("session was running");
        assert_eq!(listening.get(), 0);
        assert_eq!(observer.roll, 0.1);
        assert_eq!(observer.fov, 1.0);

        assert!(sampler.stop().is_none());
        assert!(!sampler.state().active);
        assert_eq!(
            sampler.on_sample(&OrientationSample::new(0.0, 90.0, 0.0), Instant::now()),
            SampleOutcome::Inactive
        );
    }

    #[tokio::test]
    async fn restart_reseeds_smoothing() {
        let mut sampler = sampler(FakeSource::new(Prompt::NotRequired));
        let t0 = Instant::now();

        sampler.start(Some(FakeObserver::default())).await.unwrap();
        sampler.on_sample(&OrientationSample::new(0.0, 90.0, 0.0), t0);
        let observer = sampler.stop().unwrap();

        sampler.start(Some(observer)).await.unwrap();
        let outcome = sampler.on_sample(&OrientationSample::new(90.0, 90.0, 0.0), ms(t0, 5));
        let SampleOutcome::Applied(target) = outcome else {
            panic!("expected an applied sample, got {outcome:?}");
        };
        assert!((target.yaw + FRAC_PI_2).abs() < 1e-9);
    }
}
