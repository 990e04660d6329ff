//! Replay of recorded host events against a [`GyroController`].
//!
//! Event logs are JSON lines, one event per line:
//!
//! ```text
//! {"type":"start"}
//! {"type":"orientation","at_ms":0,"alpha":0.0,"beta":90.0,"gamma":0.0}
//! {"type":"orientation","at_ms":20,"alpha":null,"beta":90.0,"gamma":0.0}
//! {"type":"touch_start","touches":[{"x":100.0,"y":100.0}]}
//! {"type":"touch_move","touches":[{"x":130.0,"y":100.0}]}
//! {"type":"resize","width":800,"height":400}
//! {"type":"stop"}
//! ```

use crate::controller::GyroController;
use crate::observer::{Observer, ObserverHandle};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use skyview_input::{CancelReason, TouchPoint, Viewport};
use skyview_orientation::{
    CaptureMode, OrientationSample, SampleOutcome, SensorSource, StartOutcome, Subscription,
};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read event log: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A platform event as recorded by the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// User switched orientation control on.
    Start,
    /// User switched orientation control off.
    Stop,
    Orientation {
        /// Milliseconds since the start of the recording.
        at_ms: u64,
        #[serde(flatten)]
        sample: OrientationSample,
    },
    TouchStart {
        touches: Vec<TouchPoint>,
    },
    TouchMove {
        touches: Vec<TouchPoint>,
    },
    TouchEnd,
    Resize {
        width: u32,
        height: u32,
    },
}

/// Parse a JSON-lines event log. Blank lines and `#` comments are skipped.
pub fn parse_events(text: &str) -> Result<Vec<HostEvent>, ReplayError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                line: i + 1,
                source,
            })
        })
        .collect()
}

pub fn load_events(path: &Path) -> Result<Vec<HostEvent>, ReplayError> {
    let text = std::fs::read_to_string(path)?;
    parse_events(&text)
}

/// How the simulated platform answers the orientation permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PermissionMode {
    /// No consent gate (most Android browsers).
    NotRequired,
    /// Gate present, user accepts.
    Grant,
    /// Gate present, user declines.
    Deny,
    /// Gate present, the prompt itself fails.
    Error,
}

/// Sensor source backed by a recording instead of live hardware.
pub struct ReplaySource {
    absolute: bool,
    permission: PermissionMode,
    portrait_lock: bool,
    listening: Rc<Cell<bool>>,
}

impl ReplaySource {
    pub fn new(absolute: bool, permission: PermissionMode, portrait_lock: bool) -> Self {
        Self {
            absolute,
            permission,
            portrait_lock,
            listening: Rc::new(Cell::new(false)),
        }
    }

    /// Whether an orientation listener is currently registered.
    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }
}

impl SensorSource for ReplaySource {
    fn supports_absolute(&self) -> bool {
        self.absolute
    }

    fn requires_permission(&self) -> bool {
        self.permission != PermissionMode::NotRequired
    }

    async fn request_permission(&mut self) -> Result<bool> {
        // The prompt resolves on a later turn of the event loop.
        tokio::task::yield_now().await;
        match self.permission {
            PermissionMode::NotRequired | PermissionMode::Grant => Ok(true),
            PermissionMode::Deny => Ok(false),
            PermissionMode::Error => anyhow::bail!("permission prompt requires a user gesture"),
        }
    }

    fn subscribe(&mut self, mode: CaptureMode) -> Subscription {
        debug!(?mode, "Orientation listener registered");
        self.listening.set(true);
        let listening = self.listening.clone();
        Subscription::new(mode, move || {
            listening.set(false);
            debug!("Orientation listener removed");
        })
    }

    fn lock_portrait(&mut self) -> Result<()> {
        if !self.portrait_lock {
            anyhow::bail!("screen orientation lock not supported");
        }
        Ok(())
    }
}

/// Counters gathered over one replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub sessions_started: u32,
    pub start_failures: u32,
    pub applied: u32,
    pub apply_failures: u32,
    pub throttled: u32,
    pub malformed: u32,
    /// Orientation events delivered while no listener was registered.
    pub unheard: u32,
    pub cancellations: Vec<CancelReason>,
    pub final_view: Option<Observer>,
}

/// Feed `events` through `controller`, driving `observer`.
pub async fn run_replay(
    controller: &mut GyroController<ReplaySource, ObserverHandle>,
    observer: &ObserverHandle,
    events: &[HostEvent],
) -> ReplayReport {
    let mut report = ReplayReport::default();
    let origin = Instant::now();

    for event in events {
        match event {
            HostEvent::Start => match controller.start(Some(observer.clone())).await {
                Ok(StartOutcome::Started(mode)) => {
                    info!(?mode, "Replay session started");
                    report.sessions_started += 1;
                }
                Ok(StartOutcome::AlreadyActive) => debug!("Start ignored, session running"),
                Err(e) => {
                    warn!(%e, "Orientation control unavailable");
                    report.start_failures += 1;
                }
            },
            HostEvent::Stop => {
                controller.stop();
            }
            HostEvent::Orientation { at_ms, sample } => {
                if !controller.sampler().source().is_listening() {
                    report.unheard += 1;
                    continue;
                }
                let at = origin + Duration::from_millis(*at_ms);
                match controller.on_orientation(sample, at) {
                    SampleOutcome::Applied(target) => {
                        report.applied += 1;
                        println!(
                            "{at_ms:>8} ms  yaw {:>8.2}°  pitch {:>7.2}°  roll {:>7.2}°",
                            target.yaw.to_degrees(),
                            target.pitch.to_degrees(),
                            target.roll.to_degrees(),
                        );
                    }
                    SampleOutcome::ApplyFailed(_) => report.apply_failures += 1,
                    SampleOutcome::Throttled => report.throttled += 1,
                    SampleOutcome::Malformed => report.malformed += 1,
                    SampleOutcome::Inactive => report.unheard += 1,
                }
            }
            HostEvent::TouchStart { touches } => controller.on_touch_start(touches),
            HostEvent::TouchMove { touches } => {
                if let Some(reason) = controller.on_touch_move(touches) {
                    report.cancellations.push(reason);
                }
            }
            HostEvent::TouchEnd => controller.on_touch_end(),
            HostEvent::Resize { width, height } => {
                let viewport = Viewport {
                    width: *width,
                    height: *height,
                };
                if let Some(reason) = controller.on_resize(viewport) {
                    report.cancellations.push(reason);
                }
            }
        }
    }

    report.final_view = Some(observer.snapshot());
    report
}
