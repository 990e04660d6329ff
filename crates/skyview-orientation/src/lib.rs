//! Device orientation to sky-view direction.
//!
//! Converts phone orientation samples (`alpha`/`beta`/`gamma`, optionally a
//! compass heading) into a smoothed yaw/pitch/roll for a virtual telescope.
//!
//! Pipeline per accepted sample:
//!
//! 1. [`frame::device_pointing`]: Euler angles to a geographic pointing vector and horizon roll.
//! 2. [`mapper::yaw_pitch`]: pointing vector to observer yaw and pitch.
//! 3. [`smoothing::AdaptiveSmoother`]: dead-zone, adaptive-gain filtering of yaw and pitch.
//! 4. [`binder::ViewBinder`]: clamp and write to the [`binder::ViewConsumer`].
//!
//! [`sampler::OrientationSampler`] owns the session and drives the pipeline.

pub mod binder;
pub mod frame;
pub mod mapper;
pub mod sampler;
pub mod smoothing;
pub mod source;
pub mod types;

pub use binder::{ViewBinder, ViewConsumer};
pub use sampler::{
    OrientationSampler, SampleOutcome, SamplerSettings, SessionState, StartError, StartOutcome,
};
pub use smoothing::{AdaptiveSmoother, SmoothingParams};
pub use source::{SensorSource, Subscription};
pub use types::{CaptureMode, EulerAngles, OrientationSample, ViewTarget, WorldVector};

/// Unsmoothed view target for a set of Euler angles.
pub fn raw_view_target(angles: EulerAngles) -> ViewTarget {
    let pointing = frame::device_pointing(angles);
    let (yaw, pitch) = mapper::yaw_pitch(&pointing.vector);
    ViewTarget {
        yaw,
        pitch,
        roll: pointing.roll,
    }
}
