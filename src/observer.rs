use anyhow::{ensure, Result};
use skyview_orientation::ViewConsumer;
use std::cell::RefCell;
use std::rc::Rc;

/// Stand-in for the sky engine's observer: the view the renderer draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Azimuth, radians. 0 = north, π/2 = east.
    pub yaw: f64,
    /// Altitude above the horizon, radians.
    pub pitch: f64,
    /// Horizon rotation about the view axis, radians.
    pub roll: f64,
    /// Field of view, radians.
    pub fov: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov: 60_f64.to_radians(),
        }
    }
}

/// Shared handle to an [`Observer`], as held by both the renderer and the sampler.
#[derive(Debug, Clone, Default)]
pub struct ObserverHandle(Rc<RefCell<Observer>>);

impl ObserverHandle {
    pub fn new(observer: Observer) -> Self {
        Self(Rc::new(RefCell::new(observer)))
    }

    pub fn snapshot(&self) -> Observer {
        *self.0.borrow()
    }

    fn write(&self, name: &str, value: f64, apply: impl FnOnce(&mut Observer)) -> Result<()> {
        ensure!(value.is_finite(), "rejected non-finite {name}: {value}");
        apply(&mut self.0.borrow_mut());
        Ok(())
    }
}

impl ViewConsumer for ObserverHandle {
    fn roll(&self) -> f64 {
        self.0.borrow().roll
    }

    fn fov(&self) -> f64 {
        self.0.borrow().fov
    }

    fn set_yaw(&mut self, yaw: f64) -> Result<()> {
        self.write("yaw", yaw, |o| o.yaw = yaw)
    }

    fn set_pitch(&mut self, pitch: f64) -> Result<()> {
        self.write("pitch", pitch, |o| o.pitch = pitch)
    }

    fn set_roll(&mut self, roll: f64) -> Result<()> {
        self.write("roll", roll, |o| o.roll = roll)
    }

    fn set_fov(&mut self, fov: f64) -> Result<()> {
        ensure!(fov > 0.0, "rejected field of view {fov}");
        self.write("fov", fov, |o| o.fov = fov)
    }
}
