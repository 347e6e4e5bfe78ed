use rapier3d::prelude::Real;
use serde::Serialize;

use crate::drive_core::types::{TraceHit, WheelId};

/// Per-wheel runtime state, owned by its axle.
#[derive(Debug, Clone, Default)]
pub struct WheelState {
    /// Center ground trace of the last tick; `None` while airborne.
    pub contact: Option<TraceHit>,
    /// Wheel yaw relative to the chassis (radians, positive = right).
    pub steer_yaw: Real,
    /// Accumulated spin for the visual layer (radians, unbounded).
    pub visual_spin: Real,
    /// 0 = fully extended, 1 = fully compressed.
    pub compression: Real,
    /// Compression of the previous tick (damper derivative only).
    pub compression_previous: Real,
}

impl WheelState {
    pub fn is_grounded(&self) -> bool {
        self.contact.is_some()
    }

    /// Store this tick's compression, keeping the previous value for the damper.
    pub fn push_compression(&mut self, compression: Real) {
        self.compression_previous = self.compression;
        self.compression = compression.clamp(0.0, 1.0);
    }

    /// Compression rate since the previous tick (1/s).
    pub fn compression_velocity(&self, dt: Real) -> Real {
        (self.compression - self.compression_previous) / dt
    }
}

/// World transform of a wheel mesh, derived from the physics state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WheelPose {
    pub id: WheelId,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (i, j, k, w)
    pub grounded: bool,
    pub compression: f32,
    pub steer_yaw: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_compression_clamps_and_shifts() {
        let mut w = WheelState::default();
        w.push_compression(0.4);
        w.push_compression(1.7);
        assert_eq!(w.compression_previous, 0.4);
        assert_eq!(w.compression, 1.0);
        w.push_compression(-2.0);
        assert_eq!(w.compression, 0.0);
    }

    #[test]
    fn constant_compression_has_zero_velocity() {
        let mut w = WheelState::default();
        w.push_compression(0.35);
        w.push_compression(0.35);
        assert_eq!(w.compression_velocity(1.0 / 60.0), 0.0);
    }
}
