use rapier3d::prelude::Real;
use serde::Serialize;

/// Orchestrator-private state of one vehicle.
///
/// The four flags are re-derived every tick by input resolution. The three
/// timers persist across ticks and count down towards zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VehicleState {
    pub is_accelerating: bool,
    pub is_reverse_accelerating: bool,
    pub is_braking: bool,
    pub is_hand_braking: bool,

    /// Signed, positive = forward thrust (N * s, divided by dt on application).
    pub engine_force_magnitude: Real,

    pub after_flight_slippery_timer: Real,
    pub brake_slippery_timer: Real,
    pub hand_brake_slippery_timer: Real,
}

impl VehicleState {
    pub fn decay_timers(&mut self, dt: Real) {
        for timer in [
            &mut self.after_flight_slippery_timer,
            &mut self.brake_slippery_timer,
            &mut self.hand_brake_slippery_timer,
        ] {
            *timer = (*timer - dt).max(0.0);
        }
    }

    pub fn is_driving(&self) -> bool {
        self.is_accelerating || self.is_reverse_accelerating
    }
}
