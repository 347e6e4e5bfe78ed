// ==============================================================================
// anti_roll.rs — ANTI-ROLL BAR
// ------------------------------------------------------------------------------
// Runs once per axle, after both wheels were sensed and loaded:
//   travel_l = 1 - clamp(compression_l, 0, 1)
//   travel_r = 1 - clamp(compression_r, 0, 1)
//   f        = (travel_l - travel_r) * anti_roll_force
//   left grounded  -> apply body_down *  f at the left center hit
//   right grounded -> apply body_down * -f at the right center hit
//
// The pair of forces pushes the more compressed side up and pulls the more
// extended side down. No net vertical force when both wheels are grounded.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use crate::drive_core::types::ChassisHost;
use crate::drive_core::wheel::WheelState;

/// Signed bar force for the left wheel (the right wheel gets `-f`).
#[inline]
pub fn anti_roll_force(left_compression: Real, right_compression: Real, stiffness: Real) -> Real {
    let travel_l = 1.0 - left_compression.clamp(0.0, 1.0);
    let travel_r = 1.0 - right_compression.clamp(0.0, 1.0);
    (travel_l - travel_r) * stiffness
}

pub fn apply_anti_roll<H: ChassisHost + ?Sized>(
    host: &mut H,
    left: &WheelState,
    right: &WheelState,
    stiffness: Real,
    down: Vector<Real>,
) -> Real {
    let f = anti_roll_force(left.compression, right.compression, stiffness);

    if let Some(hit) = &left.contact {
        host.apply_force_at_point(down * f, hit.position);
    }
    if let Some(hit) = &right.contact {
        host.apply_force_at_point(down * -f, hit.position);
    }
    f
}
