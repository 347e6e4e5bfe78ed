// ==============================================================================
// suspension.rs — SPRING / DAMPER FORCE
// ------------------------------------------------------------------------------
// Per grounded wheel, once per tick:
//   magnitude = -stiffness * compression
//               - damping * (compression - compression_previous) / dt
//   magnitude *= dot(hit normal, -body_down)
//   force     = body_down * magnitude        (applied at the center hit)
//
// A negative magnitude along body_down pushes the chassis up. The normal
// factor fades the spring out on slopes the chassis is not aligned with.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use crate::drive_core::contact::GroundContact;
use crate::drive_core::types::ChassisHost;
use crate::drive_core::wheel::WheelState;

/// Signed spring + damper magnitude along body-down.
#[inline]
pub fn suspension_force_magnitude(
    compression: Real,
    compression_previous: Real,
    stiffness: Real,
    damping: Real,
    dt: Real,
) -> Real {
    let spring = -stiffness * compression;
    let damper = -damping * (compression - compression_previous) / dt;
    spring + damper
}

/// Apply the suspension force for one grounded wheel. Returns the force.
pub fn apply_suspension<H: ChassisHost + ?Sized>(
    host: &mut H,
    wheel: &WheelState,
    contact: &GroundContact,
    stiffness: Real,
    damping: Real,
    down: Vector<Real>,
    dt: Real,
) -> Vector<Real> {
    let magnitude = suspension_force_magnitude(
        wheel.compression,
        wheel.compression_previous,
        stiffness,
        damping,
        dt,
    ) * contact.center.normal.dot(&-down);

    let force = down * magnitude;
    host.apply_force_at_point(force, contact.center.position);
    force
}
