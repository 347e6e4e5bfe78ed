// ==============================================================================
// contact.rs — TRIPLE-RAY GROUND SENSING
// ------------------------------------------------------------------------------
// Resolves ground contact for one wheel by casting three rays along body-down:
// - center: from the wheel attach point
// - left / right: attach point shifted +/- WHEEL_HALF_WIDTH along the wheel's
//   (steered) axle-left direction
// Ray length = relaxed_length + wheel_radius.
//
// A ray only counts when it hits a surface whose normal has
// dot(normal, world_up) >= MIN_GROUND_DOT. All three rays must count, so a
// single spike under one ray never anchors the suspension.
//
// update_wheel_contact(...):
// - no contact: wheel relaxes (compression -= AIRBORNE_RELAX_RATE * dt)
// - contact:    compression = 1 - clamp(suspension_length / relaxed, 0, 1)
//
// Notes:
// - This file does NOT apply forces. The left/right hits are returned so the
//   friction model can build the contact basis from them.
// ==============================================================================

use rapier3d::prelude::{Point, Real, Vector};
use tracing::trace;

use crate::drive_core::axle::AxleConfig;
use crate::drive_core::types::{
    local_left, world_up, yaw_rotation, ChassisHost, TraceHit, WheelSide,
};
use crate::drive_core::wheel::WheelState;

/// Half the spacing of the two edge rays (world units).
pub const WHEEL_HALF_WIDTH: Real = 0.085;

/// Minimum dot(hit normal, world up) for a hit to count as ground.
pub const MIN_GROUND_DOT: Real = 0.6;

/// Compression lost per second while airborne.
pub const AIRBORNE_RELAX_RATE: Real = 1.0;

/// Three validated ground hits under one wheel.
#[derive(Debug, Clone, Copy)]
pub struct GroundContact {
    pub center: TraceHit,
    pub left: TraceHit,
    pub right: TraceHit,
}

impl GroundContact {
    /// Center-ray distance minus the wheel radius.
    pub fn suspension_length(&self, wheel_radius: Real) -> Real {
        self.center.distance - wheel_radius
    }
}

#[inline]
pub fn is_ground(hit: &TraceHit) -> bool {
    hit.normal.dot(&world_up()) >= MIN_GROUND_DOT
}

/// World-space axle-left direction of a wheel steered by `yaw`.
pub fn wheel_axle_left<H: ChassisHost + ?Sized>(host: &H, yaw: Real) -> Vector<Real> {
    host.pose().rotation * (yaw_rotation(yaw) * local_left())
}

/// Cast the three wheel rays; `None` unless all of them hit valid ground.
pub fn probe_ground<H: ChassisHost + ?Sized>(
    host: &H,
    axle: &AxleConfig,
    yaw: Real,
    attach: Point<Real>,
    down: Vector<Real>,
) -> Option<GroundContact> {
    let trace_length = axle.relaxed_length + axle.wheel_radius;
    let axle_left = wheel_axle_left(host, yaw);

    let cast = |origin: Point<Real>| {
        host.cast_ray(origin, origin + down * trace_length)
            .filter(is_ground)
    };

    let left = cast(attach + axle_left * WHEEL_HALF_WIDTH);
    let right = cast(attach - axle_left * WHEEL_HALF_WIDTH);
    let center = cast(attach);

    match (center, left, right) {
        (Some(center), Some(left), Some(right)) => Some(GroundContact { center, left, right }),
        _ => None,
    }
}

/// Update grounded state and compression from a probe result.
pub fn update_wheel_contact(
    wheel: &mut WheelState,
    contact: Option<&GroundContact>,
    wheel_radius: Real,
    relaxed_length: Real,
    dt: Real,
) {
    match contact {
        None => {
            wheel.contact = None;
            wheel.push_compression(wheel.compression - dt * AIRBORNE_RELAX_RATE);
        }
        Some(c) => {
            let suspension_length = c.suspension_length(wheel_radius);
            let ratio = (suspension_length / relaxed_length).clamp(0.0, 1.0);
            wheel.contact = Some(c.center);
            wheel.push_compression(1.0 - ratio);
        }
    }
}

/// Probe + update for one wheel of `axle`.
pub fn sense_wheel<H: ChassisHost + ?Sized>(
    host: &H,
    axle: &mut AxleConfig,
    side: WheelSide,
    attach: Point<Real>,
    down: Vector<Real>,
    dt: Real,
) -> Option<GroundContact> {
    let yaw = axle.wheel(side).steer_yaw;
    let contact = probe_ground(host, axle, yaw, attach, down);

    let (radius, relaxed) = (axle.wheel_radius, axle.relaxed_length);
    let wheel = axle.wheel_mut(side);
    update_wheel_contact(wheel, contact.as_ref(), radius, relaxed, dt);

    trace!(
        ?side,
        grounded = contact.is_some(),
        compression = wheel.compression,
        "wheel contact"
    );

    contact
}
