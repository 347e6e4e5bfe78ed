// ==============================================================================
// visual.rs — WHEEL MESH PLACEMENT
// ------------------------------------------------------------------------------
// Derives a world transform per wheel from physics state; nothing here feeds
// back into the force pipeline.
//
//   position = attach + body_down * relaxed_length * (1 - clamp(compression))
//   rotation = body_rot * yaw(steer_yaw [+ PI on the right]) * pitch(spin * dir)
//     dir = +1 left, -1 right (the right mesh is mirrored by the PI yaw)
//
// Spin advances while not braking:
//   spin += dot(velocity_at(sample), wheel_forward) / radius * dt
//   sample = contact hit when grounded, else the wheel position
// ==============================================================================

use std::f32::consts::PI;

use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{Point, Real, Vector};

use crate::drive_core::axle::AxleConfig;
use crate::drive_core::types::{
    local_down, local_forward, yaw_rotation, AxlePosition, ChassisHost, WheelId, WheelSide,
};
use crate::drive_core::wheel::WheelPose;

/// Wheel center for the current compression.
pub fn wheel_position(axle: &AxleConfig, side: WheelSide, attach: Point<Real>, down: Vector<Real>) -> Point<Real> {
    let compression = axle.wheel(side).compression.clamp(0.0, 1.0);
    attach + down * (axle.relaxed_length * (1.0 - compression))
}

/// Wheel mesh rotation relative to the world.
pub fn wheel_rotation(
    body: &UnitQuaternion<Real>,
    steer_yaw: Real,
    spin: Real,
    side: WheelSide,
) -> UnitQuaternion<Real> {
    let (yaw, direction) = match side {
        WheelSide::Left => (steer_yaw, 1.0),
        WheelSide::Right => (steer_yaw + PI, -1.0),
    };
    let pitch = UnitQuaternion::from_axis_angle(&Vector::x_axis(), spin * direction);
    body * yaw_rotation(yaw) * pitch
}

/// Advance the accumulated spin of one wheel from the chassis velocity.
pub fn advance_spin<H: ChassisHost + ?Sized>(
    host: &H,
    axle: &mut AxleConfig,
    side: WheelSide,
    position: Point<Real>,
    dt: Real,
) -> Real {
    let radius = axle.wheel_radius;
    let wheel = axle.wheel_mut(side);

    let forward = host.pose().rotation * (yaw_rotation(wheel.steer_yaw) * local_forward());
    let sample = wheel.contact.map(|hit| hit.position).unwrap_or(position);
    let forward_speed = host.velocity_at_point(&sample).dot(&forward);

    wheel.visual_spin += forward_speed / radius * dt;
    wheel.visual_spin
}

fn to_pose(id: WheelId, axle: &AxleConfig, position: Point<Real>, rotation: UnitQuaternion<Real>) -> WheelPose {
    let wheel = axle.wheel(id.side());
    let q = rotation.coords;
    WheelPose {
        id,
        position: [position.x, position.y, position.z],
        rotation: [q.x, q.y, q.z, q.w],
        grounded: wheel.is_grounded(),
        compression: wheel.compression,
        steer_yaw: wheel.steer_yaw,
    }
}

/// Poses for both wheels of one axle, advancing spin unless `is_braking`.
pub fn axle_poses<H: ChassisHost + ?Sized>(
    host: &H,
    axle: &mut AxleConfig,
    position: AxlePosition,
    is_braking: bool,
    dt: Real,
) -> [WheelPose; 2] {
    let pose = host.pose();
    let down = host.normal_to_world(&local_down());
    let (attach_l, attach_r) = axle.world_attach_points(&pose);

    let mut place = |side: WheelSide, attach: Point<Real>| {
        let center = wheel_position(axle, side, attach, down);
        let wheel = axle.wheel(side);
        let rotation = wheel_rotation(&pose.rotation, wheel.steer_yaw, wheel.visual_spin, side);
        let out = to_pose(WheelId::new(position, side), axle, center, rotation);

        if !is_braking {
            advance_spin(host, axle, side, center, dt);
        }
        out
    };

    [place(WheelSide::Left, attach_l), place(WheelSide::Right, attach_r)]
}
