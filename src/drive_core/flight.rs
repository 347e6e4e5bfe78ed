// ==============================================================================
// flight.rs — AIRBORNE STABILIZATION + DOWNFORCE
// ------------------------------------------------------------------------------
// Runs once per tick after both axles:
//
// all four wheels airborne:
//   - after-flight slippery timer = 1.0
//   - angvel -= angvel_without_yaw * clamp(damping * dt, 0, 1)
//   - torque  = cross(body_up, world_up) * force * mass
//     (the righting axis: rotating body_up about it moves it towards world_up)
//
// otherwise:
//   - force = body_down * mass * (downforce_curve(|speed| km/h) / 100) * downforce
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use crate::drive_core::config::StabilityTuning;
use crate::drive_core::curve::Curve;
use crate::drive_core::state::VehicleState;
use crate::drive_core::types::{local_down, local_up, world_up, ChassisHost, KMH_PER_MS};

/// Damp roll/pitch and push the chassis back upright. Returns the torque.
pub fn stabilize<H: ChassisHost + ?Sized>(
    host: &mut H,
    state: &mut VehicleState,
    tuning: &StabilityTuning,
    dt: Real,
) -> Vector<Real> {
    state.after_flight_slippery_timer = 1.0;

    let body_up = host.normal_to_world(&local_up());
    let righting_axis = body_up.cross(&world_up());

    let angvel = host.angular_velocity();
    let mut damping = angvel;
    damping.y = 0.0;
    damping *= (tuning.flight_stabilization_damping * dt).clamp(0.0, 1.0);
    host.set_angular_velocity(angvel - damping);

    let torque = righting_axis * tuning.flight_stabilization_force * host.mass();
    host.apply_torque(torque);
    torque
}

/// Speed-dependent downforce along body-down. Returns the force.
pub fn apply_downforce<H: ChassisHost + ?Sized>(
    host: &mut H,
    tuning: &StabilityTuning,
    speed_ms: Real,
) -> Vector<Real> {
    let speed_kmh = speed_ms.abs() * KMH_PER_MS;
    let amount = tuning.downforce_curve.evaluate(speed_kmh) / 100.0;

    let body_down = host.normal_to_world(&local_down());
    let force = body_down * host.mass() * amount * tuning.downforce;
    host.apply_force(force);
    force
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive_core::curve::LinearCurve;
    use crate::drive_core::test_support::{FakeChassis, Ground};
    use approx::assert_relative_eq;
    use rapier3d::na::UnitQuaternion;
    use rapier3d::prelude::vector;

    fn tuning() -> StabilityTuning {
        StabilityTuning {
            flight_stabilization_force: 2.0,
            flight_stabilization_damping: 5.0,
            hand_brake_slippery_time: 1.0,
            downforce_curve: LinearCurve::new(&[(0.0, 0.0), (100.0, 50.0)]),
            downforce: 2.0,
        }
    }

    #[test]
    fn upright_chassis_gets_no_torque_but_resets_timer() {
        let mut host = FakeChassis::at_height(5.0, Ground::None);
        let mut state = VehicleState::default();
        let t = stabilize(&mut host, &mut state, &tuning(), 0.02);
        assert_relative_eq!(t.norm(), 0.0);
        assert_eq!(state.after_flight_slippery_timer, 1.0);
    }

    #[test]
    fn rolled_chassis_is_pushed_back_upright() {
        // roll about +Z (forward): body up leans towards -X
        let roll = UnitQuaternion::from_axis_angle(&Vector::z_axis(), 0.5);
        let mut host = FakeChassis::at_height(5.0, Ground::None).with_rotation(roll);
        let mut state = VehicleState::default();

        let t = stabilize(&mut host, &mut state, &tuning(), 0.02);
        assert!(t.norm() > 0.0);
        // torque must rotate against the roll
        assert!(t.z < 0.0);
        assert_eq!(host.torques.len(), 1);
    }

    #[test]
    fn damping_spares_yaw() {
        let mut host = FakeChassis::at_height(5.0, Ground::None)
            .with_angular_velocity(vector![2.0, 3.0, -1.0]);
        let mut state = VehicleState::default();
        stabilize(&mut host, &mut state, &tuning(), 0.1);
        // clamp(5 * 0.1) = 0.5
        assert_relative_eq!(host.angvel, vector![1.0, 3.0, -0.5], epsilon = 1e-6);
    }

    #[test]
    fn downforce_scales_with_speed_and_pushes_down() {
        let mut host = FakeChassis::at_height(0.0, Ground::None);
        let f = apply_downforce(&mut host, &tuning(), -100.0 / KMH_PER_MS);
        // 50% * 2 * mass
        assert_relative_eq!(f.y, -host.mass, epsilon = 1e-2);
        assert_eq!(apply_downforce(&mut host, &tuning(), 0.0).norm(), 0.0);
    }
}
