//! Throttle / brake / handbrake resolution.
//!
//! Turns the scalar driver intent into the vehicle flags and mirrors the brake
//! state onto every wheel. Steering is handled by [`crate::drive_core::steering`].

use rapier3d::prelude::Real;

use crate::drive_core::axle::AxleConfig;
use crate::drive_core::state::VehicleState;

/// Throttle magnitude needed to request driving or braking.
pub const THROTTLE_THRESHOLD: Real = 0.4;

/// Speed (m/s) against the requested direction above which throttle brakes.
pub const BRAKE_SPEED_THRESHOLD: Real = 0.5;

/// Returns whether a brake was requested this tick.
pub fn resolve_throttle(state: &mut VehicleState, throttle: Real, speed_ms: Real) -> bool {
    state.is_accelerating = false;
    state.is_reverse_accelerating = false;

    let mut brake = false;
    if throttle > THROTTLE_THRESHOLD {
        if speed_ms < -BRAKE_SPEED_THRESHOLD {
            brake = true;
        } else {
            state.is_accelerating = true;
        }
    } else if throttle <= -THROTTLE_THRESHOLD {
        if speed_ms > BRAKE_SPEED_THRESHOLD {
            brake = true;
        } else {
            state.is_reverse_accelerating = true;
        }
    }
    brake
}

pub fn resolve_brakes(
    state: &mut VehicleState,
    brake_requested: bool,
    hand_brake_requested: bool,
    hand_brake_slippery_time: Real,
) {
    if brake_requested && !state.is_braking {
        state.brake_slippery_timer = 1.0;
    }
    if hand_brake_requested {
        state.hand_brake_slippery_timer = hand_brake_slippery_time.max(0.1);
    }

    state.is_braking = brake_requested;
    state.is_hand_braking = hand_brake_requested && !state.is_driving();
}

/// Full resolution pass: flags, timers and the four wheel brake flags.
pub fn resolve(
    state: &mut VehicleState,
    front: &mut AxleConfig,
    rear: &mut AxleConfig,
    throttle: Real,
    hand_brake_requested: bool,
    speed_ms: Real,
    hand_brake_slippery_time: Real,
) {
    let brake = resolve_throttle(state, throttle, speed_ms);
    resolve_brakes(state, brake, hand_brake_requested, hand_brake_slippery_time);

    front.set_brakes(state.is_braking, state.is_hand_braking);
    rear.set_brakes(state.is_braking, state.is_hand_braking);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive_core::types::WheelSide;

    fn run(state: &mut VehicleState, throttle: Real, hand_brake: bool, speed: Real) -> (AxleConfig, AxleConfig) {
        let mut front = AxleConfig::default();
        let mut rear = AxleConfig::default();
        resolve(state, &mut front, &mut rear, throttle, hand_brake, speed, 1.0);
        (front, rear)
    }

    #[test]
    fn throttle_thresholds() {
        let mut s = VehicleState::default();
        run(&mut s, 0.4, false, 0.0);
        assert!(!s.is_accelerating && !s.is_reverse_accelerating && !s.is_braking);

        run(&mut s, 0.41, false, 0.0);
        assert!(s.is_accelerating);

        run(&mut s, -0.4, false, 0.0);
        assert!(s.is_reverse_accelerating);

        run(&mut s, -0.39, false, 0.0);
        assert!(!s.is_reverse_accelerating);
    }

    #[test]
    fn throttle_against_motion_brakes() {
        let mut s = VehicleState::default();
        let (front, rear) = run(&mut s, 1.0, false, -2.0);
        assert!(s.is_braking && !s.is_accelerating);
        assert!(front.brake_active(WheelSide::Left) && rear.brake_active(WheelSide::Right));

        let mut s = VehicleState::default();
        run(&mut s, -1.0, false, 0.6);
        assert!(s.is_braking && !s.is_reverse_accelerating);

        // slow enough: reverse instead
        let mut s = VehicleState::default();
        run(&mut s, -1.0, false, 0.5);
        assert!(!s.is_braking && s.is_reverse_accelerating);
    }

    #[test]
    fn brake_timer_resets_only_on_rising_edge() {
        let mut s = VehicleState::default();
        run(&mut s, 1.0, false, -2.0);
        assert_eq!(s.brake_slippery_timer, 1.0);

        s.brake_slippery_timer = 0.3;
        run(&mut s, 1.0, false, -2.0);
        assert_eq!(s.brake_slippery_timer, 0.3);

        run(&mut s, 0.0, false, -2.0);
        run(&mut s, 1.0, false, -2.0);
        assert_eq!(s.brake_slippery_timer, 1.0);
    }

    #[test]
    fn hand_brake_is_ignored_while_driving_but_still_arms_timer() {
        let mut s = VehicleState::default();
        let (front, _) = run(&mut s, 1.0, true, 3.0);
        assert!(!s.is_hand_braking);
        assert!(!front.hand_brake_active(WheelSide::Left));
        assert_eq!(s.hand_brake_slippery_timer, 1.0);

        let (_, rear) = run(&mut s, 0.0, true, 3.0);
        assert!(s.is_hand_braking);
        assert!(rear.hand_brake_active(WheelSide::Right));
    }

    #[test]
    fn hand_brake_timer_is_floored() {
        let mut s = VehicleState::default();
        resolve_brakes(&mut s, false, true, 0.0);
        assert!((s.hand_brake_slippery_timer - 0.1).abs() < 1e-6);
    }
}
