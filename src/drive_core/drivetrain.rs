// ==============================================================================
// drivetrain.rs — CURVE-DRIVEN ENGINE FORCE
// ------------------------------------------------------------------------------
// Acceleration curves map time (s) at full throttle to speed (km/h). To know
// how hard to push, the current speed is located on the curve (inverse lookup)
// and the speed one tick further along is taken as the target:
//
//   force = max((target_kmh - speed_kmh) / 3.6 * mass, 0)
//
// The inverse lookup is a fixed-iteration refinement, not a true bisection:
// start at the first key with a step of the full time range, take the step if
// it gets closer, then halve the step and point it towards the target. It can
// under-converge on non-monotonic curves; the best estimate is used as-is.
//
// The result is scaled by the acceleration handbrake coefficient (0.8 .. 1.0)
// and stored signed in VehicleState (negative = reverse thrust).
// ==============================================================================

use rapier3d::prelude::Real;

use crate::drive_core::config::EngineTuning;
use crate::drive_core::curve::Curve;
use crate::drive_core::state::VehicleState;
use crate::drive_core::steering::acceleration_hand_brake_coefficient;
use crate::drive_core::types::{sign, KMH_PER_MS};

/// Upper bound on the finest inverse lookup step (s). Coarser lookups snap to the
/// first key once the car is a tick past it, and the engine stalls.
pub const MAX_SEARCH_STEP: Real = 0.01;

/// Smallest time step `inverse_evaluate` tries over a curve spanning `span` seconds.
pub fn finest_search_step(span: Real, accuracy: u32) -> Real {
    if span <= 0.0 {
        return 0.0;
    }
    if accuracy == 0 {
        return Real::INFINITY;
    }
    span / (2.0 as Real).powi(accuracy.min(64) as i32 - 1)
}

/// Curve time whose value is closest to `speed_kmh`, found in `accuracy` steps.
pub fn inverse_evaluate(curve: &impl Curve, speed_kmh: Real, accuracy: u32) -> Option<Real> {
    let (min_time, max_time) = (curve.first_time()?, curve.last_time()?);

    let mut time = min_time;
    let mut step = max_time - min_time;

    for _ in 0..accuracy {
        let mut current = curve.evaluate(time);
        let current_diff = (speed_kmh - current).abs();

        let step_time = time + step;
        let step_speed = curve.evaluate(step_time);

        if (speed_kmh - step_speed).abs() < current_diff {
            time = step_time;
            current = step_speed;
        }

        step = (step / 2.0).abs() * sign(speed_kmh - current);
    }

    Some(time)
}

/// Forward force magnitude (N * s) needed to follow `curve` from `speed_ms`.
///
/// Never negative: this path only ever pushes.
pub fn acceleration_force_magnitude(
    curve: &impl Curve,
    speed_ms: Real,
    dt: Real,
    mass: Real,
    accuracy: u32,
) -> Real {
    let speed_kmh = speed_ms * KMH_PER_MS;

    let desired_kmh = match curve.len() {
        0 => return 0.0,
        1 => match curve.first_time() {
            Some(t) => curve.evaluate(t),
            None => return 0.0,
        },
        _ => {
            let Some(max_time) = curve.last_time() else {
                return 0.0;
            };
            if speed_kmh < curve.evaluate(max_time) {
                match inverse_evaluate(curve, speed_kmh, accuracy) {
                    Some(t) => curve.evaluate(t + dt),
                    None => return 0.0,
                }
            } else {
                curve.evaluate(max_time)
            }
        }
    };

    let acceleration_ms = (desired_kmh - speed_kmh) / KMH_PER_MS;
    (acceleration_ms * mass).max(0.0)
}

/// Refresh `state.engine_force_magnitude` for this tick.
pub fn update_engine_force(
    state: &mut VehicleState,
    engine: &EngineTuning,
    speed_ms: Real,
    mass: Real,
    hand_brake_k: Real,
    dt: Real,
) -> Real {
    let accuracy = engine.reverse_evaluation_accuracy;

    let magnitude = if state.is_accelerating {
        acceleration_force_magnitude(&engine.acceleration_curve, speed_ms, dt, mass, accuracy)
    } else if state.is_reverse_accelerating {
        -acceleration_force_magnitude(&engine.reverse_acceleration_curve, -speed_ms, dt, mass, accuracy)
    } else {
        0.0
    };

    state.engine_force_magnitude = magnitude * acceleration_hand_brake_coefficient(hand_brake_k);
    state.engine_force_magnitude
}
