// ==============================================================================
// friction.rs — CONTACT-PATCH FRICTION + ENGINE FORCE
// ------------------------------------------------------------------------------
// Per grounded wheel, after the suspension force:
//
// 1) Contact basis (may differ from the wheel basis on uneven ground)
//      up      = center hit normal
//      left    = normalize(left hit - right hit)
//      forward = left x up
//
// 2) Sliding force ("perfect static friction")
//      v_slide = (proj_left(v) + proj_forward(v)) * 0.5
//      F_slide = v_slide * mass / dt / NUMBER_OF_WHEELS
//      F       = -F_slide * clamp(lateral_friction) * slippery_k
//
// 3) Longitudinal override: the forward component of F is replaced by
//    - brake / handbrake: reduced by brake_force_magnitude * mass
//      (clamped to its own length, x0.8 on handbrake)
//    - coasting: scaled by 1 - clamp(rolling_friction)
//    - driving:  kept
//    F -= F_long
//
// 4) Engine force (not braking, powered axle, |engine| > 0.01):
//      forward * engine / powered_wheels / dt, applied 0.2 above the hit
//      (at hit - down * ENGINE_FORCE_LIFT)
//
// slippery_k is the most restrictive of three transient blends from 1.0 to the
// axle coefficient: after-flight timer, brake timer, handbrake coefficient.
// ==============================================================================

use rapier3d::prelude::{Point, Real, Vector};

use crate::drive_core::axle::AxleConfig;
use crate::drive_core::contact::GroundContact;
use crate::drive_core::state::VehicleState;
use crate::drive_core::types::{lerp, normalize_or_zero, ChassisHost, WheelSide, NUMBER_OF_WHEELS};

/// Minimum |engine force| that gets applied.
pub const ENGINE_FORCE_EPSILON: Real = 0.01;

/// Engine force is applied this far above the contact (along -down).
pub const ENGINE_FORCE_LIFT: Real = 0.2;

/// Scale applied to the brake force while the handbrake is engaged.
pub const HAND_BRAKE_FORCE_SCALE: Real = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactBasis {
    pub up: Vector<Real>,
    pub left: Vector<Real>,
    pub forward: Vector<Real>,
}

impl ContactBasis {
    pub fn from_contact(contact: &GroundContact) -> Self {
        let up = contact.center.normal;
        let left = normalize_or_zero(contact.left.position - contact.right.position);
        let forward = left.cross(&up);
        Self { up, left, forward }
    }
}

#[inline]
fn project(v: &Vector<Real>, onto: &Vector<Real>) -> Vector<Real> {
    onto * v.dot(onto)
}

/// Multiplier in (0, 1] on lateral friction from the three slippery effects.
pub fn slippery_coefficient(axle: &AxleConfig, state: &VehicleState, hand_brake_k: Real) -> Real {
    let mut k: Real = 1.0;

    if state.after_flight_slippery_timer > 0.0 {
        let t = state.after_flight_slippery_timer.clamp(0.0, 1.0);
        k = k.min(lerp(1.0, axle.after_flight_slippery_coefficient, t));
    }
    if state.brake_slippery_timer > 0.0 {
        let t = state.brake_slippery_timer.clamp(0.0, 1.0);
        k = k.min(lerp(1.0, axle.brake_slippery_coefficient, t));
    }
    if hand_brake_k > 0.0 {
        k = k.min(lerp(1.0, axle.hand_brake_slippery_coefficient, hand_brake_k));
    }
    k
}

/// Friction force for one wheel; pure, nothing is applied.
pub fn friction_force(
    axle: &AxleConfig,
    side: WheelSide,
    state: &VehicleState,
    basis: &ContactBasis,
    point_velocity: Vector<Real>,
    mass: Real,
    hand_brake_k: Real,
    dt: Real,
) -> Vector<Real> {
    let slide_velocity =
        (project(&point_velocity, &basis.left) + project(&point_velocity, &basis.forward)) * 0.5;
    let sliding_force = slide_velocity * mass / dt / NUMBER_OF_WHEELS as Real;

    let lateral_friction =
        axle.lateral_friction.clamp(0.0, 1.0) * slippery_coefficient(axle, state, hand_brake_k);

    let mut friction = -sliding_force * lateral_friction;
    let mut longitudinal = project(&friction, &basis.forward);

    let braking = axle.brake_active(side);
    let hand_braking = axle.hand_brake_active(side);

    if braking || hand_braking {
        let magnitude = (axle.brake_force_magnitude * mass).clamp(0.0, longitudinal.norm());
        let mut brake = normalize_or_zero(longitudinal) * magnitude;
        if hand_braking {
            brake *= HAND_BRAKE_FORCE_SCALE;
        }
        longitudinal -= brake;
    } else if !state.is_driving() {
        longitudinal *= 1.0 - axle.rolling_friction.clamp(0.0, 1.0);
    }

    friction -= longitudinal;
    friction
}

/// Compute and apply friction at the center hit. Returns the applied force.
pub fn apply_friction<H: ChassisHost + ?Sized>(
    host: &mut H,
    axle: &AxleConfig,
    side: WheelSide,
    state: &VehicleState,
    contact: &GroundContact,
    hand_brake_k: Real,
    dt: Real,
) -> Vector<Real> {
    let basis = ContactBasis::from_contact(contact);
    let velocity = host.velocity_at_point(&contact.center.position);
    let force = friction_force(axle, side, state, &basis, velocity, host.mass(), hand_brake_k, dt);

    host.apply_force_at_point(force, contact.center.position);
    force
}

/// Engine force for one wheel, if any gets applied.
pub fn engine_force(
    axle: &AxleConfig,
    state: &VehicleState,
    basis: &ContactBasis,
    powered_wheels: usize,
    dt: Real,
) -> Option<Vector<Real>> {
    if state.is_braking
        || !axle.is_powered
        || powered_wheels == 0
        || state.engine_force_magnitude.abs() <= ENGINE_FORCE_EPSILON
    {
        return None;
    }
    Some(basis.forward * state.engine_force_magnitude / powered_wheels as Real / dt)
}

pub fn apply_engine_force<H: ChassisHost + ?Sized>(
    host: &mut H,
    axle: &AxleConfig,
    state: &VehicleState,
    contact: &GroundContact,
    powered_wheels: usize,
    down: Vector<Real>,
    dt: Real,
) -> Option<Vector<Real>> {
    let basis = ContactBasis::from_contact(contact);
    let force = engine_force(axle, state, &basis, powered_wheels, dt)?;

    let at: Point<Real> = contact.center.position - down * ENGINE_FORCE_LIFT;
    host.apply_force_at_point(force, at);
    Some(force)
}
