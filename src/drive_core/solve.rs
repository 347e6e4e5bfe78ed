// ==============================================================================
// solve.rs — VEHICLE SIMULATION STEP (ORCHESTRATOR)
// ==============================================================================
// One fixed tick, strictly in this order:
//
//   0) reject dt <= 0 / non-finite (nothing is touched)
//   1) decay slippery timers
//   2) resolve throttle / brake / handbrake flags (input.rs)
//   3) update front steer angle (steering.rs)
//   4) update engine force magnitude (drivetrain.rs)
//   5) Ackermann wheel yaw (steering.rs)
//   6) front axle, then rear axle; per axle left wheel then right wheel:
//        contact -> suspension -> friction -> engine force
//      then the axle anti-roll bar (needs both wheels)
//   7) all four wheels airborne ? flight stabilization : downforce
//
// Forces go through ChassisHost and accumulate until the host integrates.
// The fixed ordering keeps replays deterministic.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::drive_core::anti_roll::apply_anti_roll;
use crate::drive_core::axle::AxleConfig;
use crate::drive_core::config::{EngineTuning, StabilityTuning, SteeringTuning, VehicleTuning};
use crate::drive_core::contact::sense_wheel;
use crate::drive_core::drivetrain::update_engine_force;
use crate::drive_core::error::StepError;
use crate::drive_core::flight::{apply_downforce, stabilize};
use crate::drive_core::friction::{apply_engine_force, apply_friction};
use crate::drive_core::input;
use crate::drive_core::state::VehicleState;
use crate::drive_core::steering::{apply_ackermann, hand_brake_coefficient, update_steer_angle};
use crate::drive_core::suspension::apply_suspension;
use crate::drive_core::types::{local_down, AxlePosition, ChassisHost, DriverIntent, WheelId, WheelSide};
use crate::drive_core::visual::axle_poses;
use crate::drive_core::wheel::{WheelPose, WheelState};

/// Summary of one accepted tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub speed_ms: Real,
    pub steer_angle_degrees: Real,
    pub engine_force_magnitude: Real,
    pub hand_brake_coefficient: Real,
    pub grounded_wheels: usize,
    pub airborne: bool,
}

#[derive(Debug, Clone)]
pub struct VehicleSimulation {
    pub front_axle: AxleConfig,
    pub rear_axle: AxleConfig,
    pub engine: EngineTuning,
    pub steering: SteeringTuning,
    pub stability: StabilityTuning,
    pub state: VehicleState,
}

impl VehicleSimulation {
    pub fn new(tuning: &VehicleTuning) -> Self {
        Self {
            front_axle: tuning.front_axle.clone(),
            rear_axle: tuning.rear_axle.clone(),
            engine: tuning.engine.clone(),
            steering: tuning.steering.clone(),
            stability: tuning.stability.clone(),
            state: VehicleState::default(),
        }
    }

    pub fn hand_brake_coefficient(&self) -> Real {
        hand_brake_coefficient(
            self.state.hand_brake_slippery_timer,
            self.stability.hand_brake_slippery_time,
        )
    }

    pub fn powered_wheel_count(&self) -> usize {
        self.front_axle.powered_wheel_count() + self.rear_axle.powered_wheel_count()
    }

    pub fn wheel(&self, id: WheelId) -> &WheelState {
        let axle = if id.is_front() { &self.front_axle } else { &self.rear_axle };
        axle.wheel(id.side())
    }

    pub fn grounded_wheel_count(&self) -> usize {
        WheelId::ALL.iter().filter(|id| self.wheel(**id).is_grounded()).count()
    }

    pub fn all_wheels_airborne(&self) -> bool {
        self.grounded_wheel_count() == 0
    }

    pub fn steer_angle_degrees(&self) -> Real {
        self.front_axle.steer_angle_degrees
    }

    /// Run one fixed tick against `host`.
    pub fn step<H: ChassisHost + ?Sized>(
        &mut self,
        host: &mut H,
        intent: DriverIntent,
        dt: Real,
    ) -> Result<TickReport, StepError> {
        if !(dt.is_finite() && dt > 0.0) {
            warn!(dt, "rejecting vehicle tick with invalid timestep");
            return Err(StepError::InvalidTimestep(dt));
        }
        let intent = intent.clamped();

        self.state.decay_timers(dt);

        // --- input ---
        let speed = host.forward_speed();
        input::resolve(
            &mut self.state,
            &mut self.front_axle,
            &mut self.rear_axle,
            intent.throttle,
            intent.handbrake,
            speed,
            self.stability.hand_brake_slippery_time,
        );

        let hand_brake_k = self.hand_brake_coefficient();
        self.front_axle.steer_angle_degrees = update_steer_angle(
            &self.steering,
            self.front_axle.steer_angle_degrees,
            intent.steer,
            speed,
            hand_brake_k,
            dt,
        );

        // --- drivetrain + geometry ---
        let mass = host.mass();
        update_engine_force(&mut self.state, &self.engine, speed, mass, hand_brake_k, dt);

        let pose = host.pose();
        apply_ackermann(&mut self.front_axle, &mut self.rear_axle, &pose);

        // --- wheel forces ---
        let powered = self.powered_wheel_count();
        let down = host.normal_to_world(&local_down());
        let state = self.state;
        solve_axle(host, &mut self.front_axle, &state, hand_brake_k, powered, down, dt);
        solve_axle(host, &mut self.rear_axle, &state, hand_brake_k, powered, down, dt);

        // --- airborne / downforce ---
        let airborne = self.all_wheels_airborne();
        if airborne {
            stabilize(host, &mut self.state, &self.stability, dt);
        } else {
            apply_downforce(host, &self.stability, speed);
        }

        let report = TickReport {
            speed_ms: speed,
            steer_angle_degrees: self.front_axle.steer_angle_degrees,
            engine_force_magnitude: self.state.engine_force_magnitude,
            hand_brake_coefficient: hand_brake_k,
            grounded_wheels: self.grounded_wheel_count(),
            airborne,
        };

        debug!(
            speed = report.speed_ms,
            steer = report.steer_angle_degrees,
            engine = report.engine_force_magnitude,
            grounded = report.grounded_wheels,
            accelerating = self.state.is_accelerating,
            reversing = self.state.is_reverse_accelerating,
            braking = self.state.is_braking,
            hand_braking = self.state.is_hand_braking,
            "vehicle tick"
        );

        Ok(report)
    }

    /// Wheel transforms in `WheelId::ALL` order; advances visual spin.
    pub fn wheel_poses<H: ChassisHost + ?Sized>(&mut self, host: &H, dt: Real) -> [WheelPose; 4] {
        let braking = self.state.is_braking;
        let [fl, fr] = axle_poses(host, &mut self.front_axle, AxlePosition::Front, braking, dt);
        let [rl, rr] = axle_poses(host, &mut self.rear_axle, AxlePosition::Rear, braking, dt);
        [fl, fr, rl, rr]
    }
}

fn solve_axle<H: ChassisHost + ?Sized>(
    host: &mut H,
    axle: &mut AxleConfig,
    state: &VehicleState,
    hand_brake_k: Real,
    powered_wheels: usize,
    down: Vector<Real>,
    dt: Real,
) {
    let pose = host.pose();
    let (attach_l, attach_r) = axle.world_attach_points(&pose);

    for (side, attach) in [(WheelSide::Left, attach_l), (WheelSide::Right, attach_r)] {
        let Some(contact) = sense_wheel(&*host, axle, side, attach, down, dt) else {
            continue;
        };

        apply_suspension(host, axle.wheel(side), &contact, axle.stiffness, axle.damping, down, dt);
        apply_friction(host, axle, side, state, &contact, hand_brake_k, dt);
        apply_engine_force(host, axle, state, &contact, powered_wheels, down, dt);
    }

    apply_anti_roll(host, &axle.wheel_left, &axle.wheel_right, axle.anti_roll_force, down);
}
