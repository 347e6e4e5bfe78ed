// ==============================================================================
// drive_core — ENGINE-AGNOSTIC ARCADE VEHICLE MODEL
// ------------------------------------------------------------------------------
// Per fixed tick, VehicleSimulation::step turns driver intent into forces on a
// chassis reached through the ChassisHost trait (ray casts, force / torque
// application, velocity queries). Nothing in here depends on a concrete
// physics world; physics.rs provides the rapier host.
// ==============================================================================

pub mod anti_roll;
pub mod axle;
pub mod config;
pub mod contact;
pub mod curve;
pub mod drivetrain;
pub mod error;
pub mod flight;
pub mod friction;
pub mod input;
pub mod solve;
pub mod state;
pub mod steering;
pub mod suspension;
pub mod types;
pub mod visual;
pub mod wheel;

#[cfg(test)]
pub(crate) mod test_support;

pub use axle::{AxleConfig, AxleOffset};
pub use config::{EngineTuning, StabilityTuning, SteeringTuning, VehicleTuning};
pub use curve::{Curve, Keyframe, LinearCurve};
pub use error::{ConfigError, StepError};
pub use solve::{TickReport, VehicleSimulation};
pub use state::VehicleState;
pub use types::{AxlePosition, ChassisHost, DriverIntent, TraceHit, WheelId, WheelSide};
pub use wheel::{WheelPose, WheelState};
