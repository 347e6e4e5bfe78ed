// ==============================================================================
// config.rs — PERSISTED VEHICLE TUNING
// ------------------------------------------------------------------------------
// Everything a vehicle is configured with, grouped the way it is edited:
// - chassis: mass, collider half extents, host body damping
// - engine: forward / reverse acceleration curves (time s -> speed km/h)
// - steering: limit, rate and centering curves (speed km/h -> degrees)
// - stability: flight stabilization, handbrake slip time, downforce
// - front_axle / rear_axle: AxleConfig tuning (runtime fields are skipped)
//
// Presets: hatchback() (front-wheel drive, also Default) and rally()
// (all-wheel drive, looser rear). JSON files may omit any field; missing
// fields take the hatchback value.
// ==============================================================================

use std::fs;
use std::path::Path;

use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

use crate::drive_core::axle::{AxleConfig, AxleOffset};
use crate::drive_core::curve::{Curve, LinearCurve};
use crate::drive_core::drivetrain::{finest_search_step, MAX_SEARCH_STEP};
use crate::drive_core::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub acceleration_curve: LinearCurve,
    pub reverse_acceleration_curve: LinearCurve,
    /// Iterations of the inverse curve lookup. The finest step it tries is
    /// `curve span / 2^(accuracy - 1)` and must stay below one tick.
    pub reverse_evaluation_accuracy: u32,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            acceleration_curve: LinearCurve::new(&[(0.0, 0.0), (8.0, 100.0), (20.0, 160.0)]),
            reverse_acceleration_curve: LinearCurve::new(&[(0.0, 0.0), (5.0, 30.0), (10.0, 40.0)]),
            reverse_evaluation_accuracy: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringTuning {
    /// Max steer angle (deg) by speed (km/h).
    pub steer_angle_limit: LinearCurve,
    /// Centering rate (deg/s) by speed (km/h).
    pub steering_reset_speed: LinearCurve,
    /// Steer rate (deg per tick at full input) by speed (km/h).
    pub steering_speed: LinearCurve,
}

impl Default for SteeringTuning {
    fn default() -> Self {
        Self {
            steer_angle_limit: LinearCurve::new(&[(0.0, 35.0), (60.0, 15.0), (150.0, 6.0)]),
            steering_reset_speed: LinearCurve::new(&[(0.0, 60.0), (150.0, 90.0)]),
            steering_speed: LinearCurve::new(&[(0.0, 2.0), (150.0, 0.6)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityTuning {
    pub flight_stabilization_force: Real,
    pub flight_stabilization_damping: Real,
    /// Seconds of reduced grip after the handbrake is released.
    pub hand_brake_slippery_time: Real,
    /// Percent of `downforce` by speed (km/h).
    pub downforce_curve: LinearCurve,
    pub downforce: Real,
}

impl Default for StabilityTuning {
    fn default() -> Self {
        Self {
            flight_stabilization_force: 4.0,
            flight_stabilization_damping: 2.0,
            hand_brake_slippery_time: 1.0,
            downforce_curve: LinearCurve::new(&[(0.0, 0.0), (200.0, 100.0)]),
            downforce: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub mass: Real,                        // kg
    pub chassis_half_extents: [Real; 3],   // [hx, hy, hz] meters
    pub linear_damping: Real,              // host body drag
    pub angular_damping: Real,             // host body rotational drag
    pub engine: EngineTuning,
    pub steering: SteeringTuning,
    pub stability: StabilityTuning,
    pub front_axle: AxleConfig,
    pub rear_axle: AxleConfig,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self::hatchback()
    }
}

impl VehicleTuning {
    /// Light front-wheel-drive road car.
    pub fn hatchback() -> Self {
        let front_axle = AxleConfig {
            width: 1.55,
            offset: AxleOffset { forward: 1.3, height: -0.2 },
            is_powered: true,
            stiffness: 8000.0,
            damping: 1500.0,
            hand_brake_slippery_coefficient: 0.9,
            ..AxleConfig::default()
        };
        let rear_axle = AxleConfig {
            width: 1.55,
            offset: AxleOffset { forward: -1.25, height: -0.2 },
            is_powered: false,
            stiffness: 8000.0,
            damping: 1500.0,
            hand_brake_slippery_coefficient: 0.02,
            ..AxleConfig::default()
        };

        Self {
            mass: 1200.0,
            chassis_half_extents: [0.9, 0.35, 2.0],
            linear_damping: 0.05,
            angular_damping: 0.5,
            engine: EngineTuning::default(),
            steering: SteeringTuning::default(),
            stability: StabilityTuning::default(),
            front_axle,
            rear_axle,
        }
    }

    /// All-wheel drive, quicker steering, softer and looser.
    pub fn rally() -> Self {
        let front_axle = AxleConfig {
            width: 1.6,
            offset: AxleOffset { forward: 1.25, height: -0.15 },
            is_powered: true,
            wheel_radius: 0.34,
            lateral_friction: 0.5,
            rolling_friction: 0.015,
            brake_force_magnitude: 3.0,
            after_flight_slippery_coefficient: 0.2,
            brake_slippery_coefficient: 0.6,
            hand_brake_slippery_coefficient: 0.8,
            stiffness: 6500.0,
            damping: 1100.0,
            relaxed_length: 0.65,
            anti_roll_force: 1800.0,
            ..AxleConfig::default()
        };
        let rear_axle = AxleConfig {
            offset: AxleOffset { forward: -1.25, height: -0.15 },
            hand_brake_slippery_coefficient: 0.01,
            anti_roll_force: 1200.0,
            ..front_axle.clone()
        };

        Self {
            mass: 1100.0,
            chassis_half_extents: [0.9, 0.4, 2.0],
            linear_damping: 0.03,
            angular_damping: 0.4,
            engine: EngineTuning {
                acceleration_curve: LinearCurve::new(&[(0.0, 0.0), (5.0, 100.0), (15.0, 180.0)]),
                reverse_acceleration_curve: LinearCurve::new(&[(0.0, 0.0), (4.0, 35.0), (8.0, 45.0)]),
                reverse_evaluation_accuracy: 12,
            },
            steering: SteeringTuning {
                steer_angle_limit: LinearCurve::new(&[(0.0, 38.0), (80.0, 18.0), (180.0, 8.0)]),
                steering_reset_speed: LinearCurve::new(&[(0.0, 80.0), (180.0, 120.0)]),
                steering_speed: LinearCurve::new(&[(0.0, 3.0), (180.0, 1.0)]),
            },
            stability: StabilityTuning {
                flight_stabilization_force: 6.0,
                flight_stabilization_damping: 3.0,
                hand_brake_slippery_time: 0.6,
                downforce_curve: LinearCurve::new(&[(0.0, 0.0), (200.0, 100.0)]),
                downforce: 3.0,
            },
            front_axle,
            rear_axle,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "hatchback" => Some(Self::hatchback()),
            "rally" => Some(Self::rally()),
            _ => None,
        }
    }

    pub const PRESETS: [&'static str; 2] = ["hatchback", "rally"];

    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ConfigError::invalid("mass", format!("must be > 0, got {}", self.mass)));
        }
        if self.chassis_half_extents.iter().any(|e| !(e.is_finite() && *e > 0.0)) {
            return Err(ConfigError::invalid("chassis_half_extents", "all extents must be > 0"));
        }

        let curves = [
            ("engine.acceleration_curve", &self.engine.acceleration_curve),
            ("engine.reverse_acceleration_curve", &self.engine.reverse_acceleration_curve),
            ("steering.steer_angle_limit", &self.steering.steer_angle_limit),
            ("steering.steering_reset_speed", &self.steering.steering_reset_speed),
            ("steering.steering_speed", &self.steering.steering_speed),
            ("stability.downforce_curve", &self.stability.downforce_curve),
        ];
        for (name, curve) in curves {
            curve.check().map_err(|reason| ConfigError::invalid(name, reason))?;
        }

        let accuracy = self.engine.reverse_evaluation_accuracy;
        let engine_curves = [
            ("engine.acceleration_curve", &self.engine.acceleration_curve),
            ("engine.reverse_acceleration_curve", &self.engine.reverse_acceleration_curve),
        ];
        for (name, curve) in engine_curves {
            let (Some(first), Some(last)) = (curve.first_time(), curve.last_time()) else {
                continue;
            };
            let step = finest_search_step(last - first, accuracy);
            if step > MAX_SEARCH_STEP {
                return Err(ConfigError::invalid(
                    "engine.reverse_evaluation_accuracy",
                    format!(
                        "{accuracy} iterations over the {:.2} s of {name} only resolve {step:.4} s (max {MAX_SEARCH_STEP} s)",
                        last - first
                    ),
                ));
            }
        }

        let s = &self.stability;
        let non_negative = [
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
            ("stability.flight_stabilization_force", s.flight_stabilization_force),
            ("stability.flight_stabilization_damping", s.flight_stabilization_damping),
            ("stability.hand_brake_slippery_time", s.hand_brake_slippery_time),
            ("stability.downforce", s.downforce),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(name, format!("must be >= 0, got {value}")));
            }
        }

        self.front_axle.validate("front_axle")?;
        self.rear_axle.validate("rear_axle")?;

        if self.front_axle.offset.forward <= self.rear_axle.offset.forward {
            return Err(ConfigError::invalid(
                "front_axle.offset.forward",
                "front axle must sit ahead of the rear axle",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for name in VehicleTuning::PRESETS {
            let tuning = VehicleTuning::preset(name).unwrap();
            tuning.validate().unwrap();
        }
        assert!(VehicleTuning::preset("tank").is_none());
    }

    #[test]
    fn json_round_trip_keeps_tuning() {
        let rally = VehicleTuning::rally();
        let json = rally.to_json_pretty().unwrap();
        let back = VehicleTuning::from_json_str(&json).unwrap();
        assert_eq!(back.mass, rally.mass);
        assert_eq!(back.engine, rally.engine);
        assert_eq!(back.steering, rally.steering);
        assert_eq!(back.rear_axle.hand_brake_slippery_coefficient, 0.01);
        assert!(back.rear_axle.is_powered);
    }

    #[test]
    fn missing_fields_take_hatchback_values() {
        let t = VehicleTuning::from_json_str(r#"{ "mass": 900 }"#).unwrap();
        assert_eq!(t.mass, 900.0);
        assert_eq!(t.front_axle.offset, VehicleTuning::hatchback().front_axle.offset);
        assert!(t.front_axle.is_powered);
    }

    #[test]
    fn validate_names_the_offending_field() {
        let err = VehicleTuning::from_json_str(r#"{ "mass": -1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "mass"));

        let mut t = VehicleTuning::hatchback();
        t.rear_axle.rolling_friction = 2.0;
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("rear_axle.rolling_friction"));

        let mut t = VehicleTuning::hatchback();
        t.rear_axle.offset.forward = 2.0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn unsorted_curves_are_rejected() {
        let json = r#"{ "steering": { "steering_speed": [
            { "time": 10, "value": 1 }, { "time": 0, "value": 2 }
        ] } }"#;
        let err = VehicleTuning::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("steering.steering_speed"));
    }

    #[test]
    fn presets_resolve_the_acceleration_curve_below_one_tick() {
        for name in VehicleTuning::PRESETS {
            let t = VehicleTuning::preset(name).unwrap();
            let curve = &t.engine.acceleration_curve;
            let span = curve.last_time().unwrap() - curve.first_time().unwrap();
            assert!(finest_search_step(span, t.engine.reverse_evaluation_accuracy) < 1.0 / 60.0, "{name}");
        }
    }

    #[test]
    fn coarse_inverse_lookup_is_rejected() {
        let mut t = VehicleTuning::hatchback();
        t.engine.reverse_evaluation_accuracy = 10;
        let err = t.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "engine.reverse_evaluation_accuracy"));

        t.engine.reverse_evaluation_accuracy = 0;
        assert!(t.validate().is_err());

        // a short curve needs fewer iterations
        t.engine.acceleration_curve = LinearCurve::new(&[(0.0, 0.0), (2.0, 60.0)]);
        t.engine.reverse_acceleration_curve = LinearCurve::new(&[(0.0, 0.0), (2.0, 20.0)]);
        t.engine.reverse_evaluation_accuracy = 9;
        t.validate().unwrap();
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(VehicleTuning::from_json_str("{ mass"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = VehicleTuning::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
