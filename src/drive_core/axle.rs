// ==============================================================================
// axle.rs — AXLE TUNING + RUNTIME FLAGS
// ------------------------------------------------------------------------------
// An axle is a left/right wheel pair sharing geometry, tire and suspension
// tuning. Tuning fields are persisted (serde); steer angle, brake flags and
// the two WheelState slots are runtime-only and skipped by serde.
//
// Geometry (chassis-local, +Z forward, +Y up, +X left):
//   axle center  = (0, offset.height, offset.forward)
//   left attach  = center + X * width/2
//   right attach = center - X * width/2
// ==============================================================================

use rapier3d::prelude::{Isometry, Point, Real};
use serde::{Deserialize, Serialize};

use crate::drive_core::error::ConfigError;
use crate::drive_core::types::WheelSide;
use crate::drive_core::wheel::WheelState;

/// Axle position relative to the chassis origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxleOffset {
    pub forward: Real,  // +forward / -backward
    pub height: Real,   // +up / -down
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxleConfig {
    // --- Axle ---
    pub width: Real,                 // left-right wheel separation
    pub offset: AxleOffset,
    pub is_powered: bool,

    // --- Wheel ---
    pub wheel_radius: Real,
    pub lateral_friction: Real,      // 0..1 sideways grip
    pub rolling_friction: Real,      // 0..1 coasting drag
    pub brake_force_magnitude: Real, // per unit of chassis mass
    pub after_flight_slippery_coefficient: Real, // 0..1
    pub brake_slippery_coefficient: Real,        // 0..1
    pub hand_brake_slippery_coefficient: Real,   // 0..1

    // --- Suspension ---
    pub stiffness: Real,
    pub damping: Real,
    pub relaxed_length: Real,
    pub anti_roll_force: Real,

    // --- Runtime ---
    #[serde(skip)] pub steer_angle_degrees: Real,
    #[serde(skip)] pub brake_left: bool,
    #[serde(skip)] pub brake_right: bool,
    #[serde(skip)] pub hand_brake_left: bool,
    #[serde(skip)] pub hand_brake_right: bool,
    #[serde(skip)] pub wheel_left: WheelState,
    #[serde(skip)] pub wheel_right: WheelState,
}

impl Default for AxleConfig {
    fn default() -> Self {
        Self {
            width: 1.6,
            offset: AxleOffset::default(),
            is_powered: false,
            wheel_radius: 0.33,
            lateral_friction: 0.6,
            rolling_friction: 0.02,
            brake_force_magnitude: 4.0,
            after_flight_slippery_coefficient: 0.1,
            brake_slippery_coefficient: 0.5,
            hand_brake_slippery_coefficient: 0.9,
            stiffness: 7000.0,
            damping: 1200.0,
            relaxed_length: 0.55,
            anti_roll_force: 2500.0,
            steer_angle_degrees: 0.0,
            brake_left: false,
            brake_right: false,
            hand_brake_left: false,
            hand_brake_right: false,
            wheel_left: WheelState::default(),
            wheel_right: WheelState::default(),
        }
    }
}

impl AxleConfig {
    pub fn wheel(&self, side: WheelSide) -> &WheelState {
        match side {
            WheelSide::Left => &self.wheel_left,
            WheelSide::Right => &self.wheel_right,
        }
    }

    pub fn wheel_mut(&mut self, side: WheelSide) -> &mut WheelState {
        match side {
            WheelSide::Left => &mut self.wheel_left,
            WheelSide::Right => &mut self.wheel_right,
        }
    }

    pub fn brake_active(&self, side: WheelSide) -> bool {
        match side {
            WheelSide::Left => self.brake_left,
            WheelSide::Right => self.brake_right,
        }
    }

    pub fn hand_brake_active(&self, side: WheelSide) -> bool {
        match side {
            WheelSide::Left => self.hand_brake_left,
            WheelSide::Right => self.hand_brake_right,
        }
    }

    /// Mirror the vehicle-wide brake state onto both wheels.
    pub fn set_brakes(&mut self, brake: bool, hand_brake: bool) {
        self.brake_left = brake;
        self.brake_right = brake;
        self.hand_brake_left = hand_brake;
        self.hand_brake_right = hand_brake;
    }

    pub fn powered_wheel_count(&self) -> usize {
        if self.is_powered { 2 } else { 0 }
    }

    pub fn local_center(&self) -> Point<Real> {
        Point::new(0.0, self.offset.height, self.offset.forward)
    }

    pub fn local_attach_point(&self, side: WheelSide) -> Point<Real> {
        let half = self.width * 0.5;
        let x = if side.is_left() { half } else { -half };
        Point::new(x, self.offset.height, self.offset.forward)
    }

    /// World-space wheel attach points `(left, right)`.
    pub fn world_attach_points(&self, pose: &Isometry<Real>) -> (Point<Real>, Point<Real>) {
        (
            pose * self.local_attach_point(WheelSide::Left),
            pose * self.local_attach_point(WheelSide::Right),
        )
    }

    pub fn validate(&self, axle: &str) -> Result<(), ConfigError> {
        let field = |name: &str| format!("{axle}.{name}");

        let positive = [
            ("width", self.width),
            ("wheel_radius", self.wheel_radius),
            ("relaxed_length", self.relaxed_length),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field(name), format!("must be > 0, got {value}")));
            }
        }

        let unit = [
            ("lateral_friction", self.lateral_friction),
            ("rolling_friction", self.rolling_friction),
            ("after_flight_slippery_coefficient", self.after_flight_slippery_coefficient),
            ("brake_slippery_coefficient", self.brake_slippery_coefficient),
            ("hand_brake_slippery_coefficient", self.hand_brake_slippery_coefficient),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field(name), format!("must be within [0, 1], got {value}")));
            }
        }

        let non_negative = [
            ("brake_force_magnitude", self.brake_force_magnitude),
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("anti_roll_force", self.anti_roll_force),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(field(name), format!("must be >= 0, got {value}")));
            }
        }

        if !(self.offset.forward.is_finite() && self.offset.height.is_finite()) {
            return Err(ConfigError::invalid(field("offset"), "must be finite"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::vector;

    #[test]
    fn attach_points_straddle_the_axle_center() {
        let axle = AxleConfig {
            width: 2.0,
            offset: AxleOffset { forward: 1.5, height: -0.2 },
            ..AxleConfig::default()
        };
        let pose = Isometry::translation(0.0, 1.0, 0.0);
        let (l, r) = axle.world_attach_points(&pose);
        assert_eq!(l, Point::new(1.0, 0.8, 1.5));
        assert_eq!(r, Point::new(-1.0, 0.8, 1.5));

        let rotated = Isometry::new(vector![0.0, 0.0, 0.0], vector![0.0, std::f32::consts::PI, 0.0]);
        let (l, _) = axle.world_attach_points(&rotated);
        assert!((l.x + 1.0).abs() < 1e-5);
        assert!((l.z + 1.5).abs() < 1e-5);
    }

    #[test]
    fn brake_flags_follow_side() {
        let mut axle = AxleConfig::default();
        axle.set_brakes(true, false);
        assert!(axle.brake_active(WheelSide::Left));
        assert!(axle.brake_active(WheelSide::Right));
        assert!(!axle.hand_brake_active(WheelSide::Right));
        axle.brake_right = false;
        assert!(!axle.brake_active(WheelSide::Right));
    }

    #[test]
    fn validate_rejects_out_of_range_friction() {
        let axle = AxleConfig { lateral_friction: 1.5, ..AxleConfig::default() };
        let err = axle.validate("front_axle").unwrap_err();
        assert!(err.to_string().contains("front_axle.lateral_friction"));

        let axle = AxleConfig { relaxed_length: 0.0, ..AxleConfig::default() };
        assert!(axle.validate("rear_axle").is_err());
        assert!(AxleConfig::default().validate("front_axle").is_ok());
    }

    #[test]
    fn runtime_fields_are_not_persisted() {
        let mut axle = AxleConfig::default();
        axle.steer_angle_degrees = 12.0;
        axle.wheel_left.compression = 0.5;
        let json = serde_json::to_string(&axle).unwrap();
        assert!(!json.contains("steer_angle_degrees"));
        let back: AxleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.steer_angle_degrees, 0.0);
        assert_eq!(back.wheel_left.compression, 0.0);
        assert_eq!(back.stiffness, axle.stiffness);
    }
}
