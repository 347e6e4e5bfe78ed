//! In-memory `ChassisHost` for unit tests: a scripted rigid body over an
//! infinite horizontal ground plane that records every applied force.

use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::{Isometry, Point, Real, Vector};

use crate::drive_core::types::{ChassisHost, TraceHit};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Ground {
    None,
    /// Plane `y = height` with an upward normal.
    Flat { height: Real },
    /// Plane `y = height` that reports `normal` on hits (slopes, walls).
    Tilted { height: Real, normal: Vector<Real> },
}

type RayFilter = Box<dyn Fn(&Point<Real>, &Point<Real>) -> bool>;

pub(crate) struct FakeChassis {
    pub ground: Ground,
    pub mass: Real,
    pub pose: Isometry<Real>,
    pub linvel: Vector<Real>,
    pub angvel: Vector<Real>,
    ray_filter: Option<RayFilter>,

    pub forces: Vec<Vector<Real>>,
    pub forces_at_point: Vec<(Vector<Real>, Point<Real>)>,
    pub torques: Vec<Vector<Real>>,
}

impl FakeChassis {
    pub fn at_height(height: Real, ground: Ground) -> Self {
        Self {
            ground,
            mass: 1200.0,
            pose: Isometry::translation(0.0, height, 0.0),
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            ray_filter: None,
            forces: Vec::new(),
            forces_at_point: Vec::new(),
            torques: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<Real>) -> Self {
        self.pose.rotation = rotation;
        self
    }

    pub fn with_linear_velocity(mut self, v: Vector<Real>) -> Self {
        self.linvel = v;
        self
    }

    pub fn with_angular_velocity(mut self, w: Vector<Real>) -> Self {
        self.angvel = w;
        self
    }

    /// Rays for which `filter(from, to)` is false miss everything.
    pub fn with_ray_filter(mut self, filter: impl Fn(&Point<Real>, &Point<Real>) -> bool + 'static) -> Self {
        self.ray_filter = Some(Box::new(filter));
        self
    }

    pub fn clear_recorded(&mut self) {
        self.forces.clear();
        self.forces_at_point.clear();
        self.torques.clear();
    }
}

impl ChassisHost for FakeChassis {
    fn cast_ray(&self, from: Point<Real>, to: Point<Real>) -> Option<TraceHit> {
        if let Some(filter) = &self.ray_filter {
            if !filter(&from, &to) {
                return None;
            }
        }

        let (height, normal) = match self.ground {
            Ground::None => return None,
            Ground::Flat { height } => (height, Vector::y()),
            Ground::Tilted { height, normal } => (height, normal.normalize()),
        };

        // only rays that start above the plane and reach it
        if from.y < height || to.y > height || from.y == to.y {
            return None;
        }

        let t = (from.y - height) / (from.y - to.y);
        let delta = to - from;
        Some(TraceHit {
            position: from + delta * t,
            normal,
            distance: delta.norm() * t,
        })
    }

    fn mass(&self) -> Real {
        self.mass
    }

    fn pose(&self) -> Isometry<Real> {
        self.pose
    }

    fn linear_velocity(&self) -> Vector<Real> {
        self.linvel
    }

    fn angular_velocity(&self) -> Vector<Real> {
        self.angvel
    }

    fn set_angular_velocity(&mut self, angvel: Vector<Real>) {
        self.angvel = angvel;
    }

    fn velocity_at_point(&self, point: &Point<Real>) -> Vector<Real> {
        let com = Point::from(self.pose.translation.vector);
        self.linvel + self.angvel.cross(&(point - com))
    }

    fn apply_force(&mut self, force: Vector<Real>) {
        self.forces.push(force);
    }

    fn apply_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>) {
        self.forces_at_point.push((force, point));
    }

    fn apply_torque(&mut self, torque: Vector<Real>) {
        self.torques.push(torque);
    }
}
