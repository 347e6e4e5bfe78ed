// src/physics.rs
// ==============================================================================
// RAPIER HOST WORLD
// ------------------------------------------------------------------------------
// Owns the rapier sets and every spawned vehicle. One `step(dt)` (skipped
// entirely for a zero, negative or non-finite dt):
//   1) refresh the query pipeline (ray casts see this frame's colliders)
//   2) per vehicle: reset user forces, run VehicleSimulation::step against a
//      RapierChassis snapshot, then apply the queued force / torque commands
//   3) step the rapier pipeline
//   4) reset runaway bodies (non-finite or beyond +/-1000) above the origin
//
// RapierChassis reads a snapshot of the body and only *queues* writes, so the
// vehicle core can ray cast through the immutable sets while it computes.
// ==============================================================================

use std::collections::HashMap;

use rapier3d::prelude::*;
use tracing::{debug, info, warn};

use crate::drive_core::{ChassisHost, DriverIntent, TraceHit, VehicleTuning};
use crate::state::{Snapshot, VehicleSnapshot};
use crate::vehicle::Vehicle;

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

/// Bodies past this distance from the origin are considered exploded.
const RUNAWAY_LIMIT: Real = 1_000.0;

#[inline] fn v3(v: Vector<Real>) -> [f32; 3] { [v.x, v.y, v.z] }

// ------------------------------------------------------------
// ChassisHost over a rapier rigid body
// ------------------------------------------------------------

/// A write the vehicle core asked for, applied after its tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyCommand {
    Force(Vector<Real>),
    ForceAtPoint(Vector<Real>, Point<Real>),
    Torque(Vector<Real>),
    SetAngvel(Vector<Real>),
}

pub struct RapierChassis<'a> {
    query: &'a QueryPipeline,
    bodies: &'a RigidBodySet,
    colliders: &'a ColliderSet,
    handle: RigidBodyHandle,

    pose: Isometry<Real>,
    linvel: Vector<Real>,
    angvel: Vector<Real>,
    com: Point<Real>,
    mass: Real,

    commands: Vec<BodyCommand>,
}

impl<'a> RapierChassis<'a> {
    /// `None` if `handle` is not in `bodies`.
    pub fn new(
        query: &'a QueryPipeline,
        bodies: &'a RigidBodySet,
        colliders: &'a ColliderSet,
        handle: RigidBodyHandle,
    ) -> Option<Self> {
        let body = bodies.get(handle)?;
        Some(Self {
            query,
            bodies,
            colliders,
            handle,
            pose: *body.position(),
            linvel: *body.linvel(),
            angvel: *body.angvel(),
            com: *body.center_of_mass(),
            mass: body.mass(),
            commands: Vec::new(),
        })
    }

    pub fn into_commands(self) -> Vec<BodyCommand> {
        self.commands
    }
}

impl ChassisHost for RapierChassis<'_> {
    fn cast_ray(&self, from: Point<Real>, to: Point<Real>) -> Option<TraceHit> {
        let delta = to - from;
        let length = delta.norm();
        if length <= Real::EPSILON {
            return None;
        }

        let ray = Ray::new(from, delta / length);
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.handle)
            .groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND));

        let (_collider, hit) = self.query.cast_ray_and_get_normal(
            self.bodies,
            self.colliders,
            &ray,
            length,
            true,
            filter,
        )?;

        Some(TraceHit {
            position: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
            distance: hit.time_of_impact,
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
        self.commands.push(BodyCommand::SetAngvel(angvel));
    }

    fn velocity_at_point(&self, point: &Point<Real>) -> Vector<Real> {
        // v = v_com + w x (p - com)
        self.linvel + self.angvel.cross(&(point - self.com))
    }

    fn apply_force(&mut self, force: Vector<Real>) {
        self.commands.push(BodyCommand::Force(force));
    }

    fn apply_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>) {
        self.commands.push(BodyCommand::ForceAtPoint(force, point));
    }

    fn apply_torque(&mut self, torque: Vector<Real>) {
        self.commands.push(BodyCommand::Torque(torque));
    }
}

/// Apply queued commands as persistent user forces (they were reset first).
fn apply_commands(body: &mut RigidBody, commands: &[BodyCommand]) {
    for command in commands {
        match *command {
            BodyCommand::Force(f) => body.add_force(f, true),
            BodyCommand::ForceAtPoint(f, p) => body.add_force_at_point(f, p, true),
            BodyCommand::Torque(t) => body.add_torque(t, true),
            BodyCommand::SetAngvel(w) => body.set_angvel(w, true),
        }
    }
}

// ------------------------------------------------------------
// World
// ------------------------------------------------------------

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet, // for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting
    pub vehicles: HashMap<String, Vehicle>, // vehicle id -> vehicle
    pub tick: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Static ground box: half height 1.0 centered at y = -1, top face at y = 0.
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
            tick: 0,
        }
    }

    /// Spawn a chassis box whose mass equals `tuning.mass`.
    ///
    /// The chassis collides with the ground only (never with other cars), and
    /// carries no friction: grip comes from the wheel model.
    pub fn spawn_vehicle(&mut self, id: impl Into<String>, tuning: &VehicleTuning, position: [f32; 3]) -> RigidBodyHandle {
        let id = id.into();
        let [hx, hy, hz] = tuning.chassis_half_extents;
        let volume = 8.0 * hx * hy * hz;
        let density = tuning.mass / volume; // rho = m / V

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .linear_damping(tuning.linear_damping)
            .angular_damping(tuning.angular_damping)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);

        if let Some(old) = self.vehicles.insert(id.clone(), Vehicle::new(id.clone(), handle, tuning)) {
            warn!(vehicle = %id, "respawn replaces an existing vehicle");
            self.remove_body(old.body);
        }

        info!(vehicle = %id, ?position, body = ?handle, mass = tuning.mass, "spawned vehicle");
        handle
    }

    pub fn despawn_vehicle(&mut self, id: &str) -> bool {
        match self.vehicles.remove(id) {
            Some(v) => {
                self.remove_body(v.body);
                info!(vehicle = %id, "despawned vehicle");
                true
            }
            None => false,
        }
    }

    fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Store intent for the next `step`; `false` for unknown vehicles.
    pub fn set_intent(&mut self, id: &str, intent: DriverIntent) -> bool {
        match self.vehicles.get_mut(id) {
            Some(v) => {
                v.intent = intent.clamped();
                true
            }
            None => false,
        }
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Run every vehicle's tick, then advance the rigid-body world by `dt`.
    /// Invalid `dt` (zero, negative, non-finite) skips the whole step.
    pub fn step(&mut self, dt: Real) {
        if !(dt.is_finite() && dt > 0.0) {
            warn!(dt, tick = self.tick, "rejecting world step with invalid timestep");
            return;
        }

        self.query_pipeline.update(&self.colliders);

        self.drive_vehicles(dt);

        let hooks = ();
        let events = ();
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        self.reset_runaway_bodies();
        self.tick += 1;
    }

    fn drive_vehicles(&mut self, dt: Real) {
        let PhysicsWorld { vehicles, bodies, colliders, query_pipeline, .. } = self;

        // stable order keeps multi-vehicle runs reproducible
        let mut ids: Vec<String> = vehicles.keys().cloned().collect();
        ids.sort();

        for id in ids {
            let Some(vehicle) = vehicles.get_mut(&id) else { continue };

            if let Some(body) = bodies.get_mut(vehicle.body) {
                body.reset_forces(false);
                body.reset_torques(false);
            }

            let Some(mut chassis) = RapierChassis::new(query_pipeline, bodies, colliders, vehicle.body) else {
                warn!(vehicle = %id, "vehicle body is missing, skipping tick");
                continue;
            };

            match vehicle.sim.step(&mut chassis, vehicle.intent, dt) {
                Ok(report) => {
                    vehicle.last_report = Some(report);
                    vehicle.last_poses = Some(vehicle.sim.wheel_poses(&chassis, dt));
                }
                Err(err) => {
                    warn!(vehicle = %id, %err, "vehicle tick skipped");
                    continue;
                }
            }

            let commands = chassis.into_commands();
            debug!(vehicle = %id, commands = commands.len(), "applying vehicle forces");

            if let Some(body) = bodies.get_mut(vehicle.body) {
                apply_commands(body, &commands);
            }
        }
    }

    fn reset_runaway_bodies(&mut self) {
        for (handle, body) in self.bodies.iter_mut() {
            let pos = *body.translation();

            let bad = !pos.x.is_finite() || !pos.y.is_finite() || !pos.z.is_finite()
                || pos.x.abs() > RUNAWAY_LIMIT
                || pos.y.abs() > RUNAWAY_LIMIT
                || pos.z.abs() > RUNAWAY_LIMIT;

            if bad {
                let safe = vector![0.0, 1.0, 0.0];
                body.set_translation(safe, true);
                body.set_rotation(Rotation::identity(), true);
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);

                warn!(body = ?handle, from = ?v3(pos), "reset runaway body above the origin");
            }
        }
    }

    /// Telemetry for every vehicle, sorted by id.
    pub fn snapshot(&self) -> Snapshot {
        let mut vehicles: Vec<VehicleSnapshot> = self
            .vehicles
            .values()
            .filter_map(|v| v.snapshot(&self.bodies))
            .collect();
        vehicles.sort_by(|a, b| a.id.cmp(&b.id));

        Snapshot { tick: self.tick, vehicles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_top_is_at_zero() {
        let mut world = PhysicsWorld::new();
        world.query_pipeline.update(&world.colliders);

        let handle = world.bodies.insert(RigidBodyBuilder::fixed().translation(vector![0.0, 50.0, 0.0]).build());
        let chassis = RapierChassis::new(&world.query_pipeline, &world.bodies, &world.colliders, handle).unwrap();

        let hit = chassis.cast_ray(point![3.0, 2.0, -4.0], point![3.0, -2.0, -4.0]).unwrap();
        assert!((hit.position.y).abs() < 1e-4);
        assert!((hit.distance - 2.0).abs() < 1e-4);
        assert!((hit.normal - Vector::y()).norm() < 1e-4);

        assert!(chassis.cast_ray(point![0.0, 2.0, 0.0], point![0.0, 0.5, 0.0]).is_none());
    }

    #[test]
    fn chassis_mass_matches_tuning() {
        let mut world = PhysicsWorld::new();
        let tuning = VehicleTuning::hatchback();
        let handle = world.spawn_vehicle("car", &tuning, [0.0, 2.0, 0.0]);
        let mass = world.bodies[handle].mass();
        assert!((mass - tuning.mass).abs() / tuning.mass < 1e-3);
    }

    #[test]
    fn chassis_rays_ignore_the_chassis_itself() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle("car", &VehicleTuning::hatchback(), [0.0, 3.0, 0.0]);
        world.query_pipeline.update(&world.colliders);

        let chassis = RapierChassis::new(&world.query_pipeline, &world.bodies, &world.colliders, handle).unwrap();
        // straight through the chassis box down to the ground
        let hit = chassis.cast_ray(point![0.0, 4.0, 0.0], point![0.0, -1.0, 0.0]).unwrap();
        assert!(hit.position.y.abs() < 1e-4);
    }

    #[test]
    fn queued_commands_do_not_touch_the_body_until_applied() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle("car", &VehicleTuning::hatchback(), [0.0, 3.0, 0.0]);
        world.query_pipeline.update(&world.colliders);

        let mut chassis = RapierChassis::new(&world.query_pipeline, &world.bodies, &world.colliders, handle).unwrap();
        chassis.apply_force(vector![0.0, 10.0, 0.0]);
        chassis.set_angular_velocity(vector![0.0, 1.0, 0.0]);
        assert_eq!(chassis.angular_velocity(), vector![0.0, 1.0, 0.0]);
        let commands = chassis.into_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(*world.bodies[handle].angvel(), vector![0.0, 0.0, 0.0]);

        apply_commands(&mut world.bodies[handle], &commands);
        assert_eq!(*world.bodies[handle].angvel(), vector![0.0, 1.0, 0.0]);
    }

    #[test]
    fn runaway_bodies_are_reset() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle("car", &VehicleTuning::hatchback(), [0.0, 2.0, 0.0]);
        world.bodies[handle].set_translation(vector![5_000.0, 2.0, 0.0], true);
        world.step(1.0 / 60.0);
        let pos = world.bodies[handle].translation();
        assert!(pos.x.abs() < 1.0);
    }

    #[test]
    fn invalid_timestep_leaves_the_world_untouched() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle("car", &VehicleTuning::hatchback(), [0.0, 2.0, 0.0]);
        world.set_intent("car", DriverIntent { throttle: 1.0, ..DriverIntent::default() });

        for dt in [0.0, -1.0 / 60.0, Real::NAN, Real::INFINITY] {
            world.step(dt);
        }

        assert_eq!(world.tick, 0);
        assert_eq!(*world.bodies[handle].translation(), vector![0.0, 2.0, 0.0]);
        assert_eq!(*world.bodies[handle].linvel(), vector![0.0, 0.0, 0.0]);
        assert!(world.vehicle("car").unwrap().last_report.is_none());

        world.step(1.0 / 60.0);
        assert_eq!(world.tick, 1);
        assert!(world.vehicle("car").unwrap().last_report.is_some());
    }

    #[test]
    fn intents_for_unknown_vehicles_are_rejected() {
        let mut world = PhysicsWorld::new();
        assert!(!world.set_intent("ghost", DriverIntent::default()));
        world.spawn_vehicle("car", &VehicleTuning::hatchback(), [0.0, 2.0, 0.0]);
        assert!(world.set_intent("car", DriverIntent { throttle: 3.0, ..DriverIntent::default() }));
        assert_eq!(world.vehicle("car").unwrap().intent.throttle, 1.0);
        assert!(world.despawn_vehicle("car"));
        assert_eq!(world.bodies.len(), 1);
        assert!(world.vehicle("car").is_none());
    }
}
