use arcade_drive::drive_core::{DriverIntent, VehicleTuning, WheelId};
use arcade_drive::physics::PhysicsWorld;

const DT: f32 = 1.0 / 60.0;

fn settled_world(tuning: &VehicleTuning) -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    world.spawn_vehicle("car", tuning, [0.0, 1.2, 0.0]);
    for _ in 0..180 {
        world.step(DT);
    }
    world
}

#[test]
fn car_settles_on_four_wheels() {
    let world = settled_world(&VehicleTuning::hatchback());
    let car = world.vehicle("car").unwrap();
    let body = &world.bodies[car.body];

    assert_eq!(car.sim.grounded_wheel_count(), 4);
    assert!(body.linvel().norm() < 0.2, "still moving: {:?}", body.linvel());

    let y = body.translation().y;
    assert!(y > 0.6 && y < 1.1, "ride height {y}");

    for id in WheelId::ALL {
        let w = car.sim.wheel(id);
        assert!(w.compression > 0.0 && w.compression < 1.0, "{id} compression {}", w.compression);
    }
}

#[test]
fn throttle_drives_forward_along_z() {
    let mut world = settled_world(&VehicleTuning::hatchback());
    let start = world.bodies[world.vehicle("car").unwrap().body].translation().z;

    world.set_intent("car", DriverIntent { throttle: 1.0, ..DriverIntent::default() });
    for _ in 0..180 {
        world.step(DT);
    }

    let car = world.vehicle("car").unwrap();
    let body = &world.bodies[car.body];
    assert!(body.translation().z - start > 2.0);
    assert!(body.translation().x.abs() < 1.0);

    let report = car.last_report.unwrap();
    assert!(report.speed_ms > 1.0);
    assert!(!report.airborne);
}

#[test]
fn reverse_throttle_backs_up() {
    let mut world = settled_world(&VehicleTuning::hatchback());
    world.set_intent("car", DriverIntent { throttle: -1.0, ..DriverIntent::default() });
    for _ in 0..120 {
        world.step(DT);
    }
    let car = world.vehicle("car").unwrap();
    assert!(car.last_report.unwrap().speed_ms < -0.5);
}

#[test]
fn steering_right_turns_towards_negative_x() {
    let mut world = settled_world(&VehicleTuning::hatchback());
    world.set_intent("car", DriverIntent { throttle: 1.0, steer: 1.0, handbrake: false });
    for _ in 0..120 {
        world.step(DT);
    }
    let car = world.vehicle("car").unwrap();
    assert!(car.sim.steer_angle_degrees() > 0.0);
    assert!(world.bodies[car.body].translation().x < 0.0);
}

#[test]
fn dropped_car_reports_airborne_first() {
    let mut world = PhysicsWorld::new();
    world.spawn_vehicle("car", &VehicleTuning::rally(), [0.0, 6.0, 0.0]);
    world.step(DT);

    let report = world.vehicle("car").unwrap().last_report.unwrap();
    assert!(report.airborne);
    assert_eq!(report.grounded_wheels, 0);
}

#[test]
fn snapshots_carry_four_wheel_poses() {
    let world = settled_world(&VehicleTuning::rally());
    let snapshot = world.snapshot();
    assert_eq!(snapshot.tick, 180);
    assert_eq!(snapshot.vehicles.len(), 1);
    assert_eq!(snapshot.vehicles[0].wheels.len(), 4);

    let line = snapshot.to_json_line().unwrap();
    assert!(line.starts_with(r#"{"tick":180"#));
}

#[test]
fn tuning_file_round_trips() {
    let path = std::env::temp_dir().join(format!("arcade-drive-{}.json", std::process::id()));
    let tuning = VehicleTuning::rally();
    std::fs::write(&path, tuning.to_json_pretty().unwrap()).unwrap();

    let loaded = VehicleTuning::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.mass, tuning.mass);
    assert_eq!(loaded.front_axle.anti_roll_force, tuning.front_axle.anti_roll_force);
}
