use rapier3d::prelude::*;

use crate::drive_core::{DriverIntent, TickReport, VehicleSimulation, VehicleTuning, WheelPose};
use crate::state::VehicleSnapshot;

pub struct Vehicle {
    pub id: String,
    pub body: RigidBodyHandle,         // the chassis body
    pub sim: VehicleSimulation,        // axles, tuning and tick state
    pub intent: DriverIntent,          // applied on the next world step
    pub last_report: Option<TickReport>,
    pub last_poses: Option<[WheelPose; 4]>,
}

impl Vehicle {
    pub fn new(id: String, body: RigidBodyHandle, tuning: &VehicleTuning) -> Self {
        Self {
            id,
            body,
            sim: VehicleSimulation::new(tuning),
            intent: DriverIntent::default(),
            last_report: None,
            last_poses: None,
        }
    }

    /// `None` when the body no longer exists.
    pub fn snapshot(&self, bodies: &RigidBodySet) -> Option<VehicleSnapshot> {
        let body = bodies.get(self.body)?;
        let pos = body.translation();
        let rot = body.rotation().coords;
        let vel = body.linvel();

        Some(VehicleSnapshot {
            id: self.id.clone(),
            position: [pos.x, pos.y, pos.z],
            rotation: [rot.x, rot.y, rot.z, rot.w],
            velocity: [vel.x, vel.y, vel.z],
            intent: self.intent,
            report: self.last_report,
            wheels: self.last_poses.map(|p| p.to_vec()).unwrap_or_default(),
        })
    }
}
