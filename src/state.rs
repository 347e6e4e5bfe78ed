use serde::Serialize;

use crate::drive_core::{DriverIntent, TickReport, WheelPose};

#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (i, j, k, w)
    pub velocity: [f32; 3],
    pub intent: DriverIntent,
    pub report: Option<TickReport>,
    pub wheels: Vec<WheelPose>,
}

/// One world tick worth of telemetry, one JSON line per tick.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub vehicles: Vec<VehicleSnapshot>,
}

impl Snapshot {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
