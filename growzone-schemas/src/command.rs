use crate::device::DeviceStatus;
use serde::{Deserialize, Serialize};

/// Instructions from collaborators outside the simulation core (maintenance crews,
/// irrigation staff, harvest), applied between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    SetDeviceStatus {
        zone_id: String,
        device_id: String,
        status: DeviceStatus,
    },
    SetDeviceEfficiency {
        zone_id: String,
        device_id: String,
        efficiency: f64,
    },
    RefillReservoir {
        zone_id: String,
        water_liters: f64,
        #[serde(default)]
        nutrient_solution_liters: f64,
    },
    SetNutrientStrength {
        zone_id: String,
        strength: f64,
    },
    ResizeZone {
        zone_id: String,
        area_m2: f64,
        ceiling_height_m: f64,
    },
    RemovePlant {
        plant_id: String,
    },
}

/// A command to execute at the start of the given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub tick: u64,
    pub command: Command,
}
