use crate::{
    command::ScheduledCommand,
    config::SimulationConfig,
    device::DeviceInstance,
    environment::{ZoneEnvironment, ZoneGeometry, ZoneResources},
    plant::Planting,
    strain::StrainProfile,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StrainFile {
    pub schema_version: String,
    pub strains: Vec<StrainProfile>,
}

/// Initial layout of one zone in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub id: String,
    pub name: String,
    pub geometry: ZoneGeometry,
    #[serde(default)]
    pub environment: ZoneEnvironment,
    #[serde(default)]
    pub resources: ZoneResources,
    #[serde(default)]
    pub devices: Vec<DeviceInstance>,
    #[serde(default)]
    pub plants: Vec<Planting>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: SimulationConfig,
    pub zones: Vec<ZoneSpec>,
    #[serde(default)]
    pub scheduled_commands: Vec<ScheduledCommand>,
}
