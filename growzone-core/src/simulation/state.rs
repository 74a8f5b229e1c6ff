use crate::{controller::ClimateController, phenology::PhenologyConfig, physics::non_negative};
use growzone_schemas::{
    device::DeviceInstance,
    environment::{ZoneEnvironment, ZoneGeometry, ZoneResources},
    event::SimulationEvent,
    plant::{PhenologyState, PlantStage, PlantState},
    strain::StrainProfile,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickClock {
    /// Number of completed ticks.
    pub tick: u64,
    pub tick_length_minutes: f64,
}

impl TickClock {
    pub fn tick_hours(&self) -> f64 {
        non_negative(self.tick_length_minutes) / 60.0
    }

    pub fn elapsed_hours(&self) -> f64 {
        self.tick as f64 * self.tick_hours()
    }
}

#[derive(Debug, Clone)]
pub struct ZoneRecord {
    pub id: String,
    pub name: String,
    pub geometry: ZoneGeometry,
    pub environment: ZoneEnvironment,
    pub resources: ZoneResources,
    pub devices: Vec<DeviceInstance>,
    pub plant_ids: BTreeSet<String>,
    /// Transpired litres waiting to be released into the air at the next tick.
    pub pending_influx_liters: f64,
    pub controller: Option<ClimateController>,
    pub energy_kwh_total: f64,
    pub water_consumed_liters_total: f64,
    pub nutrients_consumed_g_total: f64,
}

/// A plant together with its phenology counters and resolved strain data.
#[derive(Debug, Clone)]
pub struct PlantRecord {
    pub state: PlantState,
    pub phenology: PhenologyState,
    pub strain: Arc<StrainProfile>,
    pub phenology_config: Arc<PhenologyConfig>,
}

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub clock: TickClock,
    pub zones: BTreeMap<String, ZoneRecord>,
    pub plants: BTreeMap<String, PlantRecord>,
    /// Events raised during the most recent tick.
    pub events: Vec<SimulationEvent>,
}

/// What happened in one zone during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTickReport {
    pub tick: u64,
    pub zone_id: String,
    pub environment: ZoneEnvironment,
    pub vpd_kpa: f64,
    pub energy_kwh: f64,
    pub airflow_m3_per_h: f64,
    pub transpiration_liters: f64,
    pub water_consumed_liters: f64,
    pub nutrients_consumed_g: f64,
    pub water_liters: f64,
    pub reservoir_level: f64,
    pub nutrient_strength: f64,
    pub plant_count: usize,
    pub biomass_delta_g: f64,
    pub total_biomass_g: f64,
    pub mean_health: f64,
    pub mean_stress: f64,
    pub stage_counts: BTreeMap<PlantStage, usize>,
}
