use crate::{
    controller::ClimateController,
    environment::clamp_to_safety,
    error::GrowzoneError,
    growth::DEFAULT_CANOPY_AREA_M2,
    logger::TimeSeriesLogger,
    phenology::PhenologyConfig,
    physics::non_negative,
    simulation::{
        engine::SimulationEngine,
        state::{PlantRecord, SimulationState, TickClock, ZoneRecord},
    },
};
use growzone_schemas::{
    command::{Command, ScheduledCommand},
    config::SimulationConfig,
    environment::ZoneGeometry,
    file_formats::{ScenarioFile, ZoneSpec},
    plant::{PhenologyState, PlantState, DEFAULT_QUALITY},
    strain::StrainProfile,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A fluent builder for constructing a `SimulationEngine`.
///
/// Every plant's strain is resolved here, so a running engine never meets a dangling
/// strain reference.
#[derive(Default)]
pub struct SimulationBuilder {
    config: Option<SimulationConfig>,
    zones: Vec<ZoneSpec>,
    strains: HashMap<String, StrainProfile>,
    scheduled_commands: Vec<ScheduledCommand>,
    tick_limit: Option<u64>,
    log_path: Option<String>,
}

impl SimulationBuilder {
    /// Creates a new, empty `SimulationBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a parsed scenario: its config, zones and scheduled commands.
    pub fn from_scenario(scenario: ScenarioFile) -> Self {
        Self::new()
            .with_config(scenario.config)
            .with_zones(scenario.zones)
            .with_scheduled_commands(scenario.scheduled_commands)
    }

    /// Sets the run configuration. Defaults apply when never called.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the zones to simulate, replacing any added before.
    pub fn with_zones(mut self, zones: Vec<ZoneSpec>) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_zone(mut self, zone: ZoneSpec) -> Self {
        self.zones.push(zone);
        self
    }

    /// Registers strain profiles by id. Later profiles replace earlier ones with the same id.
    pub fn with_strains(mut self, strains: impl IntoIterator<Item = StrainProfile>) -> Self {
        self.strains
            .extend(strains.into_iter().map(|s| (s.id.clone(), s)));
        self
    }

    pub fn with_scheduled_commands(mut self, commands: Vec<ScheduledCommand>) -> Self {
        self.scheduled_commands.extend(commands);
        self
    }

    /// Number of ticks `SimulationEngine::run` executes.
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    /// Configures the simulation to write time-series data to the specified CSV file.
    pub fn with_timeseries_logging_to_file(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    /// Consumes the builder and returns a fully configured `SimulationEngine`.
    ///
    /// # Errors
    ///
    /// Returns a `GrowzoneError` if no zones were given, ids collide, a plant names an
    /// unknown strain, a scheduled command targets a zone, device or plant that does not
    /// exist, the tick length is not positive or the log file cannot be created.
    pub fn build(self) -> Result<SimulationEngine, GrowzoneError> {
        if self.zones.is_empty() {
            return Err(GrowzoneError::NoZonesProvided);
        }
        let config = self.config.unwrap_or_default();
        if !(config.tick_length_minutes.is_finite() && config.tick_length_minutes > 0.0) {
            return Err(GrowzoneError::ConfigError(format!(
                "tick length must be positive, got {} minutes",
                config.tick_length_minutes
            )));
        }

        let mut resolved: HashMap<String, (Arc<StrainProfile>, Arc<PhenologyConfig>)> =
            HashMap::new();
        for (id, strain) in self.strains {
            let phenology = Arc::new(PhenologyConfig::from_strain(&strain));
            resolved.insert(id, (Arc::new(strain), phenology));
        }

        let mut zones = BTreeMap::new();
        let mut plants = BTreeMap::new();
        for layout in self.zones {
            if zones.contains_key(&layout.id) {
                return Err(GrowzoneError::DuplicateId {
                    kind: "zone",
                    id: layout.id,
                });
            }

            let mut plant_ids = BTreeSet::new();
            for planting in layout.plants {
                if plants.contains_key(&planting.id) {
                    return Err(GrowzoneError::DuplicateId {
                        kind: "plant",
                        id: planting.id,
                    });
                }
                let (strain, phenology_config) = resolved
                    .get(&planting.strain_id)
                    .cloned()
                    .ok_or_else(|| GrowzoneError::StrainNotFound {
                        plant_id: planting.id.clone(),
                        strain_id: planting.strain_id.clone(),
                    })?;

                let state = PlantState {
                    id: planting.id.clone(),
                    strain_id: planting.strain_id,
                    zone_id: layout.id.clone(),
                    stage: planting.stage,
                    age_hours: 0.0,
                    biomass_dry_g: non_negative(planting.biomass_dry_g),
                    health: 1.0,
                    stress: 0.0,
                    canopy_area_m2: planting
                        .canopy_area_m2
                        .filter(|a| a.is_finite() && *a > 0.0)
                        .unwrap_or(DEFAULT_CANOPY_AREA_M2),
                    transpired_liters_total: 0.0,
                    last_photosynthesis_g: 0.0,
                    yield_dry_g: 0.0,
                    quality: DEFAULT_QUALITY,
                };
                let phenology = PhenologyState {
                    total_light_hours: non_negative(planting.total_light_hours),
                    ..PhenologyState::new(planting.stage)
                };
                plant_ids.insert(planting.id.clone());
                plants.insert(
                    planting.id,
                    PlantRecord {
                        state,
                        phenology,
                        strain,
                        phenology_config,
                    },
                );
            }

            let mut environment = layout.environment;
            clamp_to_safety(&mut environment, &config.safety);
            zones.insert(
                layout.id.clone(),
                ZoneRecord {
                    id: layout.id,
                    name: layout.name,
                    geometry: ZoneGeometry::new(layout.geometry.area_m2, layout.geometry.ceiling_height_m),
                    environment,
                    resources: layout.resources,
                    devices: layout.devices,
                    plant_ids,
                    pending_influx_liters: 0.0,
                    controller: config.climate_controller.map(ClimateController::new),
                    energy_kwh_total: 0.0,
                    water_consumed_liters_total: 0.0,
                    nutrients_consumed_g_total: 0.0,
                },
            );
        }

        let mut scheduled: BTreeMap<u64, Vec<_>> = BTreeMap::new();
        for entry in self.scheduled_commands {
            check_command_targets(&entry.command, &zones, &plants)?;
            scheduled.entry(entry.tick).or_default().push(entry.command);
        }

        let logger = match self.log_path {
            Some(path) => Some(
                TimeSeriesLogger::new(&path).map_err(|e| GrowzoneError::FileIO(path.clone(), e))?,
            ),
            None => None,
        };

        let state = SimulationState {
            clock: TickClock {
                tick: 0,
                tick_length_minutes: config.tick_length_minutes,
            },
            zones,
            plants,
            events: Vec::new(),
        };

        Ok(SimulationEngine {
            state,
            config,
            scheduled,
            tick_limit: self.tick_limit,
            logger,
            last_reports: Vec::new(),
        })
    }
}

fn check_command_targets(
    command: &Command,
    zones: &BTreeMap<String, ZoneRecord>,
    plants: &BTreeMap<String, PlantRecord>,
) -> Result<(), GrowzoneError> {
    let zone_exists = |zone_id: &str| {
        zones
            .get(zone_id)
            .ok_or_else(|| GrowzoneError::ZoneNotFound(zone_id.to_string()))
    };
    match command {
        Command::SetDeviceStatus { zone_id, device_id, .. }
        | Command::SetDeviceEfficiency { zone_id, device_id, .. } => {
            let zone = zone_exists(zone_id)?;
            if !zone.devices.iter().any(|d| &d.id == device_id) {
                return Err(GrowzoneError::DeviceNotFound {
                    zone_id: zone_id.clone(),
                    device_id: device_id.clone(),
                });
            }
        }
        Command::RefillReservoir { zone_id, .. }
        | Command::SetNutrientStrength { zone_id, .. }
        | Command::ResizeZone { zone_id, .. } => {
            zone_exists(zone_id)?;
        }
        Command::RemovePlant { plant_id } => {
            if !plants.contains_key(plant_id) {
                return Err(GrowzoneError::PlantNotFound(plant_id.clone()));
            }
        }
    }
    Ok(())
}
