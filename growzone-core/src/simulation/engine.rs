use super::{
    state::{PlantRecord, SimulationState, ZoneRecord, ZoneTickReport},
    zone::{step_zone, zone_report},
};
use crate::{error::GrowzoneError, logger::TimeSeriesLogger, physics::clamp01};
use growzone_schemas::{
    command::Command, config::SimulationConfig, environment::ZoneGeometry, event::SimulationEvent,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub struct SimulationEngine {
    pub(super) state: SimulationState,
    pub(super) config: SimulationConfig,
    pub(super) scheduled: BTreeMap<u64, Vec<Command>>,
    pub(super) tick_limit: Option<u64>,
    pub(super) logger: Option<TimeSeriesLogger>,
    pub(super) last_reports: Vec<ZoneTickReport>,
}

impl SimulationEngine {
    /// Runs until the tick limit is reached.
    pub fn run(&mut self) -> Result<(), GrowzoneError> {
        let limit = self
            .tick_limit
            .ok_or_else(|| GrowzoneError::ConfigError("run() needs a tick limit".to_string()))?;
        info!(
            zones = self.state.zones.len(),
            plants = self.state.plants.len(),
            ticks = limit,
            tick_hours = self.state.clock.tick_hours(),
            "starting simulation"
        );

        if let Some(logger) = &mut self.logger {
            let initial = initial_reports(&self.state);
            logger.log_tick(0, &initial, &[])?;
        }

        while self.tick()? {}

        info!(
            tick = self.state.clock.tick,
            elapsed_hours = self.state.clock.elapsed_hours(),
            "simulation complete"
        );
        Ok(())
    }

    /// Advances every zone by one tick. Returns `false` once the tick limit has been reached.
    pub fn tick(&mut self) -> Result<bool, GrowzoneError> {
        if self.tick_limit.is_some_and(|limit| self.state.clock.tick >= limit) {
            return Ok(false);
        }

        let tick = self.state.clock.tick + 1;
        if let Some(commands) = self.scheduled.remove(&tick) {
            for command in commands {
                if let Err(e) = self.execute_command(command) {
                    warn!(tick, error = %e, "scheduled command skipped");
                }
            }
        }

        self.state.clock.tick = tick;
        self.state.events.clear();

        let SimulationState {
            clock,
            zones,
            plants,
            events,
        } = &mut self.state;
        let reports: Vec<ZoneTickReport> = zones
            .values_mut()
            .map(|zone| step_zone(zone, plants, &self.config, clock, events))
            .collect();

        if let Some(logger) = &mut self.logger {
            logger.log_tick(tick, &reports, &self.state.events)?;
        }
        self.last_reports = reports;

        Ok(true)
    }

    pub fn execute_command(&mut self, command: Command) -> Result<(), GrowzoneError> {
        match command {
            Command::SetDeviceStatus {
                zone_id,
                device_id,
                status,
            } => {
                let zone = zone_mut(&mut self.state, &zone_id)?;
                let device = zone
                    .devices
                    .iter_mut()
                    .find(|d| d.id == device_id)
                    .ok_or_else(|| GrowzoneError::DeviceNotFound {
                        zone_id: zone_id.clone(),
                        device_id: device_id.clone(),
                    })?;
                device.status = status;
                info!(%zone_id, %device_id, ?status, "device status changed");
            }
            Command::SetDeviceEfficiency {
                zone_id,
                device_id,
                efficiency,
            } => {
                let zone = zone_mut(&mut self.state, &zone_id)?;
                let device = zone
                    .devices
                    .iter_mut()
                    .find(|d| d.id == device_id)
                    .ok_or_else(|| GrowzoneError::DeviceNotFound {
                        zone_id: zone_id.clone(),
                        device_id: device_id.clone(),
                    })?;
                device.efficiency = clamp01(efficiency);
            }
            Command::RefillReservoir {
                zone_id,
                water_liters,
                nutrient_solution_liters,
            } => {
                let zone = zone_mut(&mut self.state, &zone_id)?;
                let resources = &mut zone.resources;
                let room = (resources.reservoir_capacity_liters - resources.water_liters).max(0.0);
                resources.water_liters += water_liters.max(0.0).min(room);
                resources.nutrient_solution_liters += nutrient_solution_liters.max(0.0);
                info!(%zone_id, water_liters = resources.water_liters, "reservoir refilled");
            }
            Command::SetNutrientStrength { zone_id, strength } => {
                zone_mut(&mut self.state, &zone_id)?.resources.nutrient_strength = clamp01(strength);
            }
            Command::ResizeZone {
                zone_id,
                area_m2,
                ceiling_height_m,
            } => {
                let zone = zone_mut(&mut self.state, &zone_id)?;
                zone.geometry = ZoneGeometry::new(area_m2, ceiling_height_m);
                info!(%zone_id, volume_m3 = zone.geometry.volume_m3(), "zone resized");
            }
            Command::RemovePlant { plant_id } => {
                let record = self
                    .state
                    .plants
                    .remove(&plant_id)
                    .ok_or_else(|| GrowzoneError::PlantNotFound(plant_id.clone()))?;
                if let Some(zone) = self.state.zones.get_mut(&record.state.zone_id) {
                    zone.plant_ids.remove(&plant_id);
                }
                info!(
                    %plant_id,
                    stage = record.state.stage.as_str(),
                    biomass_dry_g = record.state.biomass_dry_g,
                    "plant removed"
                );
            }
        }
        Ok(())
    }

    /// Queues a command for the start of `tick`. A command whose target is gone by then is
    /// logged and skipped.
    pub fn schedule_command(&mut self, tick: u64, command: Command) {
        self.scheduled.entry(tick).or_default().push(command);
    }

    pub fn get_tick(&self) -> u64 {
        self.state.clock.tick
    }

    pub fn get_state(&self) -> &SimulationState {
        &self.state
    }

    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn get_zones(&self) -> &BTreeMap<String, ZoneRecord> {
        &self.state.zones
    }

    pub fn get_zone(&self, zone_id: &str) -> Option<&ZoneRecord> {
        self.state.zones.get(zone_id)
    }

    pub fn get_plants(&self) -> &BTreeMap<String, PlantRecord> {
        &self.state.plants
    }

    pub fn get_plant(&self, plant_id: &str) -> Option<&PlantRecord> {
        self.state.plants.get(plant_id)
    }

    /// Events raised during the most recent tick.
    pub fn get_events(&self) -> &[SimulationEvent] {
        &self.state.events
    }

    pub fn get_last_reports(&self) -> &[ZoneTickReport] {
        &self.last_reports
    }
}

fn zone_mut<'a>(
    state: &'a mut SimulationState,
    zone_id: &str,
) -> Result<&'a mut ZoneRecord, GrowzoneError> {
    state
        .zones
        .get_mut(zone_id)
        .ok_or_else(|| GrowzoneError::ZoneNotFound(zone_id.to_string()))
}

fn initial_reports(state: &SimulationState) -> Vec<ZoneTickReport> {
    state
        .zones
        .values()
        .map(|zone| zone_report(zone, &state.plants, state.clock.tick))
        .collect()
}
