use crate::simulation::state::ZoneTickReport;
use csv::Writer;
use growzone_schemas::event::SimulationEvent;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// One CSV row: the state of one zone after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub tick: u64,
    pub zone_id: String,
    pub temperature_c: f64,
    pub relative_humidity: f64,
    pub co2_ppm: f64,
    pub ppfd: f64,
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
    pub stage_counts_json: String,
    pub events_json: String,
}

pub struct TimeSeriesLogger {
    writer: Writer<fs::File>,
}

impl TimeSeriesLogger {
    pub fn new(path: &str) -> Result<Self, io::Error> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_tick(
        &mut self,
        tick: u64,
        reports: &[ZoneTickReport],
        events: &[SimulationEvent],
    ) -> Result<(), anyhow::Error> {
        for report in reports {
            let zone_events: Vec<&SimulationEvent> = events
                .iter()
                .filter(|e| e.payload.zone_id() == report.zone_id)
                .collect();

            let entry = LogEntry {
                tick,
                zone_id: report.zone_id.clone(),
                temperature_c: report.environment.temperature_c,
                relative_humidity: report.environment.relative_humidity,
                co2_ppm: report.environment.co2_ppm,
                ppfd: report.environment.ppfd,
                vpd_kpa: report.vpd_kpa,
                energy_kwh: report.energy_kwh,
                airflow_m3_per_h: report.airflow_m3_per_h,
                transpiration_liters: report.transpiration_liters,
                water_consumed_liters: report.water_consumed_liters,
                nutrients_consumed_g: report.nutrients_consumed_g,
                water_liters: report.water_liters,
                reservoir_level: report.reservoir_level,
                nutrient_strength: report.nutrient_strength,
                plant_count: report.plant_count,
                biomass_delta_g: report.biomass_delta_g,
                total_biomass_g: report.total_biomass_g,
                mean_health: report.mean_health,
                mean_stress: report.mean_stress,
                stage_counts_json: serde_json::to_string(&report.stage_counts)?,
                events_json: serde_json::to_string(&zone_events)?,
            };
            self.writer.serialize(entry)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
