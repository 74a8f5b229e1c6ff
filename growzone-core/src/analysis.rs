//! Post-run analysis of a time-series log: the per-zone totals that external cost and
//! yield accounting consume.

use crate::{error::GrowzoneError, logger::LogEntry};
use growzone_schemas::event::{EventLevel, SimulationEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub ticks: u64,
    pub total_energy_kwh: f64,
    pub total_transpiration_liters: f64,
    pub total_water_consumed_liters: f64,
    pub total_nutrients_consumed_g: f64,
    pub final_biomass_g: f64,
    pub final_mean_health: f64,
    pub peak_temperature_c: f64,
    pub min_temperature_c: f64,
    pub mean_relative_humidity: f64,
    pub stage_changes: u64,
    pub warnings: u64,
    pub errors: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_ticks: u64,
    pub zones: BTreeMap<String, ZoneSummary>,
}

impl RunSummary {
    pub fn total_energy_kwh(&self) -> f64 {
        self.zones.values().map(|z| z.total_energy_kwh).sum()
    }

    pub fn total_biomass_g(&self) -> f64 {
        self.zones.values().map(|z| z.final_biomass_g).sum()
    }
}

pub fn read_log(log_path: &str) -> Result<Vec<LogEntry>, GrowzoneError> {
    let mut reader = csv::Reader::from_path(log_path)
        .map_err(|e| GrowzoneError::CsvError(log_path.to_string(), e))?;
    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let entry: LogEntry = result.map_err(|e| GrowzoneError::CsvError(log_path.to_string(), e))?;
        entries.push(entry);
    }
    Ok(entries)
}

pub fn summarize_log(log_path: &str) -> Result<RunSummary, GrowzoneError> {
    summarize_entries(&read_log(log_path)?)
}

/// Folds log rows into per-zone totals. The tick-0 snapshot only seeds the temperature range.
pub fn summarize_entries(entries: &[LogEntry]) -> Result<RunSummary, GrowzoneError> {
    let mut summary = RunSummary::default();
    let mut humidity_sums: BTreeMap<String, f64> = BTreeMap::new();

    for entry in entries {
        summary.total_ticks = summary.total_ticks.max(entry.tick);
        let zone = summary.zones.entry(entry.zone_id.clone()).or_insert_with(|| ZoneSummary {
            peak_temperature_c: f64::MIN,
            min_temperature_c: f64::MAX,
            ..ZoneSummary::default()
        });
        zone.peak_temperature_c = zone.peak_temperature_c.max(entry.temperature_c);
        zone.min_temperature_c = zone.min_temperature_c.min(entry.temperature_c);
        zone.final_biomass_g = entry.total_biomass_g;
        zone.final_mean_health = entry.mean_health;
        if entry.tick == 0 {
            continue;
        }

        zone.ticks += 1;
        zone.total_energy_kwh += entry.energy_kwh;
        zone.total_transpiration_liters += entry.transpiration_liters;
        zone.total_water_consumed_liters += entry.water_consumed_liters;
        zone.total_nutrients_consumed_g += entry.nutrients_consumed_g;
        *humidity_sums.entry(entry.zone_id.clone()).or_insert(0.0) += entry.relative_humidity;

        let events: Vec<SimulationEvent> = serde_json::from_str(&entry.events_json)?;
        for event in events {
            match event.level {
                EventLevel::Warning => zone.warnings += 1,
                EventLevel::Error => zone.errors += 1,
                EventLevel::Info => {}
            }
            if event.payload.kind() == "plant.stageChanged" {
                zone.stage_changes += 1;
            }
        }
    }

    for (zone_id, zone) in summary.zones.iter_mut() {
        if zone.ticks > 0 {
            let sum = humidity_sums.get(zone_id).copied().unwrap_or(0.0);
            zone.mean_relative_humidity = sum / zone.ticks as f64;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tick: u64, zone_id: &str, temperature_c: f64, events_json: &str) -> LogEntry {
        LogEntry {
            tick,
            zone_id: zone_id.into(),
            temperature_c,
            relative_humidity: 0.6,
            co2_ppm: 800.0,
            ppfd: 450.0,
            vpd_kpa: 1.2,
            energy_kwh: if tick == 0 { 0.0 } else { 0.5 },
            airflow_m3_per_h: 0.0,
            transpiration_liters: 0.1,
            water_consumed_liters: 0.1,
            nutrients_consumed_g: 0.05,
            water_liters: 90.0,
            reservoir_level: 0.9,
            nutrient_strength: 1.0,
            plant_count: 1,
            biomass_delta_g: 0.2,
            total_biomass_g: 5.0 + tick as f64,
            mean_health: 0.9,
            mean_stress: 0.1,
            stage_counts_json: r#"{"vegetative":1}"#.into(),
            events_json: events_json.into(),
        }
    }

    #[test]
    fn initial_row_is_a_snapshot_only() {
        let stage_change = r#"[{"tick":2,"level":"info","type":"plant.stageChanged","plant_id":"p-1","zone_id":"z-1","from":"seedling","to":"vegetative"}]"#;
        let alert = r#"[{"tick":3,"level":"warning","type":"plant.healthAlert","plant_id":"p-1","zone_id":"z-1","health":0.45,"threshold":0.5}]"#;
        let entries = vec![
            row(0, "z-1", 30.0, "[]"),
            row(1, "z-1", 24.0, "[]"),
            row(2, "z-1", 25.0, stage_change),
            row(3, "z-1", 23.0, alert),
        ];

        let summary = summarize_entries(&entries).unwrap();
        let zone = &summary.zones["z-1"];
        assert_eq!(summary.total_ticks, 3);
        assert_eq!(zone.ticks, 3);
        assert!((zone.total_energy_kwh - 1.5).abs() < 1e-9);
        assert!((zone.total_transpiration_liters - 0.3).abs() < 1e-9);
        assert_eq!(zone.peak_temperature_c, 30.0);
        assert_eq!(zone.min_temperature_c, 23.0);
        assert_eq!(zone.final_biomass_g, 8.0);
        assert_eq!(zone.stage_changes, 1);
        assert_eq!(zone.warnings, 1);
        assert_eq!(zone.errors, 0);
        assert!((zone.mean_relative_humidity - 0.6).abs() < 1e-9);
    }

    #[test]
    fn malformed_event_column_is_a_json_error() {
        let entries = vec![row(1, "z-1", 24.0, "not json")];
        assert!(matches!(summarize_entries(&entries), Err(GrowzoneError::JsonParsing(_))));
    }
}
