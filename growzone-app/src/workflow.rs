use crate::config::KnowledgeBase;
use anyhow::{Context, Result};
use growzone_core::{
    analysis::{self, RunSummary},
    simulation::builder::SimulationBuilder,
};
use growzone_schemas::{file_formats::ScenarioFile, plant::PlantStage};
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path};
use tracing::info;

/// Final state of one plant at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PlantOutcome {
    pub plant_id: String,
    pub zone_id: String,
    pub strain_name: String,
    pub stage: PlantStage,
    pub age_hours: f64,
    pub biomass_dry_g: f64,
    pub yield_dry_g: f64,
    pub health: f64,
    pub quality: f64,
}

/// Everything a finished run hands to reporting and plotting.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub scenario_name: String,
    pub ticks: u64,
    pub elapsed_hours: f64,
    pub log_path: String,
    pub summary: RunSummary,
    pub plants: Vec<PlantOutcome>,
    pub stage_counts: BTreeMap<PlantStage, usize>,
}

/// Builds the engine for `scenario`, runs it for `ticks` and summarises the resulting log.
pub fn run_scenario(
    scenario: ScenarioFile,
    kb: &KnowledgeBase,
    output_dir: &str,
    ticks: u64,
) -> Result<RunOutput> {
    info!(scenario = %scenario.name, zones = scenario.zones.len(), "preparing scenario");
    if let Some(description) = &scenario.description {
        info!(%description);
    }

    let log_path = Path::new(output_dir).join("timeseries.csv");
    let log_path = log_path
        .to_str()
        .context("Output directory is not valid UTF-8")?
        .to_string();
    let scenario_name = scenario.name.clone();

    let mut engine = SimulationBuilder::from_scenario(scenario)
        .with_strains(kb.strains.values().cloned())
        .with_tick_limit(ticks)
        .with_timeseries_logging_to_file(&log_path)
        .build()
        .context("Failed to build the simulation")?;

    engine.run().context("Simulation run failed")?;

    let summary = analysis::summarize_log(&log_path)
        .with_context(|| format!("Failed to summarise {}", log_path))?;

    let mut stage_counts = BTreeMap::new();
    let plants: Vec<PlantOutcome> = engine
        .get_plants()
        .values()
        .map(|record| {
            *stage_counts.entry(record.state.stage).or_insert(0) += 1;
            PlantOutcome {
                plant_id: record.state.id.clone(),
                zone_id: record.state.zone_id.clone(),
                strain_name: record.strain.name.clone(),
                stage: record.state.stage,
                age_hours: record.state.age_hours,
                biomass_dry_g: record.state.biomass_dry_g,
                yield_dry_g: record.state.yield_dry_g,
                health: record.state.health,
                quality: record.state.quality,
            }
        })
        .collect();

    let output = RunOutput {
        scenario_name,
        ticks: engine.get_tick(),
        elapsed_hours: engine.get_state().clock.elapsed_hours(),
        log_path,
        summary,
        plants,
        stage_counts,
    };

    let summary_path = Path::new(output_dir).join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("Failed to write {:?}", summary_path))?;

    Ok(output)
}

pub fn print_summary_report(output: &RunOutput) {
    let summary = &output.summary;

    println!("\n\n--- [Final Summary Report] ---");
    println!("========================================");
    println!("Scenario: {}", output.scenario_name);
    println!(
        "Simulation Duration: {} ticks ({:.1} hours)",
        output.ticks, output.elapsed_hours
    );
    println!("----------------------------------------");

    for (zone_id, zone) in &summary.zones {
        println!("\nZone {}:", zone_id);
        println!("  - Energy Consumed:          {:.2} kWh", zone.total_energy_kwh);
        println!("  - Water Transpired:         {:.2} L", zone.total_transpiration_liters);
        println!("  - Water Drawn:              {:.2} L", zone.total_water_consumed_liters);
        println!("  - Nutrients Drawn:          {:.2} g", zone.total_nutrients_consumed_g);
        println!(
            "  - Temperature Range:        {:.1} to {:.1} °C",
            zone.min_temperature_c, zone.peak_temperature_c
        );
        println!("  - Mean Relative Humidity:   {:.1} %", zone.mean_relative_humidity * 100.0);
        println!("  - Final Biomass (dry):      {:.2} g", zone.final_biomass_g);
        println!("  - Final Mean Health:        {:.2}", zone.final_mean_health);
        println!(
            "  - Events:                   {} stage changes, {} warnings, {} errors",
            zone.stage_changes, zone.warnings, zone.errors
        );
    }

    println!("\nPlants:");
    for plant in &output.plants {
        println!(
            "  - {:<12} {:<20} {:<14} {:>8.2} g  yield {:>7.2} g  health {:.2}  quality {:.2}",
            plant.plant_id,
            plant.strain_name,
            plant.stage.as_str(),
            plant.biomass_dry_g,
            plant.yield_dry_g,
            plant.health,
            plant.quality
        );
    }

    println!("\nStage Distribution:");
    for (stage, count) in &output.stage_counts {
        println!("  - {}: {}", stage.as_str(), count);
    }

    println!("----------------------------------------");
    println!("Total Energy: {:.2} kWh", summary.total_energy_kwh());
    println!("Total Biomass: {:.2} g", summary.total_biomass_g());
    println!("========================================");
}
