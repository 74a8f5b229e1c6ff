//! One tick of one zone: environment first, then every plant, then the reservoir ledger.

use super::state::{PlantRecord, TickClock, ZoneRecord, ZoneTickReport};
use crate::{
    controller::resolve_setpoints,
    devices::{aggregate_device_effects, DeviceContext},
    environment::{apply_device_effect, apply_transpiration_influx, mix_toward_ambient, vpd},
    events::{
        emit_environment_events, emit_health_alert, emit_stage_change, evaluate_environment,
        EventSink,
    },
    feedback::apply_transpiration_feedback,
    growth::{update_plant_growth, GrowthInputs},
    phenology::{advance_phenology, PhenologyTick},
    physics::non_negative,
    resources::ResourceSupply,
};
use growzone_schemas::{config::SimulationConfig, environment::ZoneEnvironment};
use std::collections::BTreeMap;
use tracing::{debug, warn};

struct PlantTickSummary {
    biomass_delta: f64,
    transpiration_liters: f64,
}

pub(crate) fn step_zone(
    zone: &mut ZoneRecord,
    plants: &mut BTreeMap<String, PlantRecord>,
    config: &SimulationConfig,
    clock: &TickClock,
    sink: &mut impl EventSink,
) -> ZoneTickReport {
    let hours = clock.tick_hours();

    apply_transpiration_influx(
        &mut zone.environment,
        zone.pending_influx_liters,
        &zone.geometry,
        &config.safety,
    );
    zone.pending_influx_liters = 0.0;

    let power_levels = match (zone.controller.as_mut(), config.climate_controller.as_ref()) {
        (Some(controller), Some(controller_config)) => {
            let setpoints = resolve_setpoints(&zone.devices, &controller_config.fallback_setpoints);
            Some(controller.update(&zone.environment, &setpoints, hours))
        }
        _ => None,
    };

    let effect = aggregate_device_effects(
        &zone.devices,
        &zone.environment,
        &zone.geometry,
        &DeviceContext {
            tick_hours: hours,
            power_levels,
        },
    );
    apply_device_effect(&mut zone.environment, &effect, &config.safety);
    mix_toward_ambient(
        &mut zone.environment,
        effect.airflow,
        &zone.geometry,
        &config.ambient,
        &config.mixing,
        hours,
        &config.safety,
    );
    zone.energy_kwh_total += effect.energy_kwh;

    let plant_count = zone.plant_ids.len();
    let supply = plant_supply(zone, plant_count);

    let mut biomass_delta = 0.0;
    let mut transpired = 0.0;
    for plant_id in &zone.plant_ids {
        let Some(record) = plants.get_mut(plant_id) else {
            warn!(zone_id = %zone.id, plant_id = %plant_id, "zone lists a plant missing from the arena");
            continue;
        };
        let summary = step_plant(record, &zone.environment, &supply, config, clock, sink);
        biomass_delta += summary.biomass_delta;
        transpired += summary.transpiration_liters;
    }

    let feedback = apply_transpiration_feedback(
        &mut zone.resources,
        transpired,
        config.nutrient_grams_per_liter,
    );
    zone.pending_influx_liters = feedback.pending_influx_liters;
    zone.water_consumed_liters_total += feedback.water_consumed_liters;
    zone.nutrients_consumed_g_total += feedback.nutrients_consumed_g;

    let report = zone_report(zone, plants, clock.tick);
    debug!(
        zone_id = %zone.id,
        tick = clock.tick,
        temperature_c = report.environment.temperature_c,
        relative_humidity = report.environment.relative_humidity,
        transpiration_liters = transpired,
        energy_kwh = effect.energy_kwh,
        "zone tick complete"
    );
    ZoneTickReport {
        energy_kwh: effect.energy_kwh,
        airflow_m3_per_h: effect.airflow,
        transpiration_liters: transpired,
        water_consumed_liters: feedback.water_consumed_liters,
        nutrients_consumed_g: feedback.nutrients_consumed_g,
        biomass_delta_g: biomass_delta,
        ..report
    }
}

/// Every plant gets an equal share of the reservoir and the solution's current strength.
fn plant_supply(zone: &ZoneRecord, plant_count: usize) -> ResourceSupply {
    let share = if plant_count > 0 {
        non_negative(zone.resources.water_liters) / plant_count as f64
    } else {
        0.0
    };
    let nutrient_fraction = if zone.resources.nutrient_solution_liters > 0.0 {
        zone.resources.nutrient_strength
    } else {
        0.0
    };
    ResourceSupply {
        available_water_liters: Some(share),
        nutrient_supply_fraction: Some(nutrient_fraction),
        ..ResourceSupply::default()
    }
}

fn step_plant(
    record: &mut PlantRecord,
    environment: &ZoneEnvironment,
    supply: &ResourceSupply,
    config: &SimulationConfig,
    clock: &TickClock,
    sink: &mut impl EventSink,
) -> PlantTickSummary {
    let hours = clock.tick_hours();
    let previous_health = record.state.health;

    let outcome = update_plant_growth(
        &record.state,
        &GrowthInputs {
            strain: &record.strain,
            environment,
            tick_hours: hours,
            supply,
            stage_cap_multiplier: record.phenology_config.cap_multiplier(record.state.stage),
            transpiration: &config.transpiration,
        },
    );
    record.state = outcome.plant;

    let phenology = advance_phenology(
        &mut record.phenology,
        PhenologyTick {
            hours,
            light_hours: outcome.light_hours,
            stress: outcome.stress,
        },
        &record.phenology_config,
    );
    record.state.stage = phenology.stage;

    if phenology.stage_changed {
        emit_stage_change(sink, clock.tick, &record.state, phenology.previous_stage);
    }
    emit_health_alert(sink, clock.tick, &record.state, previous_health);
    if config.emit_environment_events {
        let evaluations = evaluate_environment(&record.strain, record.state.stage, environment);
        emit_environment_events(sink, clock.tick, &record.state, &evaluations);
    }

    PlantTickSummary {
        biomass_delta: outcome.biomass_delta,
        transpiration_liters: outcome.transpiration_liters,
    }
}

pub(crate) fn zone_report(
    zone: &ZoneRecord,
    plants: &BTreeMap<String, PlantRecord>,
    tick: u64,
) -> ZoneTickReport {
    let mut stage_counts = BTreeMap::new();
    let mut total_biomass = 0.0;
    let mut health_sum = 0.0;
    let mut stress_sum = 0.0;
    let mut counted = 0usize;
    for record in zone.plant_ids.iter().filter_map(|id| plants.get(id)) {
        *stage_counts.entry(record.state.stage).or_insert(0) += 1;
        total_biomass += record.state.biomass_dry_g;
        health_sum += record.state.health;
        stress_sum += record.state.stress;
        counted += 1;
    }
    let mean = |sum: f64| if counted > 0 { sum / counted as f64 } else { 0.0 };

    ZoneTickReport {
        tick,
        zone_id: zone.id.clone(),
        environment: zone.environment,
        vpd_kpa: vpd(&zone.environment),
        energy_kwh: 0.0,
        airflow_m3_per_h: 0.0,
        transpiration_liters: zone.resources.last_transpiration_liters,
        water_consumed_liters: 0.0,
        nutrients_consumed_g: 0.0,
        water_liters: zone.resources.water_liters,
        reservoir_level: zone.resources.reservoir_level(),
        nutrient_strength: zone.resources.nutrient_strength,
        plant_count: counted,
        biomass_delta_g: 0.0,
        total_biomass_g: total_biomass,
        mean_health: mean(health_sum),
        mean_stress: mean(stress_sum),
        stage_counts,
    }
}
