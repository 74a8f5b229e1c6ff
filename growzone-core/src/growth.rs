//! Per-plant growth, stress and health for one tick.
//!
//! Growth is the photon budget absorbed by the canopy, converted with the strain's
//! light-use efficiency and scaled by the temperature, light, CO₂ and resource responses.
//! Stress combines environmental band violations with resource shortfalls and drives the
//! plant's health.

use crate::environment::vpd;
use crate::physics::{
    canopy_interception, clamp01, gaussian_response, light_response, non_negative,
    transpiration_rate, PHOTONS_MOL_PER_PPFD_HOUR,
};
use crate::resources::{calculate_resource_demand, ResourceDemandResult, ResourceSupply};
use growzone_schemas::{
    config::TranspirationConfig,
    environment::{ToleranceRange, ZoneEnvironment},
    plant::{PlantStage, PlantState},
    strain::{StrainProfile, DEFAULT_LIGHT_USE_EFFICIENCY},
};

/// Stress above which health declines instead of recovering.
pub const STRESS_HEALTH_THRESHOLD: f64 = 0.3;
pub const STRESS_IMPACT_PER_HOUR: f64 = 0.05;
/// Share of the health deficit recovered per hour of low stress.
pub const RECOVERY_RATE_PER_HOUR: f64 = 0.1;
pub const DEFAULT_STRESS_DAMPING: f64 = 0.6;
pub const DEFAULT_CO2_TARGET_PPM: f64 = 1000.0;
pub const DEFAULT_TEMPERATURE_OPTIMUM_C: f64 = 25.0;
pub const DEFAULT_TEMPERATURE_SIGMA: f64 = 6.0;
pub const MIN_TEMPERATURE_SIGMA: f64 = 3.0;
pub const DEFAULT_LIGHT_HALF_SATURATION: f64 = 350.0;
pub const DEFAULT_CANOPY_AREA_M2: f64 = 0.1;
/// Weight of stress when deriving the quality a plant is heading toward.
pub const QUALITY_STRESS_WEIGHT: f64 = 0.4;
/// Share of the quality gap closed over a full day.
pub const QUALITY_ADJUSTMENT_PER_DAY: f64 = 0.5;

const MIN_BAND_WIDTH: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct GrowthInputs<'a> {
    pub strain: &'a StrainProfile,
    pub environment: &'a ZoneEnvironment,
    pub tick_hours: f64,
    pub supply: &'a ResourceSupply,
    /// Cap multiplier of the plant's current stage.
    pub stage_cap_multiplier: f64,
    pub transpiration: &'a TranspirationConfig,
}

/// The environmental responses behind one tick of growth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrowthDrivers {
    pub temperature_factor: f64,
    pub light_factor: f64,
    pub co2_factor: f64,
    pub vpd_kpa: f64,
    pub environment_stress: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthOutcome {
    pub plant: PlantState,
    pub biomass_delta: f64,
    pub maintenance_g: f64,
    pub yield_delta: f64,
    pub quality_delta: f64,
    pub health_delta: f64,
    pub stress: f64,
    pub transpiration_liters: f64,
    /// Light-weighted hours credited toward phenology.
    pub light_hours: f64,
    pub drivers: GrowthDrivers,
    pub resources: ResourceDemandResult,
}

pub fn temperature_factor(strain: &StrainProfile, stage: PlantStage, temperature_c: f64) -> f64 {
    let (optimum, sigma) = match strain.environmental_preferences.ideal_temperature.for_stage(stage) {
        Some(band) => (band.midpoint(), (band.width() / 2.0).max(MIN_TEMPERATURE_SIGMA)),
        None => (
            strain
                .growth_model
                .reference_temperature_c
                .unwrap_or(DEFAULT_TEMPERATURE_OPTIMUM_C),
            DEFAULT_TEMPERATURE_SIGMA,
        ),
    };
    gaussian_response(temperature_c, optimum, sigma)
}

pub fn light_factor(strain: &StrainProfile, stage: PlantStage, ppfd: f64) -> f64 {
    let half_saturation = strain
        .environmental_preferences
        .light_intensity
        .for_stage(stage)
        .map_or(DEFAULT_LIGHT_HALF_SATURATION, |band| band.midpoint().clamp(50.0, 1200.0));
    clamp01(light_response(ppfd, 1.0 / half_saturation, 1.0))
}

pub fn co2_factor(strain: &StrainProfile, co2_ppm: f64) -> f64 {
    let target = strain
        .growth_model
        .co2_target_ppm
        .filter(|t| *t > 0.0)
        .unwrap_or(DEFAULT_CO2_TARGET_PPM);
    clamp01(co2_ppm / target)
}

/// Squared distance outside `band`, normalised by the band width.
pub fn band_penalty(value: f64, band: &ToleranceRange<f64>) -> f64 {
    let distance = band.distance_outside(value) / band.width().max(MIN_BAND_WIDTH);
    distance * distance
}

/// Stress from humidity and light outside the strain's bands. Dark ticks carry no light
/// penalty.
pub fn environmental_stress(
    strain: &StrainProfile,
    stage: PlantStage,
    environment: &ZoneEnvironment,
) -> f64 {
    let preferences = &strain.environmental_preferences;
    let humidity_penalty = preferences
        .ideal_humidity
        .for_stage(stage)
        .map_or(0.0, |band| band_penalty(environment.relative_humidity, band));
    let light_penalty = if environment.ppfd > 0.0 {
        preferences
            .light_intensity
            .for_stage(stage)
            .map_or(0.0, |band| band_penalty(environment.ppfd, band))
    } else {
        0.0
    };
    clamp01((humidity_penalty + light_penalty) * (1.0 - clamp01(strain.resilience)))
}

pub fn next_health(health: f64, stress: f64, hours: f64) -> f64 {
    let health = clamp01(health);
    let hours = non_negative(hours);
    let next = if stress > STRESS_HEALTH_THRESHOLD {
        health - STRESS_IMPACT_PER_HOUR * stress * hours
    } else {
        health + (1.0 - health) * clamp01(RECOVERY_RATE_PER_HOUR * hours)
    };
    clamp01(next)
}

/// Moves quality a day-weighted step toward health less a share of stress.
pub fn next_quality(quality: f64, health: f64, stress: f64, hours: f64) -> f64 {
    let target = clamp01(health - stress * QUALITY_STRESS_WEIGHT);
    let rate = clamp01(non_negative(hours) / 24.0) * QUALITY_ADJUSTMENT_PER_DAY;
    clamp01(quality + (target - quality) * rate)
}

fn accumulates_yield(stage: PlantStage) -> bool {
    matches!(
        stage,
        PlantStage::Flowering | PlantStage::Ripening | PlantStage::HarvestReady
    )
}

pub fn update_plant_growth(plant: &PlantState, inputs: &GrowthInputs<'_>) -> GrowthOutcome {
    let strain = inputs.strain;
    let env = inputs.environment;
    let hours = non_negative(inputs.tick_hours);
    let stage = plant.stage;
    let canopy = if plant.canopy_area_m2 > 0.0 { plant.canopy_area_m2 } else { DEFAULT_CANOPY_AREA_M2 };

    let resources = calculate_resource_demand(strain, stage, canopy, hours, inputs.supply);

    let drivers = GrowthDrivers {
        temperature_factor: temperature_factor(strain, stage, env.temperature_c),
        light_factor: light_factor(strain, stage, env.ppfd),
        co2_factor: co2_factor(strain, env.co2_ppm),
        vpd_kpa: vpd(env),
        environment_stress: environmental_stress(strain, stage, env),
    };
    let stress = clamp01(drivers.environment_stress + resources.resource_stress());
    let health = next_health(plant.health, stress, hours);

    let lai = non_negative(strain.leaf_area_index);
    let absorbed_mol = non_negative(env.ppfd) * PHOTONS_MOL_PER_PPFD_HOUR * hours
        * canopy_interception(lai)
        * canopy;
    let mut efficiency = strain
        .growth_model
        .light_use_efficiency_g_per_mol
        .map_or(DEFAULT_LIGHT_USE_EFFICIENCY, non_negative);
    if let Some(q10) = strain.growth_model.q10.filter(|q| *q > 0.0) {
        let reference = strain
            .growth_model
            .reference_temperature_c
            .unwrap_or(DEFAULT_TEMPERATURE_OPTIMUM_C);
        efficiency *= non_negative(q10.powf((env.temperature_c - reference) / 10.0));
    }
    let damping = strain
        .growth_model
        .stress_damping
        .map_or(DEFAULT_STRESS_DAMPING, clamp01);

    let growth = non_negative(
        absorbed_mol
            * efficiency
            * drivers.temperature_factor
            * drivers.light_factor
            * drivers.co2_factor
            * resources.resource_response
            * (1.0 - damping * stress)
            * health,
    );
    let max_biomass = non_negative(strain.growth_model.max_biomass_dry_g);
    let maintenance_g = non_negative(plant.biomass_dry_g)
        * strain.growth_model.maintenance_frac_per_day()
        * hours
        / 24.0;
    let cap = non_negative(inputs.stage_cap_multiplier) * max_biomass;
    let headroom = (cap - plant.biomass_dry_g).max(0.0);
    let biomass_delta = (growth - maintenance_g).max(0.0).min(headroom);

    let harvest_index = strain.growth_model.harvest_index();
    let yield_cap = max_biomass
        * strain
            .growth_model
            .phase_cap_multipliers
            .for_stage(PlantStage::HarvestReady)
        * harvest_index;
    let current_yield = non_negative(plant.yield_dry_g);
    let yield_delta = if accumulates_yield(stage) {
        (biomass_delta * harvest_index).min((yield_cap - current_yield).max(0.0))
    } else {
        0.0
    };
    let quality = next_quality(clamp01(plant.quality), health, stress, hours);

    let stomatal_factor = 1.0 - resources.water_stress;
    let potential_transpiration = transpiration_rate(
        inputs.transpiration.stomatal_conductance,
        drivers.vpd_kpa,
        lai,
        inputs.transpiration.vpd_min_kpa,
        inputs.transpiration.vpd_max_kpa,
    ) * canopy
        * hours
        * stomatal_factor;
    // A plant cannot lose more water than its share of the reservoir.
    let transpiration_liters = match inputs.supply.available_water_liters {
        Some(available) => potential_transpiration.min(non_negative(available)),
        None => potential_transpiration,
    };

    let mut next = plant.clone();
    next.age_hours += hours;
    next.biomass_dry_g += biomass_delta;
    next.health = health;
    next.stress = stress;
    next.canopy_area_m2 = canopy;
    next.last_photosynthesis_g = biomass_delta;
    next.transpired_liters_total += transpiration_liters;
    next.yield_dry_g = current_yield + yield_delta;
    next.quality = quality;

    GrowthOutcome {
        health_delta: health - clamp01(plant.health),
        quality_delta: quality - clamp01(plant.quality),
        plant: next,
        biomass_delta,
        maintenance_g,
        yield_delta,
        stress,
        transpiration_liters,
        light_hours: hours * drivers.light_factor,
        drivers,
        resources,
    }
}
