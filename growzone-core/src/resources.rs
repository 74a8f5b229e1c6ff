//! Per-plant water and nutrient demand for one tick, and the stress caused by shortfalls.

use crate::physics::{clamp01, non_negative};
use growzone_schemas::{
    plant::PlantStage,
    strain::{NpkGrams, StrainProfile},
};

/// What the zone can offer a plant this tick. Unset fields mean "no constraint".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSupply {
    /// Explicit water supply fraction; wins over `available_water_liters`.
    pub water_supply_fraction: Option<f64>,
    pub available_water_liters: Option<f64>,
    pub nutrient_supply_fraction: Option<f64>,
    pub available_nutrients_g: Option<NpkGrams>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceDemandResult {
    pub water_demand_liters: f64,
    pub water_available_liters: f64,
    pub water_supply_fraction: f64,
    pub water_stress: f64,
    pub nutrient_demand_g: NpkGrams,
    pub nutrient_available_g: NpkGrams,
    pub nutrient_supply_fraction: f64,
    pub nutrient_stress: f64,
    /// Composite growth multiplier in [0, 1]; 1 means no resource limitation.
    pub resource_response: f64,
}

impl ResourceDemandResult {
    pub fn resource_stress(&self) -> f64 {
        1.0 - self.resource_response
    }
}

/// Linear ramp from no stress at full supply to total stress at `minimum_fraction`.
pub fn water_stress(supply_fraction: f64, demand_liters: f64, minimum_fraction: f64) -> f64 {
    if demand_liters <= 0.0 || !demand_liters.is_finite() {
        return 0.0;
    }
    let fraction = clamp01(supply_fraction);
    let minimum = clamp01(minimum_fraction);
    if fraction >= 1.0 {
        0.0
    } else if fraction <= minimum || minimum >= 1.0 {
        1.0
    } else {
        clamp01((1.0 - fraction) / (1.0 - minimum))
    }
}

pub fn nutrient_stress(supply_fraction: f64, tolerance: f64) -> f64 {
    let fraction = clamp01(supply_fraction);
    if fraction >= 1.0 {
        0.0
    } else {
        clamp01(1.0 - (fraction + non_negative(tolerance)))
    }
}

pub fn calculate_resource_demand(
    strain: &StrainProfile,
    stage: PlantStage,
    canopy_area_m2: f64,
    tick_hours: f64,
    supply: &ResourceSupply,
) -> ResourceDemandResult {
    let day_share = non_negative(tick_hours) / 24.0;

    let daily_water = strain
        .water_demand
        .daily_liters_per_m2
        .for_stage(stage)
        .copied()
        .map_or(0.0, non_negative);
    let water_demand = daily_water * non_negative(canopy_area_m2) * day_share;
    let water_fraction = match (supply.water_supply_fraction, supply.available_water_liters) {
        (Some(fraction), _) => clamp01(fraction),
        (None, Some(liters)) if water_demand > 0.0 => clamp01(non_negative(liters) / water_demand),
        _ => 1.0,
    };
    let water_stress = water_stress(
        water_fraction,
        water_demand,
        strain.water_demand.minimum_fraction_required,
    );

    let daily_npk = strain
        .nutrient_demand
        .daily_grams
        .for_stage(stage)
        .copied()
        .unwrap_or_default();
    let nutrient_demand = NpkGrams {
        nitrogen: non_negative(daily_npk.nitrogen),
        phosphorus: non_negative(daily_npk.phosphorus),
        potassium: non_negative(daily_npk.potassium),
    }
    .scale(day_share);

    let mut nutrient_fraction = supply.nutrient_supply_fraction.map_or(1.0, clamp01);
    if let Some(available) = supply.available_nutrients_g {
        for (have, need) in [
            (available.nitrogen, nutrient_demand.nitrogen),
            (available.phosphorus, nutrient_demand.phosphorus),
            (available.potassium, nutrient_demand.potassium),
        ] {
            if need > 0.0 {
                nutrient_fraction = nutrient_fraction.min(clamp01(non_negative(have) / need));
            }
        }
    }
    let nutrient_stress = if nutrient_demand.total() > 0.0 {
        nutrient_stress(nutrient_fraction, strain.nutrient_demand.npk_tolerance)
    } else {
        0.0
    };

    ResourceDemandResult {
        water_demand_liters: water_demand,
        water_available_liters: water_demand * water_fraction,
        water_supply_fraction: water_fraction,
        water_stress,
        nutrient_demand_g: nutrient_demand,
        nutrient_available_g: nutrient_demand.scale(nutrient_fraction),
        nutrient_supply_fraction: nutrient_fraction,
        nutrient_stress,
        resource_response: clamp01(1.0 - (water_stress + nutrient_stress) / 2.0),
    }
}
