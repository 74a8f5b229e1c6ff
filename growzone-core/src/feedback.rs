//! Books a zone's transpiration against its reservoirs and hands the transpired water back
//! to the air one tick later.

use crate::physics::{clamp01, non_negative};
use growzone_schemas::environment::ZoneResources;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedbackOutcome {
    pub water_consumed_liters: f64,
    pub solution_consumed_liters: f64,
    pub nutrients_consumed_g: f64,
    /// Litres of vapour the next tick's environment step must add to the zone air. Never
    /// more than the water actually drawn.
    pub pending_influx_liters: f64,
}

/// Draws the summed transpiration from water and nutrient solution, bounded by what the
/// reservoirs hold, and dilutes the solution strength accordingly.
pub fn apply_transpiration_feedback(
    resources: &mut ZoneResources,
    transpired_liters: f64,
    nutrient_grams_per_liter: f64,
) -> FeedbackOutcome {
    let liters = non_negative(transpired_liters);
    resources.last_transpiration_liters = liters;
    if liters <= 0.0 {
        return FeedbackOutcome::default();
    }

    let water = non_negative(resources.water_liters);
    let solution = non_negative(resources.nutrient_solution_liters);
    let strength = clamp01(resources.nutrient_strength);

    let water_consumed = liters.min(water);
    let solution_consumed = liters.min(solution);
    let capacity = non_negative(resources.reservoir_capacity_liters).max(liters);

    resources.water_liters = water - water_consumed;
    resources.nutrient_solution_liters = solution - solution_consumed;
    let strength_drop = if capacity > 0.0 {
        (water_consumed / capacity).min(strength)
    } else {
        0.0
    };
    resources.nutrient_strength = clamp01(strength - strength_drop);

    FeedbackOutcome {
        water_consumed_liters: water_consumed,
        solution_consumed_liters: solution_consumed,
        nutrients_consumed_g: solution_consumed * strength * non_negative(nutrient_grams_per_liter),
        pending_influx_liters: water_consumed,
    }
}
