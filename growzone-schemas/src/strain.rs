//! Defines the read-only strain profiles loaded from the knowledge base. A strain carries
//! its environmental preferences, growth parameters, resource demand and the thresholds
//! that gate its phenological development.

use crate::environment::ToleranceRange;
use crate::plant::{GrowthPhase, PlantStage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESILIENCE: f64 = 0.5;
pub const DEFAULT_LEAF_AREA_INDEX: f64 = 2.5;
/// Grams of dry matter per mol of absorbed photons.
pub const DEFAULT_LIGHT_USE_EFFICIENCY: f64 = 0.9;
pub const DEFAULT_MIN_WATER_FRACTION: f64 = 0.2;
pub const DEFAULT_NPK_TOLERANCE: f64 = 0.1;
pub const DEFAULT_RIPENING_HOURS: f64 = 72.0;
pub const DEFAULT_HARVEST_INDEX: f64 = 0.65;

/// A value per growth phase. Lookups fall back to another phase when the requested one is
/// missing, so a strain only has to describe the phases it cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTable<T> {
    pub seedling: Option<T>,
    pub vegetation: Option<T>,
    pub flowering: Option<T>,
}

impl<T> Default for PhaseTable<T> {
    fn default() -> Self {
        Self {
            seedling: None,
            vegetation: None,
            flowering: None,
        }
    }
}

impl<T> PhaseTable<T> {
    pub fn exact(&self, phase: GrowthPhase) -> Option<&T> {
        match phase {
            GrowthPhase::Seedling => self.seedling.as_ref(),
            GrowthPhase::Vegetation => self.vegetation.as_ref(),
            GrowthPhase::Flowering => self.flowering.as_ref(),
        }
    }

    /// The entry for `phase`, else vegetation, else flowering, else seedling.
    pub fn get(&self, phase: GrowthPhase) -> Option<&T> {
        self.exact(phase)
            .or(self.vegetation.as_ref())
            .or(self.flowering.as_ref())
            .or(self.seedling.as_ref())
    }

    pub fn for_stage(&self, stage: PlantStage) -> Option<&T> {
        self.get(stage.growth_phase())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentalPreferences {
    #[serde(default)]
    pub ideal_temperature: PhaseTable<ToleranceRange<f64>>,
    #[serde(default)]
    pub ideal_humidity: PhaseTable<ToleranceRange<f64>>,
    /// Preferred PPFD band.
    #[serde(default)]
    pub light_intensity: PhaseTable<ToleranceRange<f64>>,
    #[serde(default)]
    pub co2_ppm: Option<ToleranceRange<f64>>,
    #[serde(default)]
    pub vpd_kpa: Option<ToleranceRange<f64>>,
}

/// Biomass cap per stage, as a fraction of the strain's maximum biomass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseCapMultipliers {
    #[serde(default)]
    pub seedling: Option<f64>,
    #[serde(default)]
    pub vegetation: Option<f64>,
    #[serde(default)]
    pub flowering: Option<f64>,
    #[serde(default)]
    pub ripening: Option<f64>,
}

impl PhaseCapMultipliers {
    /// The cap multiplier for a stage; stages without an entry are uncapped (1.0).
    pub fn for_stage(&self, stage: PlantStage) -> f64 {
        let value = match stage {
            PlantStage::Seedling => self.seedling,
            PlantStage::Vegetative => self.vegetation,
            PlantStage::Flowering => self.flowering,
            PlantStage::Ripening => self.ripening,
            PlantStage::HarvestReady => None,
        };
        value.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthModel {
    pub max_biomass_dry_g: f64,
    #[serde(default)]
    pub light_use_efficiency_g_per_mol: Option<f64>,
    #[serde(default)]
    pub phase_cap_multipliers: PhaseCapMultipliers,
    /// Temperature coefficient applied to light-use efficiency.
    #[serde(default)]
    pub q10: Option<f64>,
    #[serde(default)]
    pub reference_temperature_c: Option<f64>,
    #[serde(default)]
    pub co2_target_ppm: Option<f64>,
    /// How strongly stress suppresses growth, in [0, 1].
    #[serde(default)]
    pub stress_damping: Option<f64>,
    /// Share of biomass gained from flowering onward that counts as harvestable yield.
    #[serde(default)]
    pub harvest_index: Option<f64>,
    /// Fraction of standing biomass respired per day.
    #[serde(default)]
    pub maintenance_frac_per_day: Option<f64>,
}

impl GrowthModel {
    /// Harvest index clamped to [0, 1], defaulting to `DEFAULT_HARVEST_INDEX`.
    pub fn harvest_index(&self) -> f64 {
        self.harvest_index
            .filter(|h| h.is_finite())
            .map_or(DEFAULT_HARVEST_INDEX, |h| h.clamp(0.0, 1.0))
    }

    pub fn maintenance_frac_per_day(&self) -> f64 {
        self.maintenance_frac_per_day
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(0.0)
    }
}

impl Default for GrowthModel {
    fn default() -> Self {
        Self {
            max_biomass_dry_g: 150.0,
            light_use_efficiency_g_per_mol: None,
            phase_cap_multipliers: PhaseCapMultipliers::default(),
            q10: None,
            reference_temperature_c: None,
            co2_target_ppm: None,
            stress_damping: None,
            harvest_index: None,
            maintenance_frac_per_day: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterDemand {
    #[serde(default)]
    pub daily_liters_per_m2: PhaseTable<f64>,
    /// Supply fraction at or below which water stress is total.
    #[serde(default = "default_min_water_fraction")]
    pub minimum_fraction_required: f64,
}

impl Default for WaterDemand {
    fn default() -> Self {
        Self {
            daily_liters_per_m2: PhaseTable::default(),
            minimum_fraction_required: DEFAULT_MIN_WATER_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NpkGrams {
    #[serde(default)]
    pub nitrogen: f64,
    #[serde(default)]
    pub phosphorus: f64,
    #[serde(default)]
    pub potassium: f64,
}

impl NpkGrams {
    pub fn total(&self) -> f64 {
        self.nitrogen + self.phosphorus + self.potassium
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            nitrogen: self.nitrogen * factor,
            phosphorus: self.phosphorus * factor,
            potassium: self.potassium * factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientDemand {
    #[serde(default)]
    pub daily_grams: PhaseTable<NpkGrams>,
    #[serde(default = "default_npk_tolerance")]
    pub npk_tolerance: f64,
}

impl Default for NutrientDemand {
    fn default() -> Self {
        Self {
            daily_grams: PhaseTable::default(),
            npk_tolerance: DEFAULT_NPK_TOLERANCE,
        }
    }
}

/// Minimum time spent in each stage before it may end.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Photoperiod {
    #[serde(default)]
    pub seedling_hours: Option<f64>,
    #[serde(default)]
    pub vegetation_days: Option<f64>,
    #[serde(default)]
    pub flowering_days: Option<f64>,
    #[serde(default)]
    pub ripening_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageChangeThreshold {
    #[serde(default)]
    pub min_light_hours: Option<f64>,
    #[serde(default)]
    pub max_stress_for_stage_change: Option<f64>,
}

/// Gates for entering the named stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageChangeThresholds {
    #[serde(default)]
    pub vegetative: Option<StageChangeThreshold>,
    #[serde(default)]
    pub flowering: Option<StageChangeThreshold>,
    #[serde(default)]
    pub ripening: Option<StageChangeThreshold>,
}

/// A cultivar definition from the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainProfile {
    pub id: String,
    pub name: String,
    /// Tolerance to stress in [0, 1]; 0.5 is neutral.
    #[serde(default = "default_resilience")]
    pub resilience: f64,
    #[serde(default = "default_leaf_area_index")]
    pub leaf_area_index: f64,
    #[serde(default)]
    pub environmental_preferences: EnvironmentalPreferences,
    #[serde(default)]
    pub growth_model: GrowthModel,
    #[serde(default)]
    pub water_demand: WaterDemand,
    #[serde(default)]
    pub nutrient_demand: NutrientDemand,
    #[serde(default)]
    pub photoperiod: Photoperiod,
    #[serde(default)]
    pub stage_change_thresholds: StageChangeThresholds,
}

fn default_resilience() -> f64 {
    DEFAULT_RESILIENCE
}

fn default_leaf_area_index() -> f64 {
    DEFAULT_LEAF_AREA_INDEX
}

fn default_min_water_fraction() -> f64 {
    DEFAULT_MIN_WATER_FRACTION
}

fn default_npk_tolerance() -> f64 {
    DEFAULT_NPK_TOLERANCE
}
