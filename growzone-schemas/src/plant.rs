//! Plant individuals and their phenological bookkeeping.

use serde::{Deserialize, Serialize};

/// Developmental stages a plant moves through, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantStage {
    #[default]
    Seedling,
    Vegetative,
    Flowering,
    Ripening,
    HarvestReady,
}

impl PlantStage {
    pub const ALL: [PlantStage; 5] = [
        PlantStage::Seedling,
        PlantStage::Vegetative,
        PlantStage::Flowering,
        PlantStage::Ripening,
        PlantStage::HarvestReady,
    ];

    pub fn index(self) -> usize {
        match self {
            PlantStage::Seedling => 0,
            PlantStage::Vegetative => 1,
            PlantStage::Flowering => 2,
            PlantStage::Ripening => 3,
            PlantStage::HarvestReady => 4,
        }
    }

    /// The following stage, or `None` for the terminal stage.
    pub fn next(self) -> Option<PlantStage> {
        match self {
            PlantStage::Seedling => Some(PlantStage::Vegetative),
            PlantStage::Vegetative => Some(PlantStage::Flowering),
            PlantStage::Flowering => Some(PlantStage::Ripening),
            PlantStage::Ripening => Some(PlantStage::HarvestReady),
            PlantStage::HarvestReady => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// The growth phase whose strain tables apply to this stage.
    pub fn growth_phase(self) -> GrowthPhase {
        match self {
            PlantStage::Seedling => GrowthPhase::Seedling,
            PlantStage::Vegetative => GrowthPhase::Vegetation,
            PlantStage::Flowering | PlantStage::Ripening | PlantStage::HarvestReady => {
                GrowthPhase::Flowering
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlantStage::Seedling => "seedling",
            PlantStage::Vegetative => "vegetative",
            PlantStage::Flowering => "flowering",
            PlantStage::Ripening => "ripening",
            PlantStage::HarvestReady => "harvest_ready",
        }
    }
}

/// Keys of the per-phase tables in a strain profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPhase {
    Seedling,
    Vegetation,
    Flowering,
}

/// The live state of one plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    pub id: String,
    pub strain_id: String,
    pub zone_id: String,
    pub stage: PlantStage,
    pub age_hours: f64,
    pub biomass_dry_g: f64,
    /// 1.0 is a perfectly healthy plant.
    pub health: f64,
    pub stress: f64,
    pub canopy_area_m2: f64,
    pub transpired_liters_total: f64,
    /// Dry matter produced during the last tick.
    pub last_photosynthesis_g: f64,
    /// Harvestable share of the biomass gained since flowering began.
    #[serde(default)]
    pub yield_dry_g: f64,
    /// Expected harvest quality in [0, 1].
    #[serde(default = "default_quality")]
    pub quality: f64,
}

pub const DEFAULT_QUALITY: f64 = 1.0;

fn default_quality() -> f64 {
    DEFAULT_QUALITY
}

/// Counters driving stage transitions. Everything except `total_light_hours` restarts at
/// zero when the plant changes stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhenologyState {
    pub stage: PlantStage,
    pub hours_in_stage: f64,
    pub light_hours_in_stage: f64,
    pub total_light_hours: f64,
    pub stress_integral: f64,
    pub stress_duration_hours: f64,
}

impl PhenologyState {
    pub fn new(stage: PlantStage) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }
}

/// A plant placed into a zone by a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planting {
    pub id: String,
    pub strain_id: String,
    #[serde(default)]
    pub stage: PlantStage,
    #[serde(default = "default_initial_biomass")]
    pub biomass_dry_g: f64,
    #[serde(default)]
    pub canopy_area_m2: Option<f64>,
    #[serde(default)]
    pub total_light_hours: f64,
}

fn default_initial_biomass() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order() {
        let mut stage = PlantStage::Seedling;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert_eq!(next.index(), stage.index() + 1);
            stage = next;
            visited.push(stage);
        }
        assert_eq!(visited, PlantStage::ALL.to_vec());
        assert!(PlantStage::HarvestReady.is_terminal());
    }

    #[test]
    fn late_stages_share_flowering_tables() {
        assert_eq!(PlantStage::Ripening.growth_phase(), GrowthPhase::Flowering);
        assert_eq!(PlantStage::HarvestReady.growth_phase(), GrowthPhase::Flowering);
        assert_eq!(PlantStage::Vegetative.growth_phase(), GrowthPhase::Vegetation);
    }

    #[test]
    fn saved_plant_without_yield_starts_at_full_quality() {
        let json = r#"{"id":"p-1","strain_id":"basil","zone_id":"z-1","stage":"flowering",
            "age_hours":10.0,"biomass_dry_g":5.0,"health":0.9,"stress":0.1,
            "canopy_area_m2":0.25,"transpired_liters_total":0.4,"last_photosynthesis_g":0.1}"#;
        let plant: PlantState = serde_json::from_str(json).unwrap();
        assert_eq!(plant.yield_dry_g, 0.0);
        assert_eq!(plant.quality, DEFAULT_QUALITY);
    }
}
