//! Phenological state machine: seedling → vegetative → flowering → ripening → harvest-ready.
//!
//! A plant leaves its stage only when it has spent the required time in it, has collected
//! enough light over its life and its time-weighted average stress in the stage is low
//! enough. Stages are never skipped and never revisited.

use crate::physics::{clamp01, non_negative};
use growzone_schemas::{
    plant::{PhenologyState, PlantStage},
    strain::{StageChangeThreshold, StrainProfile, DEFAULT_RIPENING_HOURS},
};

/// Conditions for leaving a stage. Zero or `None` means the criterion is always met.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageGate {
    pub min_hours: f64,
    pub min_light_hours: f64,
    pub max_average_stress: Option<f64>,
}

/// Stage gates and biomass caps resolved once per strain.
#[derive(Debug, Clone, PartialEq)]
pub struct PhenologyConfig {
    gates: [StageGate; 4],
    caps: [f64; 5],
    resilience: f64,
}

impl PhenologyConfig {
    pub fn new(gates: [StageGate; 4], caps: [f64; 5], resilience: f64) -> Self {
        Self {
            gates,
            caps,
            resilience: clamp01(resilience),
        }
    }

    pub fn from_strain(strain: &StrainProfile) -> Self {
        let photoperiod = &strain.photoperiod;
        let thresholds = &strain.stage_change_thresholds;
        let gate = |hours: Option<f64>, threshold: Option<&StageChangeThreshold>| StageGate {
            min_hours: hours.map_or(0.0, non_negative),
            min_light_hours: threshold
                .and_then(|t| t.min_light_hours)
                .map_or(0.0, non_negative),
            max_average_stress: threshold.and_then(|t| t.max_stress_for_stage_change),
        };

        let gates = [
            gate(photoperiod.seedling_hours, thresholds.vegetative.as_ref()),
            gate(
                photoperiod.vegetation_days.map(|d| d * 24.0),
                thresholds.flowering.as_ref(),
            ),
            gate(
                photoperiod.flowering_days.map(|d| d * 24.0),
                thresholds.ripening.as_ref(),
            ),
            gate(
                Some(photoperiod.ripening_hours.unwrap_or(DEFAULT_RIPENING_HOURS)),
                None,
            ),
        ];
        let caps = PlantStage::ALL.map(|stage| {
            strain.growth_model.phase_cap_multipliers.for_stage(stage)
        });

        Self::new(gates, caps, strain.resilience)
    }

    /// Gate for leaving `stage`; `None` for the terminal stage.
    pub fn gate(&self, stage: PlantStage) -> Option<&StageGate> {
        self.gates.get(stage.index()).filter(|_| !stage.is_terminal())
    }

    pub fn cap_multiplier(&self, stage: PlantStage) -> f64 {
        self.caps[stage.index()]
    }

    /// Resilient strains tolerate proportionally more stress before transitioning.
    pub fn effective_stress_threshold(&self, ceiling: f64) -> f64 {
        clamp01(ceiling * (1.0 + (self.resilience - 0.5) * 0.5))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhenologyTick {
    pub hours: f64,
    pub light_hours: f64,
    pub stress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhenologyOutcome {
    pub stage: PlantStage,
    pub previous_stage: PlantStage,
    pub stage_changed: bool,
    pub stage_cap_multiplier: f64,
    /// Share of the current stage's minimum duration already spent, in [0, 1].
    pub stage_progress: f64,
}

/// Time-weighted mean stress since the stage began. Falls back to `current` while no time
/// has accumulated.
pub fn average_stress(state: &PhenologyState, current: f64) -> f64 {
    if state.stress_duration_hours > 0.0 {
        state.stress_integral / state.stress_duration_hours
    } else {
        current
    }
}

pub fn advance_phenology(
    state: &mut PhenologyState,
    tick: PhenologyTick,
    config: &PhenologyConfig,
) -> PhenologyOutcome {
    let hours = non_negative(tick.hours);
    let light_hours = non_negative(tick.light_hours);
    let stress = clamp01(tick.stress);

    state.hours_in_stage += hours;
    state.light_hours_in_stage += light_hours;
    state.total_light_hours += light_hours;
    state.stress_integral += stress * hours;
    state.stress_duration_hours += hours;

    let previous_stage = state.stage;
    let mut stage_changed = false;

    if let (Some(gate), Some(next)) = (config.gate(state.stage), state.stage.next()) {
        let duration_met = state.hours_in_stage >= gate.min_hours;
        let light_met = state.total_light_hours >= gate.min_light_hours;
        let stress_met = gate.max_average_stress.map_or(true, |ceiling| {
            average_stress(state, stress) <= config.effective_stress_threshold(ceiling)
        });

        if duration_met && light_met && stress_met {
            let total_light_hours = state.total_light_hours;
            *state = PhenologyState {
                total_light_hours,
                ..PhenologyState::new(next)
            };
            stage_changed = true;
        }
    }

    let stage_progress = match config.gate(state.stage) {
        Some(gate) if gate.min_hours > 0.0 => clamp01(state.hours_in_stage / gate.min_hours),
        _ => 1.0,
    };

    PhenologyOutcome {
        stage: state.stage,
        previous_stage,
        stage_changed,
        stage_cap_multiplier: config.cap_multiplier(state.stage),
        stage_progress,
    }
}
