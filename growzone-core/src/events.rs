//! Plant-level notifications: stage changes, health alerts and environment evaluations
//! against a strain's preferred bands.

use crate::environment::vpd;
use growzone_schemas::{
    environment::{ToleranceRange, ZoneEnvironment},
    event::{EnvironmentMetric, EventLevel, MetricStatus, PlantEvent, SimulationEvent},
    plant::{PlantStage, PlantState},
    strain::StrainProfile,
};
use tracing::{error, info, warn};

pub const HEALTH_WARNING_THRESHOLD: f64 = 0.5;
pub const HEALTH_CRITICAL_THRESHOLD: f64 = 0.3;

const DEFAULT_TEMPERATURE_BAND: ToleranceRange<f64> = ToleranceRange { min: 20.0, max: 28.0 };
const DEFAULT_HUMIDITY_BAND: ToleranceRange<f64> = ToleranceRange { min: 0.4, max: 0.7 };
const DEFAULT_CO2_BAND: ToleranceRange<f64> = ToleranceRange { min: 400.0, max: 1500.0 };
const DEFAULT_PPFD_BAND: ToleranceRange<f64> = ToleranceRange { min: 400.0, max: 800.0 };
const DEFAULT_VPD_BAND: ToleranceRange<f64> = ToleranceRange { min: 0.4, max: 1.6 };

/// Append-only destination for simulation events.
pub trait EventSink {
    fn emit(&mut self, event: SimulationEvent);
}

impl EventSink for Vec<SimulationEvent> {
    fn emit(&mut self, event: SimulationEvent) {
        self.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricEvaluation {
    pub metric: EnvironmentMetric,
    pub value: f64,
    pub band: ToleranceRange<f64>,
    /// Distance outside the band in band widths.
    pub deviation: f64,
    pub status: MetricStatus,
}

pub fn classify(deviation: f64) -> MetricStatus {
    if deviation.is_nan() || deviation > 1.0 {
        MetricStatus::Critical
    } else if deviation > 0.25 {
        MetricStatus::Stress
    } else if deviation > 0.0 {
        MetricStatus::Acceptable
    } else {
        MetricStatus::Optimal
    }
}

fn evaluate(metric: EnvironmentMetric, value: f64, band: ToleranceRange<f64>) -> MetricEvaluation {
    let width = band.width().max(f64::EPSILON);
    let deviation = band.distance_outside(value) / width;
    MetricEvaluation {
        metric,
        value,
        band,
        deviation,
        status: classify(deviation),
    }
}

/// Classifies every metric of `environment` for a plant of `strain` in `stage`. PPFD is
/// skipped while the lights are off.
pub fn evaluate_environment(
    strain: &StrainProfile,
    stage: PlantStage,
    environment: &ZoneEnvironment,
) -> Vec<MetricEvaluation> {
    let preferences = &strain.environmental_preferences;
    let mut evaluations = vec![
        evaluate(
            EnvironmentMetric::Temperature,
            environment.temperature_c,
            preferences
                .ideal_temperature
                .for_stage(stage)
                .copied()
                .unwrap_or(DEFAULT_TEMPERATURE_BAND),
        ),
        evaluate(
            EnvironmentMetric::Humidity,
            environment.relative_humidity,
            preferences
                .ideal_humidity
                .for_stage(stage)
                .copied()
                .unwrap_or(DEFAULT_HUMIDITY_BAND),
        ),
        evaluate(
            EnvironmentMetric::Co2,
            environment.co2_ppm,
            preferences.co2_ppm.unwrap_or(DEFAULT_CO2_BAND),
        ),
        evaluate(
            EnvironmentMetric::Vpd,
            vpd(environment),
            preferences.vpd_kpa.unwrap_or(DEFAULT_VPD_BAND),
        ),
    ];
    if environment.ppfd > 0.0 {
        evaluations.push(evaluate(
            EnvironmentMetric::Ppfd,
            environment.ppfd,
            preferences
                .light_intensity
                .for_stage(stage)
                .copied()
                .unwrap_or(DEFAULT_PPFD_BAND),
        ));
    }
    evaluations
}

pub fn emit_environment_events(
    sink: &mut impl EventSink,
    tick: u64,
    plant: &PlantState,
    evaluations: &[MetricEvaluation],
) {
    let mut all_optimal = true;
    for evaluation in evaluations {
        let level = match evaluation.status {
            MetricStatus::Optimal => continue,
            MetricStatus::Acceptable => {
                all_optimal = false;
                continue;
            }
            MetricStatus::Stress => EventLevel::Warning,
            MetricStatus::Critical => EventLevel::Error,
        };
        all_optimal = false;
        sink.emit(SimulationEvent {
            tick,
            level,
            payload: PlantEvent::EnvironmentStress {
                plant_id: plant.id.clone(),
                zone_id: plant.zone_id.clone(),
                strain_id: plant.strain_id.clone(),
                metric: evaluation.metric,
                status: evaluation.status,
                value: evaluation.value,
                deviation: evaluation.deviation,
            },
        });
    }

    if all_optimal {
        sink.emit(SimulationEvent {
            tick,
            level: EventLevel::Info,
            payload: PlantEvent::OptimalEnvironment {
                plant_id: plant.id.clone(),
                zone_id: plant.zone_id.clone(),
                strain_id: plant.strain_id.clone(),
            },
        });
    }
}

/// Raises one alert per threshold that health fell through this tick, warning before error.
pub fn emit_health_alert(
    sink: &mut impl EventSink,
    tick: u64,
    plant: &PlantState,
    previous_health: f64,
) {
    let thresholds = [
        (HEALTH_WARNING_THRESHOLD, EventLevel::Warning),
        (HEALTH_CRITICAL_THRESHOLD, EventLevel::Error),
    ];
    for (threshold, level) in thresholds {
        if previous_health < threshold || plant.health >= threshold {
            continue;
        }
        match level {
            EventLevel::Error => error!(plant_id = %plant.id, health = plant.health, "plant health critical"),
            _ => warn!(plant_id = %plant.id, health = plant.health, "plant health low"),
        }
        sink.emit(SimulationEvent {
            tick,
            level,
            payload: PlantEvent::HealthAlert {
                plant_id: plant.id.clone(),
                zone_id: plant.zone_id.clone(),
                health: plant.health,
                threshold,
            },
        });
    }
}

pub fn emit_stage_change(
    sink: &mut impl EventSink,
    tick: u64,
    plant: &PlantState,
    from: PlantStage,
) {
    info!(
        plant_id = %plant.id,
        from = from.as_str(),
        to = plant.stage.as_str(),
        "plant stage changed"
    );
    sink.emit(SimulationEvent {
        tick,
        level: EventLevel::Info,
        payload: PlantEvent::StageChanged {
            plant_id: plant.id.clone(),
            zone_id: plant.zone_id.clone(),
            from,
            to: plant.stage,
        },
    });
}
