//! Tunable constants of a simulation run. Every field has a default so a scenario only
//! needs to name what it changes.

use crate::environment::{AmbientEnvironment, ToleranceRange};
use serde::{Deserialize, Serialize};

/// Hard limits applied to the zone environment after every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyBounds {
    pub temperature_c: ToleranceRange<f64>,
    pub relative_humidity: ToleranceRange<f64>,
    pub co2_ppm: ToleranceRange<f64>,
}

impl Default for SafetyBounds {
    fn default() -> Self {
        Self {
            temperature_c: ToleranceRange::new(10.0, 40.0),
            relative_humidity: ToleranceRange::new(0.0, 1.0),
            co2_ppm: ToleranceRange::new(300.0, 1800.0),
        }
    }
}

/// Rates at which a zone drifts back toward the ambient air.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingConfig {
    pub temperature_rate_per_hour: f64,
    pub humidity_rate_per_hour: f64,
    pub co2_rate_per_hour: f64,
    pub temperature_airflow_factor: f64,
    pub humidity_airflow_factor: f64,
    pub co2_airflow_factor: f64,
    /// Leakage air changes per hour with every fan off.
    pub passive_air_changes_per_hour: f64,
}

impl Default for MixingConfig {
    fn default() -> Self {
        Self {
            temperature_rate_per_hour: 0.12,
            humidity_rate_per_hour: 0.08,
            co2_rate_per_hour: 0.18,
            temperature_airflow_factor: 0.25,
            humidity_airflow_factor: 0.2,
            co2_airflow_factor: 0.45,
            passive_air_changes_per_hour: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiGains {
    pub kp: f64,
    pub ki: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSetpoints {
    pub temperature_c: f64,
    pub relative_humidity: f64,
    pub co2_ppm: f64,
}

impl Default for ControllerSetpoints {
    fn default() -> Self {
        Self {
            temperature_c: 24.0,
            relative_humidity: 0.6,
            co2_ppm: 900.0,
        }
    }
}

/// Settings of the per-zone PI climate controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateControllerConfig {
    pub temperature: PiGains,
    pub humidity: PiGains,
    pub co2: PiGains,
    /// Outputs are rounded to multiples of this step on the 0..100 scale.
    pub output_step: f64,
    pub integral_limit: f64,
    /// Used when no device in the zone declares a target.
    pub fallback_setpoints: ControllerSetpoints,
}

impl Default for ClimateControllerConfig {
    fn default() -> Self {
        Self {
            temperature: PiGains { kp: 25.0, ki: 2.0 },
            humidity: PiGains { kp: 250.0, ki: 20.0 },
            co2: PiGains { kp: 0.15, ki: 0.01 },
            output_step: 5.0,
            integral_limit: 100.0,
            fallback_setpoints: ControllerSetpoints::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspirationConfig {
    /// Litres per m² of canopy per hour per kPa of VPD per unit leaf-area index.
    pub stomatal_conductance: f64,
    pub vpd_min_kpa: f64,
    pub vpd_max_kpa: f64,
}

impl Default for TranspirationConfig {
    fn default() -> Self {
        Self {
            stomatal_conductance: 0.08,
            vpd_min_kpa: 0.05,
            vpd_max_kpa: 3.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_length_minutes: f64,
    pub ambient: AmbientEnvironment,
    pub safety: SafetyBounds,
    pub mixing: MixingConfig,
    /// When absent, devices regulate themselves proportionally.
    pub climate_controller: Option<ClimateControllerConfig>,
    pub transpiration: TranspirationConfig,
    /// Nutrient grams dissolved in one litre of full-strength solution.
    pub nutrient_grams_per_liter: f64,
    pub emit_environment_events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_length_minutes: 60.0,
            ambient: AmbientEnvironment::default(),
            safety: SafetyBounds::default(),
            mixing: MixingConfig::default(),
            climate_controller: None,
            transpiration: TranspirationConfig::default(),
            nutrient_grams_per_liter: 1.0,
            emit_environment_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let yaml = "tick_length_minutes: 30\nmixing:\n  passive_air_changes_per_hour: 0.5\n";
        let config: SimulationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tick_length_minutes, 30.0);
        assert_eq!(config.mixing.passive_air_changes_per_hour, 0.5);
        assert_eq!(config.mixing.co2_rate_per_hour, MixingConfig::default().co2_rate_per_hour);
        assert!(config.climate_controller.is_none());
        assert!(config.emit_environment_events);
    }
}
