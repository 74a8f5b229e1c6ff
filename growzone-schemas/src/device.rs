//! Devices installed in a zone. Each device kind carries its own typed settings so the
//! effect aggregator can match on it exhaustively.

use crate::environment::ToleranceRange;
use serde::{Deserialize, Serialize};

/// Fraction of lamp power released as sensible heat when a lamp does not say otherwise.
pub const DEFAULT_LAMP_HEAT_FRACTION: f64 = 0.3;
/// Floor area a lamp illuminates when no coverage is configured.
pub const DEFAULT_LAMP_COVERAGE_M2: f64 = 1.0;
pub const DEFAULT_TEMPERATURE_HYSTERESIS_K: f64 = 1.0;
pub const DEFAULT_FULL_POWER_DELTA_K: f64 = 2.0;
pub const DEFAULT_HUMIDITY_HYSTERESIS: f64 = 0.05;
pub const DEFAULT_FULL_POWER_DELTA_HUMIDITY: f64 = 0.1;
pub const DEFAULT_CO2_HYSTERESIS_PPM: f64 = 50.0;
pub const DEFAULT_CO2_PULSE_MINUTES: f64 = 15.0;
pub const DEFAULT_MAX_SAFE_CO2_PPM: f64 = 1800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    #[default]
    Operational,
    Maintenance,
    Broken,
    Offline,
}

impl DeviceStatus {
    pub fn is_operational(self) -> bool {
        matches!(self, DeviceStatus::Operational)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingSettings {
    pub power_kw: f64,
    /// Photon flux delivered over the coverage area at full efficiency.
    pub ppfd: f64,
    #[serde(default = "default_coverage")]
    pub coverage_area_m2: f64,
    #[serde(default = "default_heat_fraction")]
    pub heat_fraction: f64,
}

/// Heating and cooling unit that holds air temperature inside a band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSettings {
    #[serde(default)]
    pub power_kw: f64,
    #[serde(default)]
    pub cooling_capacity_kw: Option<f64>,
    #[serde(default)]
    pub heating_capacity_kw: Option<f64>,
    #[serde(default)]
    pub target_temperature_c: Option<f64>,
    /// Explicit band; takes precedence over target and hysteresis.
    #[serde(default)]
    pub target_temperature_range: Option<ToleranceRange<f64>>,
    #[serde(default = "default_temperature_hysteresis")]
    pub hysteresis_k: f64,
    #[serde(default = "default_full_power_delta")]
    pub full_power_at_delta_k: f64,
    #[serde(default)]
    pub airflow_m3_per_h: f64,
}

impl ClimateSettings {
    /// The band the unit holds, or `None` when no setpoint is configured.
    pub fn band(&self) -> Option<ToleranceRange<f64>> {
        band_from(self.target_temperature_range, self.target_temperature_c, self.hysteresis_k)
    }
}

/// Humidity control unit. Dries air above its band and, with a humidify rate set, wets air
/// below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DehumidifierSettings {
    #[serde(default)]
    pub power_kw: f64,
    /// Water removed from the air at full output.
    pub removal_rate_kg_per_h: f64,
    /// Water added to the air at full output. Zero for units that can only dry.
    #[serde(default)]
    pub humidify_rate_kg_per_h: f64,
    #[serde(default)]
    pub target_humidity: Option<f64>,
    #[serde(default)]
    pub target_humidity_range: Option<ToleranceRange<f64>>,
    #[serde(default = "default_humidity_hysteresis")]
    pub hysteresis: f64,
    #[serde(default = "default_full_power_delta_humidity")]
    pub full_power_at_delta: f64,
}

impl DehumidifierSettings {
    pub fn band(&self) -> Option<ToleranceRange<f64>> {
        band_from(self.target_humidity_range, self.target_humidity, self.hysteresis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2InjectorSettings {
    #[serde(default)]
    pub power_kw: f64,
    pub target_ppm: f64,
    /// ppm released by one full pulse.
    pub pulse_ppm: f64,
    #[serde(default = "default_pulse_minutes")]
    pub pulse_minutes: f64,
    #[serde(default = "default_co2_hysteresis")]
    pub hysteresis_ppm: f64,
    #[serde(default = "default_max_safe_co2")]
    pub max_safe_ppm: f64,
}

/// Exhaust fan exchanging zone air with the ambient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilationSettings {
    #[serde(default)]
    pub power_kw: f64,
    pub airflow_m3_per_h: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OtherSettings {
    #[serde(default)]
    pub power_kw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    Lighting(LightingSettings),
    ClimateControl(ClimateSettings),
    Dehumidifier(DehumidifierSettings),
    Co2Injector(Co2InjectorSettings),
    Ventilation(VentilationSettings),
    Other(OtherSettings),
}

impl DeviceKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceKind::Lighting(_) => "lighting",
            DeviceKind::ClimateControl(_) => "climate_control",
            DeviceKind::Dehumidifier(_) => "dehumidifier",
            DeviceKind::Co2Injector(_) => "co2_injector",
            DeviceKind::Ventilation(_) => "ventilation",
            DeviceKind::Other(_) => "other",
        }
    }
}

/// A device installed in a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInstance {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    /// Condition of the unit in [0, 1]; scales every effect it has.
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    pub kind: DeviceKind,
}

impl DeviceInstance {
    pub fn is_operational(&self) -> bool {
        self.status.is_operational()
    }
}

fn band_from(
    range: Option<ToleranceRange<f64>>,
    target: Option<f64>,
    hysteresis: f64,
) -> Option<ToleranceRange<f64>> {
    if let Some(range) = range {
        let (min, max) = if range.min <= range.max {
            (range.min, range.max)
        } else {
            (range.max, range.min)
        };
        return Some(ToleranceRange::new(min, max));
    }
    let target = target.filter(|t| t.is_finite())?;
    let half = if hysteresis.is_finite() { hysteresis.abs() / 2.0 } else { 0.0 };
    Some(ToleranceRange::new(target - half, target + half))
}

fn default_efficiency() -> f64 {
    1.0
}

fn default_coverage() -> f64 {
    DEFAULT_LAMP_COVERAGE_M2
}

fn default_heat_fraction() -> f64 {
    DEFAULT_LAMP_HEAT_FRACTION
}

fn default_temperature_hysteresis() -> f64 {
    DEFAULT_TEMPERATURE_HYSTERESIS_K
}

fn default_full_power_delta() -> f64 {
    DEFAULT_FULL_POWER_DELTA_K
}

fn default_humidity_hysteresis() -> f64 {
    DEFAULT_HUMIDITY_HYSTERESIS
}

fn default_full_power_delta_humidity() -> f64 {
    DEFAULT_FULL_POWER_DELTA_HUMIDITY
}

fn default_pulse_minutes() -> f64 {
    DEFAULT_CO2_PULSE_MINUTES
}

fn default_co2_hysteresis() -> f64 {
    DEFAULT_CO2_HYSTERESIS_PPM
}

fn default_max_safe_co2() -> f64 {
    DEFAULT_MAX_SAFE_CO2_PPM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn climate_band_prefers_explicit_range() {
        let mut settings = ClimateSettings {
            power_kw: 1.0,
            cooling_capacity_kw: None,
            heating_capacity_kw: None,
            target_temperature_c: Some(24.0),
            target_temperature_range: None,
            hysteresis_k: 2.0,
            full_power_at_delta_k: DEFAULT_FULL_POWER_DELTA_K,
            airflow_m3_per_h: 0.0,
        };
        assert_eq!(settings.band(), Some(ToleranceRange::new(23.0, 25.0)));

        settings.target_temperature_range = Some(ToleranceRange::new(26.0, 22.0));
        assert_eq!(settings.band(), Some(ToleranceRange::new(22.0, 26.0)));

        settings.target_temperature_range = None;
        settings.target_temperature_c = None;
        assert_eq!(settings.band(), None);
    }

    #[test]
    fn devices_deserialize_with_defaults() {
        let yaml = r#"
id: lamp-1
name: LED bar
kind:
  type: lighting
  power_kw: 0.6
  ppfd: 900
"#;
        let device: DeviceInstance = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(device.status, DeviceStatus::Operational);
        assert_eq!(device.efficiency, 1.0);
        match device.kind {
            DeviceKind::Lighting(settings) => {
                assert_eq!(settings.coverage_area_m2, DEFAULT_LAMP_COVERAGE_M2);
                assert_eq!(settings.heat_fraction, DEFAULT_LAMP_HEAT_FRACTION);
            }
            other => panic!("unexpected kind {}", other.label()),
        }
    }
}
