//! Per-zone PI climate controller that converts setpoint errors into device power levels.

use crate::physics::{clamp_finite, non_negative};
use growzone_schemas::{
    config::{ClimateControllerConfig, ControllerSetpoints, PiGains},
    device::{DeviceInstance, DeviceKind},
    environment::ZoneEnvironment,
};

/// Output levels on a 0..100 scale, one per actuator channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerLevels {
    pub heating: f64,
    pub cooling: f64,
    pub humidify: f64,
    pub dehumidify: f64,
    pub co2_injection: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct PiLoop {
    integral: f64,
}

impl PiLoop {
    /// Signed output in [-100, 100]. The integral is frozen while the output saturates in
    /// the direction of the error.
    fn update(&mut self, error: f64, gains: PiGains, dt_hours: f64, integral_limit: f64) -> f64 {
        if !error.is_finite() {
            return 0.0;
        }
        let limit = non_negative(integral_limit);
        let candidate = clamp_finite(self.integral + error * dt_hours, -limit, limit);
        let raw = gains.kp * error + gains.ki * candidate;
        let output = clamp_finite(raw, -100.0, 100.0);
        let winding_up = raw != output && raw.signum() == error.signum();
        if !winding_up {
            self.integral = candidate;
        }
        output
    }
}

#[derive(Debug, Clone)]
pub struct ClimateController {
    config: ClimateControllerConfig,
    temperature: PiLoop,
    humidity: PiLoop,
    co2: PiLoop,
}

impl ClimateController {
    pub fn new(config: ClimateControllerConfig) -> Self {
        Self {
            config,
            temperature: PiLoop::default(),
            humidity: PiLoop::default(),
            co2: PiLoop::default(),
        }
    }

    pub fn update(
        &mut self,
        environment: &ZoneEnvironment,
        setpoints: &ControllerSetpoints,
        tick_hours: f64,
    ) -> PowerLevels {
        let dt = non_negative(tick_hours);
        let limit = self.config.integral_limit;

        let thermal = self.temperature.update(
            setpoints.temperature_c - environment.temperature_c,
            self.config.temperature,
            dt,
            limit,
        );
        let moisture = self.humidity.update(
            setpoints.relative_humidity - environment.relative_humidity,
            self.config.humidity,
            dt,
            limit,
        );
        let carbon = self.co2.update(
            setpoints.co2_ppm - environment.co2_ppm,
            self.config.co2,
            dt,
            limit,
        );

        let step = self.config.output_step;
        PowerLevels {
            heating: quantize(thermal.max(0.0), step),
            cooling: quantize((-thermal).max(0.0), step),
            humidify: quantize(moisture.max(0.0), step),
            dehumidify: quantize((-moisture).max(0.0), step),
            co2_injection: quantize(carbon.max(0.0), step),
        }
    }
}

fn quantize(level: f64, step: f64) -> f64 {
    let level = clamp_finite(level, 0.0, 100.0);
    if step > 0.0 && step.is_finite() {
        ((level / step).round() * step).clamp(0.0, 100.0)
    } else {
        level
    }
}

/// Setpoints declared by the zone's operational devices, falling back per channel.
pub fn resolve_setpoints(
    devices: &[DeviceInstance],
    fallback: &ControllerSetpoints,
) -> ControllerSetpoints {
    let mut setpoints = *fallback;
    let mut have_temperature = false;
    let mut have_humidity = false;
    let mut have_co2 = false;

    for device in devices.iter().filter(|d| d.is_operational()) {
        match &device.kind {
            DeviceKind::ClimateControl(settings) if !have_temperature => {
                if let Some(band) = settings.band() {
                    setpoints.temperature_c = settings
                        .target_temperature_c
                        .unwrap_or_else(|| band.midpoint());
                    have_temperature = true;
                }
            }
            DeviceKind::Dehumidifier(settings) if !have_humidity => {
                if let Some(band) = settings.band() {
                    setpoints.relative_humidity =
                        settings.target_humidity.unwrap_or_else(|| band.midpoint());
                    have_humidity = true;
                }
            }
            DeviceKind::Co2Injector(settings) if !have_co2 => {
                setpoints.co2_ppm = settings.target_ppm;
                have_co2 = true;
            }
            _ => {}
        }
    }
    setpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use growzone_schemas::device::{Co2InjectorSettings, DeviceStatus};

    fn environment(temperature_c: f64, relative_humidity: f64, co2_ppm: f64) -> ZoneEnvironment {
        ZoneEnvironment {
            temperature_c,
            relative_humidity,
            co2_ppm,
            ppfd: 0.0,
        }
    }

    #[test]
    fn cold_dry_zone_calls_for_heat_and_co2() {
        let mut controller = ClimateController::new(ClimateControllerConfig::default());
        let levels = controller.update(
            &environment(18.0, 0.6, 500.0),
            &ControllerSetpoints::default(),
            1.0,
        );
        assert_eq!(levels.heating, 100.0);
        assert_eq!(levels.cooling, 0.0);
        assert!(levels.co2_injection > 0.0);
        assert_eq!(levels.co2_injection % 5.0, 0.0);
    }

    #[test]
    fn integral_does_not_wind_up_while_saturated() {
        let mut controller = ClimateController::new(ClimateControllerConfig::default());
        let setpoints = ControllerSetpoints::default();
        for _ in 0..200 {
            controller.update(&environment(10.0, 0.6, 900.0), &setpoints, 1.0);
        }
        assert_eq!(controller.temperature.integral, 0.0);

        let levels = controller.update(&environment(26.0, 0.6, 900.0), &setpoints, 1.0);
        assert_eq!(levels.heating, 0.0);
        assert!(levels.cooling > 0.0);
    }

    #[test]
    fn setpoints_come_from_operational_devices() {
        let injector = |status| DeviceInstance {
            id: "co2".into(),
            name: "Burner".into(),
            status,
            efficiency: 1.0,
            kind: DeviceKind::Co2Injector(Co2InjectorSettings {
                power_kw: 0.0,
                target_ppm: 1100.0,
                pulse_ppm: 50.0,
                pulse_minutes: 15.0,
                hysteresis_ppm: 50.0,
                max_safe_ppm: 1800.0,
            }),
        };
        let fallback = ControllerSetpoints::default();
        assert_eq!(resolve_setpoints(&[injector(DeviceStatus::Operational)], &fallback).co2_ppm, 1100.0);
        assert_eq!(resolve_setpoints(&[injector(DeviceStatus::Broken)], &fallback).co2_ppm, fallback.co2_ppm);
    }
}
