//! Evolution of a zone's air state within a tick: transpiration influx, device deltas and
//! drift toward the ambient air. Every step ends inside the configured safety bounds.

use crate::devices::DeviceEffect;
use crate::physics::{
    clamp_finite, mix_factor, mix_toward, non_negative, vapor_pressure_deficit,
    water_mass_to_humidity_delta,
};
use growzone_schemas::{
    config::{MixingConfig, SafetyBounds},
    environment::{AmbientEnvironment, ZoneEnvironment, ZoneGeometry},
};

pub fn vpd(environment: &ZoneEnvironment) -> f64 {
    vapor_pressure_deficit(environment.temperature_c, environment.relative_humidity)
}

pub fn clamp_to_safety(environment: &mut ZoneEnvironment, safety: &SafetyBounds) {
    environment.temperature_c = clamp_finite(
        environment.temperature_c,
        safety.temperature_c.min,
        safety.temperature_c.max,
    );
    environment.relative_humidity = clamp_finite(
        environment.relative_humidity,
        safety.relative_humidity.min.max(0.0),
        safety.relative_humidity.max.min(1.0),
    );
    environment.co2_ppm = clamp_finite(environment.co2_ppm, safety.co2_ppm.min, safety.co2_ppm.max);
    environment.ppfd = non_negative(environment.ppfd);
}

/// Adds the water vapour transpired during the previous tick.
pub fn apply_transpiration_influx(
    environment: &mut ZoneEnvironment,
    liters: f64,
    geometry: &ZoneGeometry,
    safety: &SafetyBounds,
) {
    environment.relative_humidity +=
        water_mass_to_humidity_delta(non_negative(liters), geometry.volume_m3());
    clamp_to_safety(environment, safety);
}

/// Applies the aggregated device deltas. Light comes only from devices, so PPFD is replaced
/// rather than accumulated.
pub fn apply_device_effect(
    environment: &mut ZoneEnvironment,
    effect: &DeviceEffect,
    safety: &SafetyBounds,
) {
    if effect.temperature_delta.is_finite() {
        environment.temperature_c += effect.temperature_delta;
    }
    if effect.humidity_delta.is_finite() {
        environment.relative_humidity += effect.humidity_delta;
    }
    if effect.co2_delta.is_finite() {
        environment.co2_ppm += effect.co2_delta;
    }
    environment.ppfd = non_negative(effect.ppfd_delta);
    clamp_to_safety(environment, safety);
}

/// Air changes per hour produced by leakage plus forced airflow.
pub fn air_changes_per_hour(airflow_m3_per_h: f64, geometry: &ZoneGeometry, mixing: &MixingConfig) -> f64 {
    non_negative(mixing.passive_air_changes_per_hour)
        + non_negative(airflow_m3_per_h) / geometry.volume_m3()
}

pub fn mix_toward_ambient(
    environment: &mut ZoneEnvironment,
    airflow_m3_per_h: f64,
    geometry: &ZoneGeometry,
    ambient: &AmbientEnvironment,
    mixing: &MixingConfig,
    tick_hours: f64,
    safety: &SafetyBounds,
) {
    let ach = air_changes_per_hour(airflow_m3_per_h, geometry, mixing);
    let temperature_mix = mix_factor(
        mixing.temperature_rate_per_hour + mixing.temperature_airflow_factor * ach,
        tick_hours,
    );
    let humidity_mix = mix_factor(
        mixing.humidity_rate_per_hour + mixing.humidity_airflow_factor * ach,
        tick_hours,
    );
    let co2_mix = mix_factor(mixing.co2_rate_per_hour + mixing.co2_airflow_factor * ach, tick_hours);

    environment.temperature_c =
        mix_toward(environment.temperature_c, ambient.temperature_c, temperature_mix);
    environment.relative_humidity =
        mix_toward(environment.relative_humidity, ambient.relative_humidity, humidity_mix);
    environment.co2_ppm = mix_toward(environment.co2_ppm, ambient.co2_ppm, co2_mix);
    clamp_to_safety(environment, safety);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tent() -> ZoneGeometry {
        ZoneGeometry::new(10.0, 3.0)
    }

    #[test]
    fn device_light_replaces_previous_ppfd() {
        let mut env = ZoneEnvironment { ppfd: 600.0, ..ZoneEnvironment::default() };
        apply_device_effect(&mut env, &DeviceEffect::default(), &SafetyBounds::default());
        assert_eq!(env.ppfd, 0.0);

        let lit = DeviceEffect { ppfd_delta: 450.0, ..DeviceEffect::default() };
        apply_device_effect(&mut env, &lit, &SafetyBounds::default());
        assert_eq!(env.ppfd, 450.0);
    }

    #[test]
    fn mixing_moves_toward_ambient_without_crossing_it() {
        let mut env = ZoneEnvironment {
            temperature_c: 30.0,
            relative_humidity: 0.9,
            co2_ppm: 1200.0,
            ppfd: 300.0,
        };
        let ambient = AmbientEnvironment::default();
        mix_toward_ambient(
            &mut env,
            150.0,
            &tent(),
            &ambient,
            &MixingConfig::default(),
            1.0,
            &SafetyBounds::default(),
        );
        assert!(env.temperature_c < 30.0 && env.temperature_c >= ambient.temperature_c);
        assert!(env.relative_humidity < 0.9 && env.relative_humidity >= ambient.relative_humidity);
        assert!(env.co2_ppm < 1200.0 && env.co2_ppm >= ambient.co2_ppm);
        assert_eq!(env.ppfd, 300.0);
    }

    #[test]
    fn more_airflow_mixes_faster() {
        let start = ZoneEnvironment { temperature_c: 30.0, ..ZoneEnvironment::default() };
        let run = |airflow: f64| {
            let mut env = start;
            mix_toward_ambient(
                &mut env,
                airflow,
                &tent(),
                &AmbientEnvironment::default(),
                &MixingConfig::default(),
                0.5,
                &SafetyBounds::default(),
            );
            env.temperature_c
        };
        assert!(run(60.0) < run(0.0));
    }

    #[test]
    fn transpiration_influx_raises_humidity() {
        let mut env = ZoneEnvironment::default();
        apply_transpiration_influx(&mut env, 0.1, &tent(), &SafetyBounds::default());
        let expected = 0.5 + 0.1 / (30.0 * crate::physics::SATURATION_VAPOR_DENSITY_KG_PER_M3);
        assert!((env.relative_humidity - expected).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn humidity_stays_in_unit_interval(
            rh in -0.5f64..1.5,
            humidity_delta in -3.0f64..3.0,
            influx in 0.0f64..50.0,
            airflow in 0.0f64..2000.0,
            hours in 0.0f64..24.0,
            area in 0.1f64..100.0,
        ) {
            let geometry = ZoneGeometry::new(area, 2.5);
            let safety = SafetyBounds::default();
            let mut env = ZoneEnvironment { relative_humidity: rh, ..ZoneEnvironment::default() };
            apply_transpiration_influx(&mut env, influx, &geometry, &safety);
            prop_assert!((0.0..=1.0).contains(&env.relative_humidity));
            let effect = DeviceEffect { humidity_delta, airflow, ..DeviceEffect::default() };
            apply_device_effect(&mut env, &effect, &safety);
            prop_assert!((0.0..=1.0).contains(&env.relative_humidity));
            mix_toward_ambient(&mut env, airflow, &geometry, &AmbientEnvironment::default(), &MixingConfig::default(), hours, &safety);
            prop_assert!((0.0..=1.0).contains(&env.relative_humidity));
        }
    }
}
