//! Turns the devices installed in a zone into one combined environment delta per tick.

use crate::controller::PowerLevels;
use crate::physics::{
    clamp01, energy_to_temperature_delta, non_negative, water_mass_to_humidity_delta,
};
use growzone_schemas::{
    device::{
        ClimateSettings, Co2InjectorSettings, DehumidifierSettings, DeviceInstance, DeviceKind,
        LightingSettings,
    },
    environment::{ZoneEnvironment, ZoneGeometry},
};
use std::ops::AddAssign;

/// Share of lamp heat that stays in the zone air rather than in fixtures and walls.
pub const LAMP_HEAT_TRANSFER_COEFFICIENT: f64 = 0.02;
/// Share of HVAC output that reaches the zone air within one tick.
pub const HVAC_HEAT_TRANSFER_COEFFICIENT: f64 = 0.025;

/// Combined change requested by devices for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceEffect {
    pub temperature_delta: f64,
    pub humidity_delta: f64,
    pub co2_delta: f64,
    pub ppfd_delta: f64,
    /// Forced air movement in m³/h.
    pub airflow: f64,
    pub energy_kwh: f64,
}

impl AddAssign for DeviceEffect {
    fn add_assign(&mut self, rhs: Self) {
        self.temperature_delta += rhs.temperature_delta;
        self.humidity_delta += rhs.humidity_delta;
        self.co2_delta += rhs.co2_delta;
        self.ppfd_delta += rhs.ppfd_delta;
        self.airflow += rhs.airflow;
        self.energy_kwh += rhs.energy_kwh;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeviceContext {
    pub tick_hours: f64,
    /// Output levels from the climate controller, 0..100 per channel.
    pub power_levels: Option<PowerLevels>,
}

pub fn aggregate_device_effects(
    devices: &[DeviceInstance],
    environment: &ZoneEnvironment,
    geometry: &ZoneGeometry,
    ctx: &DeviceContext,
) -> DeviceEffect {
    let mut total = DeviceEffect::default();
    for device in devices {
        total += device_effect(device, environment, geometry, ctx);
    }
    total
}

/// Effect of a single device. Anything not operational contributes nothing.
pub fn device_effect(
    device: &DeviceInstance,
    environment: &ZoneEnvironment,
    geometry: &ZoneGeometry,
    ctx: &DeviceContext,
) -> DeviceEffect {
    if !device.is_operational() {
        return DeviceEffect::default();
    }
    let efficiency = clamp01(device.efficiency);
    let hours = non_negative(ctx.tick_hours);

    match &device.kind {
        DeviceKind::Lighting(settings) => lighting_effect(settings, efficiency, geometry, hours),
        DeviceKind::ClimateControl(settings) => {
            climate_effect(settings, efficiency, environment, geometry, hours, ctx.power_levels)
        }
        DeviceKind::Dehumidifier(settings) => {
            dehumidifier_effect(settings, efficiency, environment, geometry, hours, ctx.power_levels)
        }
        DeviceKind::Co2Injector(settings) => {
            co2_effect(settings, efficiency, environment, hours, ctx.power_levels)
        }
        DeviceKind::Ventilation(settings) => DeviceEffect {
            airflow: non_negative(settings.airflow_m3_per_h) * efficiency,
            energy_kwh: non_negative(settings.power_kw) * hours,
            ..DeviceEffect::default()
        },
        DeviceKind::Other(settings) => DeviceEffect {
            energy_kwh: non_negative(settings.power_kw) * hours,
            ..DeviceEffect::default()
        },
    }
}

fn lighting_effect(
    settings: &LightingSettings,
    efficiency: f64,
    geometry: &ZoneGeometry,
    hours: f64,
) -> DeviceEffect {
    let power = non_negative(settings.power_kw);
    let heat_kwh = power * clamp01(settings.heat_fraction) * hours;
    let temperature_delta = energy_to_temperature_delta(heat_kwh, geometry.volume_m3())
        * LAMP_HEAT_TRANSFER_COEFFICIENT
        * efficiency;
    let coverage = clamp01(non_negative(settings.coverage_area_m2) / geometry.area());

    DeviceEffect {
        temperature_delta,
        ppfd_delta: non_negative(settings.ppfd) * coverage * efficiency,
        energy_kwh: power * hours,
        ..DeviceEffect::default()
    }
}

fn climate_effect(
    settings: &ClimateSettings,
    efficiency: f64,
    environment: &ZoneEnvironment,
    geometry: &ZoneGeometry,
    hours: f64,
    power_levels: Option<PowerLevels>,
) -> DeviceEffect {
    let Some(band) = settings.band() else {
        return DeviceEffect::default();
    };
    let target = settings
        .target_temperature_c
        .filter(|t| band.contains(*t))
        .unwrap_or_else(|| band.midpoint());
    let current = environment.temperature_c;

    let (capacity_kw, level) = if current > band.max {
        (
            settings.cooling_capacity_kw.unwrap_or(settings.power_kw),
            power_levels.map(|l| l.cooling),
        )
    } else if current < band.min {
        (
            settings.heating_capacity_kw.unwrap_or(settings.power_kw),
            power_levels.map(|l| l.heating),
        )
    } else {
        return DeviceEffect::default();
    };

    let desired = target - current;
    let modulation = match level {
        Some(level) => clamp01(level / 100.0),
        None if settings.full_power_at_delta_k > 0.0 => {
            clamp01(desired.abs() / settings.full_power_at_delta_k)
        }
        None => 1.0,
    };
    let energy_kwh = non_negative(capacity_kw) * hours * modulation;
    let potential = energy_to_temperature_delta(energy_kwh, geometry.volume_m3())
        * HVAC_HEAT_TRANSFER_COEFFICIENT
        * efficiency;

    DeviceEffect {
        temperature_delta: desired.signum() * desired.abs().min(potential),
        airflow: non_negative(settings.airflow_m3_per_h) * efficiency * modulation,
        energy_kwh,
        ..DeviceEffect::default()
    }
}

fn dehumidifier_effect(
    settings: &DehumidifierSettings,
    efficiency: f64,
    environment: &ZoneEnvironment,
    geometry: &ZoneGeometry,
    hours: f64,
    power_levels: Option<PowerLevels>,
) -> DeviceEffect {
    let Some(band) = settings.band() else {
        return DeviceEffect::default();
    };
    let target = clamp01(
        settings
            .target_humidity
            .filter(|t| band.contains(*t))
            .unwrap_or_else(|| band.midpoint()),
    );
    let current = clamp01(environment.relative_humidity);
    let excess = current - target;
    let deficit = -excess;
    let can_humidify = settings.humidify_rate_kg_per_h > 0.0;
    let proportional = |gap: f64| {
        if settings.full_power_at_delta > 0.0 {
            clamp01(gap / settings.full_power_at_delta)
        } else {
            1.0
        }
    };

    // (rate at full output, modulation, gap to target)
    let (rate_kg_per_h, modulation, gap) = match power_levels {
        Some(levels) if excess > 0.0 => (
            settings.removal_rate_kg_per_h,
            clamp01(levels.dehumidify / 100.0),
            excess,
        ),
        Some(levels) if deficit > 0.0 && can_humidify => (
            settings.humidify_rate_kg_per_h,
            clamp01(levels.humidify / 100.0),
            deficit,
        ),
        None if current > band.max => {
            (settings.removal_rate_kg_per_h, proportional(excess), excess)
        }
        None if current < band.min && can_humidify => {
            (settings.humidify_rate_kg_per_h, proportional(deficit), deficit)
        }
        _ => return DeviceEffect::default(),
    };
    if modulation <= 0.0 {
        return DeviceEffect::default();
    }

    let moved_kg = non_negative(rate_kg_per_h) * hours * efficiency * modulation;
    let change = water_mass_to_humidity_delta(moved_kg, geometry.volume_m3()).min(gap);

    DeviceEffect {
        humidity_delta: if excess > 0.0 { -change } else { change },
        energy_kwh: non_negative(settings.power_kw) * hours * modulation,
        ..DeviceEffect::default()
    }
}

fn co2_effect(
    settings: &Co2InjectorSettings,
    efficiency: f64,
    environment: &ZoneEnvironment,
    hours: f64,
    power_levels: Option<PowerLevels>,
) -> DeviceEffect {
    let current = environment.co2_ppm;
    if !current.is_finite() || current >= settings.target_ppm - non_negative(settings.hysteresis_ppm) {
        return DeviceEffect::default();
    }
    let modulation = power_levels.map_or(1.0, |l| clamp01(l.co2_injection / 100.0));
    if modulation <= 0.0 {
        return DeviceEffect::default();
    }

    let pulse_minutes = if settings.pulse_minutes > 0.0 { settings.pulse_minutes } else { 1.0 };
    let pulse = non_negative(settings.pulse_ppm) * (hours * 60.0) / pulse_minutes;
    let increase = (settings.target_ppm - current).min(pulse) * efficiency * modulation;
    let headroom = settings.max_safe_ppm - current;

    DeviceEffect {
        co2_delta: increase.min(headroom).max(0.0),
        energy_kwh: non_negative(settings.power_kw) * hours * modulation,
        ..DeviceEffect::default()
    }
}
