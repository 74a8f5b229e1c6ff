//! Pure environmental physics shared by the device, environment and plant models.
//!
//! Every function here is stateless and total: non-finite inputs are clamped instead of
//! propagated, so a bad reading can never poison zone state with `NaN`.

/// Heat capacity of air in kWh per m³ per kelvin.
pub const AIR_SPECIFIC_HEAT_KWH_PER_M3K: f64 = 0.000335;
/// Lower bound on a zone's thermal capacity in kWh/K.
pub const MIN_THERMAL_CAPACITY_KWH_PER_K: f64 = 0.001;
/// Water vapour held by one m³ of saturated air, in kg.
pub const SATURATION_VAPOR_DENSITY_KG_PER_M3: f64 = 0.0173;
/// Moles of photons per µmol·m⁻²·s⁻¹ sustained for one hour.
pub const PHOTONS_MOL_PER_PPFD_HOUR: f64 = 3600.0 * 1e-6;

const MIN_SIGMA: f64 = 0.05;

pub fn clamp01(value: f64) -> f64 {
    clamp_finite(value, 0.0, 1.0)
}

/// Clamp to `[min, max]`, mapping `NaN` to `min`.
pub fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Non-negative finite value, or zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Saturation vapour pressure in kPa (Magnus–Tetens).
pub fn saturation_vapor_pressure(temperature_c: f64) -> f64 {
    let t = clamp_finite(temperature_c, -50.0, 60.0);
    0.6108 * ((17.27 * t) / (t + 237.3)).exp()
}

/// Vapour-pressure deficit in kPa.
pub fn vapor_pressure_deficit(temperature_c: f64, relative_humidity: f64) -> f64 {
    let es = saturation_vapor_pressure(temperature_c);
    let ea = es * clamp01(relative_humidity);
    (es - ea).max(0.0)
}

/// Bell-shaped response peaking at 1 when `value == optimum`.
pub fn gaussian_response(value: f64, optimum: f64, sigma: f64) -> f64 {
    if !value.is_finite() || !optimum.is_finite() {
        return 0.0;
    }
    let sigma = if sigma.is_finite() { sigma.abs().max(MIN_SIGMA) } else { MIN_SIGMA };
    let diff = value - optimum;
    (-(diff * diff) / (2.0 * sigma * sigma)).exp()
}

/// Rectangular-hyperbola light response: linear at low light, saturating at `max_rate`.
pub fn light_response(ppfd: f64, light_use_efficiency: f64, max_rate: f64) -> f64 {
    let ppfd = non_negative(ppfd);
    let efficiency = non_negative(light_use_efficiency);
    let max_rate = non_negative(max_rate);
    if max_rate == 0.0 {
        return 0.0;
    }
    let gross = efficiency * ppfd;
    gross / (1.0 + gross / max_rate)
}

/// Canopy water loss per m² per hour.
pub fn transpiration_rate(
    stomatal_conductance: f64,
    vpd_kpa: f64,
    leaf_area_index: f64,
    vpd_min: f64,
    vpd_max: f64,
) -> f64 {
    let (low, high) = if vpd_min <= vpd_max { (vpd_min, vpd_max) } else { (vpd_max, vpd_min) };
    let vpd = clamp_finite(vpd_kpa, low, high);
    non_negative(stomatal_conductance) * vpd * non_negative(leaf_area_index)
}

/// Share of the gap to ambient closed within one tick.
pub fn mix_factor(rate_per_hour: f64, tick_hours: f64) -> f64 {
    clamp01(non_negative(rate_per_hour) * non_negative(tick_hours))
}

pub fn mix_toward(current: f64, target: f64, factor: f64) -> f64 {
    current + (target - current) * clamp01(factor)
}

/// Temperature change caused by `energy_kwh` of heat released into the zone air.
pub fn energy_to_temperature_delta(energy_kwh: f64, volume_m3: f64) -> f64 {
    if !energy_kwh.is_finite() {
        return 0.0;
    }
    let capacity = (non_negative(volume_m3) * AIR_SPECIFIC_HEAT_KWH_PER_M3K)
        .max(MIN_THERMAL_CAPACITY_KWH_PER_K);
    energy_kwh / capacity
}

/// Relative-humidity change caused by adding (positive) or removing water vapour.
pub fn water_mass_to_humidity_delta(water_kg: f64, volume_m3: f64) -> f64 {
    if !water_kg.is_finite() {
        return 0.0;
    }
    let capacity = non_negative(volume_m3) * SATURATION_VAPOR_DENSITY_KG_PER_M3;
    if capacity <= 0.0 {
        return 0.0;
    }
    water_kg / capacity
}

/// Fraction of light intercepted by a canopy (Beer–Lambert).
pub fn canopy_interception(leaf_area_index: f64) -> f64 {
    1.0 - (-0.7 * non_negative(leaf_area_index)).exp()
}
