//! Defines the physical state of a cultivation zone: the well-mixed air volume, its
//! geometry and the reservoirs that feed its plants.

use serde::{Deserialize, Serialize};

/// Floor applied to zone dimensions so volume based conversions never divide by zero.
pub const MIN_ZONE_DIMENSION: f64 = 0.0001;

/// A generic struct to define a minimum and maximum tolerance range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRange<T> {
    pub min: T,
    pub max: T,
}

impl ToleranceRange<f64> {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min).abs()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Absolute distance from `value` to the nearest edge, zero inside the range.
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// The measurable air state of a zone.
///
/// Vapour-pressure deficit is never stored; it is derived from temperature and humidity
/// whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneEnvironment {
    /// Air temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Relative humidity as a fraction between 0 and 1.
    pub relative_humidity: f64,
    /// Carbon dioxide concentration in ppm.
    pub co2_ppm: f64,
    /// Photosynthetic photon flux density in µmol·m⁻²·s⁻¹.
    #[serde(default)]
    pub ppfd: f64,
}

impl Default for ZoneEnvironment {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            relative_humidity: 0.5,
            co2_ppm: 400.0,
            ppfd: 0.0,
        }
    }
}

/// Outside air the zone exchanges with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientEnvironment {
    pub temperature_c: f64,
    pub relative_humidity: f64,
    pub co2_ppm: f64,
}

impl Default for AmbientEnvironment {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            relative_humidity: 0.5,
            co2_ppm: 400.0,
        }
    }
}

/// Floor area and ceiling height of a zone. Only a resize command changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneGeometry {
    pub area_m2: f64,
    pub ceiling_height_m: f64,
}

impl ZoneGeometry {
    pub fn new(area_m2: f64, ceiling_height_m: f64) -> Self {
        Self {
            area_m2: sanitize_dimension(area_m2),
            ceiling_height_m: sanitize_dimension(ceiling_height_m),
        }
    }

    pub fn area(&self) -> f64 {
        sanitize_dimension(self.area_m2)
    }

    pub fn volume_m3(&self) -> f64 {
        self.area() * sanitize_dimension(self.ceiling_height_m)
    }
}

fn sanitize_dimension(value: f64) -> f64 {
    if value.is_finite() && value > MIN_ZONE_DIMENSION {
        value
    } else {
        MIN_ZONE_DIMENSION
    }
}

/// Water and nutrient reservoirs shared by every plant in a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneResources {
    pub water_liters: f64,
    pub reservoir_capacity_liters: f64,
    #[serde(default)]
    pub nutrient_solution_liters: f64,
    /// Strength of the nutrient solution, 1.0 being the full mix.
    #[serde(default = "default_nutrient_strength")]
    pub nutrient_strength: f64,
    /// Litres transpired by the zone's plants during the last tick.
    #[serde(default)]
    pub last_transpiration_liters: f64,
}

fn default_nutrient_strength() -> f64 {
    1.0
}

impl ZoneResources {
    pub fn reservoir_level(&self) -> f64 {
        if self.reservoir_capacity_liters <= 0.0 || !self.reservoir_capacity_liters.is_finite() {
            return 0.0;
        }
        let level = self.water_liters / self.reservoir_capacity_liters;
        if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for ZoneResources {
    fn default() -> Self {
        Self {
            water_liters: 100.0,
            reservoir_capacity_liters: 100.0,
            nutrient_solution_liters: 50.0,
            nutrient_strength: 1.0,
            last_transpiration_liters: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_floors_degenerate_dimensions() {
        let geometry = ZoneGeometry::new(-3.0, f64::NAN);
        assert_eq!(geometry.area(), MIN_ZONE_DIMENSION);
        assert!(geometry.volume_m3() > 0.0);

        let tent = ZoneGeometry::new(10.0, 3.0);
        assert!((tent.volume_m3() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn reservoir_level_is_bounded() {
        let mut resources = ZoneResources::default();
        resources.water_liters = 250.0;
        assert_eq!(resources.reservoir_level(), 1.0);
        resources.water_liters = 25.0;
        assert!((resources.reservoir_level() - 0.25).abs() < 1e-9);
        resources.reservoir_capacity_liters = 0.0;
        assert_eq!(resources.reservoir_level(), 0.0);
    }

    #[test]
    fn tolerance_range_distance() {
        let band = ToleranceRange::new(20.0, 28.0);
        assert_eq!(band.distance_outside(24.0), 0.0);
        assert_eq!(band.distance_outside(18.0), 2.0);
        assert_eq!(band.distance_outside(31.0), 3.0);
        assert_eq!(band.midpoint(), 24.0);
    }
}
