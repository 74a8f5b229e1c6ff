use crate::plant::PlantStage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMetric {
    Temperature,
    Humidity,
    Co2,
    Ppfd,
    Vpd,
}

/// How far a measured value sits from a strain's preferred band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Optimal,
    Acceptable,
    Stress,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlantEvent {
    #[serde(rename = "plant.stageChanged")]
    StageChanged {
        plant_id: String,
        zone_id: String,
        from: PlantStage,
        to: PlantStage,
    },
    #[serde(rename = "plant.healthAlert")]
    HealthAlert {
        plant_id: String,
        zone_id: String,
        health: f64,
        threshold: f64,
    },
    #[serde(rename = "plant.environmentStress")]
    EnvironmentStress {
        plant_id: String,
        zone_id: String,
        strain_id: String,
        metric: EnvironmentMetric,
        status: MetricStatus,
        value: f64,
        deviation: f64,
    },
    #[serde(rename = "plant.optimalEnvironment")]
    OptimalEnvironment {
        plant_id: String,
        zone_id: String,
        strain_id: String,
    },
}

impl PlantEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PlantEvent::StageChanged { .. } => "plant.stageChanged",
            PlantEvent::HealthAlert { .. } => "plant.healthAlert",
            PlantEvent::EnvironmentStress { .. } => "plant.environmentStress",
            PlantEvent::OptimalEnvironment { .. } => "plant.optimalEnvironment",
        }
    }

    pub fn plant_id(&self) -> &str {
        match self {
            PlantEvent::StageChanged { plant_id, .. }
            | PlantEvent::HealthAlert { plant_id, .. }
            | PlantEvent::EnvironmentStress { plant_id, .. }
            | PlantEvent::OptimalEnvironment { plant_id, .. } => plant_id,
        }
    }

    pub fn zone_id(&self) -> &str {
        match self {
            PlantEvent::StageChanged { zone_id, .. }
            | PlantEvent::HealthAlert { zone_id, .. }
            | PlantEvent::EnvironmentStress { zone_id, .. }
            | PlantEvent::OptimalEnvironment { zone_id, .. } => zone_id,
        }
    }
}

/// A structured notification raised by the simulation for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub tick: u64,
    pub level: EventLevel,
    #[serde(flatten)]
    pub payload: PlantEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_dotted_type_tag() {
        let event = SimulationEvent {
            tick: 12,
            level: EventLevel::Info,
            payload: PlantEvent::StageChanged {
                plant_id: "p-1".into(),
                zone_id: "z-1".into(),
                from: PlantStage::Seedling,
                to: PlantStage::Vegetative,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "plant.stageChanged");
        assert_eq!(json["level"], "info");
        assert_eq!(json["to"], "vegetative");

        let back: SimulationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
