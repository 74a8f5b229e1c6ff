use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrowzoneError {
    #[error("Zone '{0}' not found in simulation state")]
    ZoneNotFound(String),

    #[error("Plant '{0}' not found in simulation state")]
    PlantNotFound(String),

    #[error("Device '{device_id}' not found in zone '{zone_id}'")]
    DeviceNotFound { zone_id: String, device_id: String },

    #[error("Strain profile '{strain_id}' referenced by plant '{plant_id}' not found")]
    StrainNotFound { plant_id: String, strain_id: String },

    #[error("At least one zone must be provided for the simulation")]
    NoZonesProvided,

    #[error("Duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("An error occurred during logging: {0}")]
    LoggingError(#[from] anyhow::Error),
}
