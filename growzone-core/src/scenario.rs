use crate::error::GrowzoneError;
use growzone_schemas::file_formats::{ScenarioFile, StrainFile};
use std::fs;

pub fn load_scenario(path: &str) -> Result<ScenarioFile, GrowzoneError> {
    let content = fs::read_to_string(path).map_err(|e| GrowzoneError::FileIO(path.to_string(), e))?;
    serde_yaml::from_str(&content).map_err(|e| GrowzoneError::YamlParsing(path.to_string(), e))
}

pub fn load_strain_file(path: &str) -> Result<StrainFile, GrowzoneError> {
    let content = fs::read_to_string(path).map_err(|e| GrowzoneError::FileIO(path.to_string(), e))?;
    serde_yaml::from_str(&content).map_err(|e| GrowzoneError::YamlParsing(path.to_string(), e))
}
