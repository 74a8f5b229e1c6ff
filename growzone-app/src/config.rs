use anyhow::{Context, Result};
use growzone_schemas::{file_formats::StrainFile, strain::StrainProfile};
use std::{collections::HashMap, fs, path::Path};
use tracing::{info, warn};

/// The static data a run draws on: every strain profile found under the base directory.
pub struct KnowledgeBase {
    pub strains: HashMap<String, StrainProfile>,
}

impl KnowledgeBase {
    /// Loads all data from the specified base directory.
    pub fn load(base_path: &str) -> Result<Self> {
        info!(base_path, "loading knowledge base");

        let strains = load_yaml_files_into_map(
            Path::new(base_path).join("strains"),
            |file: StrainFile| file.strains,
            |item: &StrainProfile| item.id.clone(),
        )?;
        if strains.is_empty() {
            warn!(base_path, "knowledge base holds no strains");
        }

        info!(strains = strains.len(), "knowledge base loaded");
        Ok(Self { strains })
    }
}

/// Generic helper to load all YAML files in a directory into a HashMap.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., StrainFile)
    E: Fn(F) -> Vec<T>,                  // Extracts the Vec<T> from the wrapper
    K: Fn(&T) -> String,                 // Map key for an item
{
    let mut map = HashMap::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let file_wrapper: F = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

            for item in extract_vec(file_wrapper) {
                let key = get_key(&item);
                if map.insert(key.clone(), item).is_some() {
                    warn!(%key, file = ?path, "duplicate knowledge-base entry replaced");
                }
            }
        }
    }
    Ok(map)
}
