use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProspectConfig {
    pub brand_name: String,
    pub industry_category: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProspectsFile {
    pub prospects: Vec<ProspectConfig>,
}

/// Load and validate the prospect seed list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_prospects(path: &Path) -> Result<ProspectsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProspectsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let prospects_file: ProspectsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ProspectsFileParse)?;

    validate_prospects(&prospects_file)?;

    Ok(prospects_file)
}

fn validate_prospects(prospects_file: &ProspectsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for prospect in &prospects_file.prospects {
        let name = prospect.brand_name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "brand_name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand_name: '{}'",
                prospect.brand_name
            )));
        }
    }

    Ok(())
}
