use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{
    Result, DEFAULT_EPSILON, DEFAULT_MAX_NOISE_DEVIATION, DEFAULT_SENSITIVITY, MIN_CELL_SIZE,
};

/// Disclosure control settings shared by every component.
///
/// The suppression engine and the gating check both read `min_cell_size`
/// from here, so there is exactly one threshold in a running process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisclosureConfig {
    /// Minimum respondents per published cell (k)
    pub min_cell_size: u64,

    /// Privacy loss parameter for the Laplace mechanism
    pub epsilon: f64,

    /// Maximum change one respondent can cause in a count
    pub sensitivity: f64,

    /// Noise sanity bound, in units of the noise scale
    pub max_noise_deviation: f64,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            min_cell_size: MIN_CELL_SIZE,
            epsilon: DEFAULT_EPSILON,
            sensitivity: DEFAULT_SENSITIVITY,
            max_noise_deviation: DEFAULT_MAX_NOISE_DEVIATION,
        }
    }
}

impl DisclosureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_cell_size == 0 {
            return Err(Error::InvalidInput(
                "min_cell_size must be at least 1".to_string(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "sensitivity must be positive and finite, got {}",
                self.sensitivity
            )));
        }
        if !self.max_noise_deviation.is_finite() || self.max_noise_deviation <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "max_noise_deviation must be positive and finite, got {}",
                self.max_noise_deviation
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config; missing keys take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DisclosureConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
