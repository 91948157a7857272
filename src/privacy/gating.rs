use crate::config::DisclosureConfig;
use crate::error::Error;
use crate::types::Result;

use super::suppression::SuppressionEngine;

/// Single-dimension `n >= k` check for presentation code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatingThreshold {
    min_cell_size: u64,
}

impl GatingThreshold {
    pub fn from_config(config: &DisclosureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            min_cell_size: config.min_cell_size,
        })
    }

    pub fn threshold(&self) -> u64 {
        self.min_cell_size
    }

    pub fn meets(&self, n: u64) -> bool {
        n >= self.min_cell_size
    }

    pub fn message(&self, n: u64) -> String {
        match n {
            0 => format!(
                "No submissions yet. Need at least {} to display results.",
                self.min_cell_size
            ),
            n if n < self.min_cell_size => format!(
                "{} submissions so far, {} more needed to display results.",
                n,
                self.min_cell_size - n
            ),
            n => format!("Privacy threshold met ({} submissions).", n),
        }
    }
}

impl Default for GatingThreshold {
    fn default() -> Self {
        Self {
            min_cell_size: DisclosureConfig::default().min_cell_size,
        }
    }
}

/// Fail if the gating check and the suppression engine disagree on k
pub fn ensure_consistent(engine: &SuppressionEngine, gating: &GatingThreshold) -> Result<()> {
    if engine.threshold() != gating.threshold() {
        return Err(Error::ConfigurationDrift {
            engine: engine.threshold(),
            gating: gating.threshold(),
        });
    }
    Ok(())
}
