use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::DisclosureConfig;
use crate::privacy::noise::{self, NoiseParams, MECHANISM};
use crate::types::{Result, METHODOLOGY_VERSION, TENURE_EARLY_MAX, TENURE_MID_MAX};

/// The constants a set of published numbers was computed under.
///
/// Stamped into snapshots so a later reader can tell whether two snapshots
/// are comparable. The fingerprint changes whenever any constant changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyRecord {
    pub version: String,
    pub mechanism: String,
    pub epsilon: f64,
    pub sensitivity: f64,
    pub min_cell_size: u64,
    pub tenure_boundaries: [u32; 2],
    /// Noisy counts are clamped at zero
    pub zero_clamped: bool,
    pub fingerprint: String,
}

/// Fields covered by the fingerprint, in a fixed order
#[derive(Serialize)]
struct FingerprintInput<'a> {
    version: &'a str,
    mechanism: &'a str,
    epsilon: f64,
    sensitivity: f64,
    min_cell_size: u64,
    tenure_boundaries: [u32; 2],
    zero_clamped: bool,
}

impl MethodologyRecord {
    pub fn from_config(config: &DisclosureConfig) -> Result<Self> {
        let params = NoiseParams::from_config(config)?;
        let input = FingerprintInput {
            version: METHODOLOGY_VERSION,
            mechanism: MECHANISM,
            epsilon: params.epsilon(),
            sensitivity: params.sensitivity(),
            min_cell_size: config.min_cell_size,
            tenure_boundaries: [TENURE_EARLY_MAX, TENURE_MID_MAX],
            zero_clamped: true,
        };
        let fingerprint = compute_fingerprint(&input)?;

        Ok(Self {
            version: input.version.to_string(),
            mechanism: input.mechanism.to_string(),
            epsilon: input.epsilon,
            sensitivity: input.sensitivity,
            min_cell_size: input.min_cell_size,
            tenure_boundaries: input.tenure_boundaries,
            zero_clamped: input.zero_clamped,
            fingerprint,
        })
    }

    /// Full public disclosure covering suppression, bucketing and noise
    pub fn disclosure_text(&self) -> Result<String> {
        let params = NoiseParams::new(self.epsilon, self.sensitivity)?;
        Ok(format!(
            "Methodology v{}. Results are shown only for groups of at least {} respondents; \
             smaller groups are combined into a broader group or withheld. \
             Years of experience are reported only as 0-{}, {}-{} and {}+ years. {}",
            self.version,
            self.min_cell_size,
            self.tenure_boundaries[0],
            self.tenure_boundaries[0] + 1,
            self.tenure_boundaries[1],
            self.tenure_boundaries[1] + 1,
            noise::methodology_text(&params)
        ))
    }
}

/// SHA-256 of the canonical JSON encoding
fn compute_fingerprint(input: &FingerprintInput<'_>) -> Result<String> {
    let canonical = serde_json::to_vec(input)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("{:x}", hasher.finalize()))
}
