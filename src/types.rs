use serde::{Deserialize, Serialize};

use crate::privacy::tenure::TenureBucket;

/// Minimum respondents a published cell must represent
pub const MIN_CELL_SIZE: u64 = 20;

/// Default privacy loss parameter for published counts
pub const DEFAULT_EPSILON: f64 = 1.0;

/// A single respondent changes any count by at most one
pub const DEFAULT_SENSITIVITY: f64 = 1.0;

/// Noise beyond `max_deviation / epsilon` is flagged as a pipeline bug
pub const DEFAULT_MAX_NOISE_DEVIATION: f64 = 5.0;

/// Highest exact tenure (years) that falls in the `0-5 years` bucket
pub const TENURE_EARLY_MAX: u32 = 5;

/// Highest exact tenure (years) that falls in the `6-15 years` bucket
pub const TENURE_MID_MAX: u32 = 15;

/// Methodology version; bump whenever any constant above changes
pub const METHODOLOGY_VERSION: &str = "1.0.0";

/// How much detail a cell is published at after the cascade ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationLevel {
    /// Published at the requested granularity
    Full,
    /// Rolled up to district + tenure
    DistrictTenure,
    /// Rolled up to the district alone
    DistrictOnly,
    /// Locked: nothing below this district may be shown
    None,
}

impl AggregationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationLevel::Full => "full",
            AggregationLevel::DistrictTenure => "district_tenure",
            AggregationLevel::DistrictOnly => "district_only",
            AggregationLevel::None => "none",
        }
    }
}

/// Which identifying dimensions a requested slice carries.
///
/// District is always present. Every match on this enum is exhaustive so a
/// new dimension forces each call site to decide its own fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    DistrictOnly,
    DistrictSubject,
    DistrictTenure,
    DistrictTenureSubject,
}

impl Granularity {
    /// Derive the granularity from which optional dimensions are present
    pub fn from_presence(has_tenure: bool, has_subject: bool) -> Self {
        match (has_tenure, has_subject) {
            (true, true) => Granularity::DistrictTenureSubject,
            (true, false) => Granularity::DistrictTenure,
            (false, true) => Granularity::DistrictSubject,
            (false, false) => Granularity::DistrictOnly,
        }
    }

    /// Number of identifying dimensions, district included
    pub fn dimensions(&self) -> usize {
        match self {
            Granularity::DistrictOnly => 1,
            Granularity::DistrictSubject | Granularity::DistrictTenure => 2,
            Granularity::DistrictTenureSubject => 3,
        }
    }
}

/// A (district, tenure?, subject?) slice with its respondent count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationCell {
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure: Option<TenureBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub n: u64,
}

impl AggregationCell {
    pub fn new(district: &str, tenure: Option<TenureBucket>, subject: Option<&str>, n: u64) -> Self {
        Self {
            district: district.to_string(),
            tenure,
            subject: subject.map(str::to_string),
            n,
        }
    }

    pub fn granularity(&self) -> Granularity {
        Granularity::from_presence(self.tenure.is_some(), self.subject.is_some())
    }
}

/// Counts for one district at every rung of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderCounts {
    pub district_only: u64,
    pub district_tenure: u64,
    pub district_tenure_subject: u64,
}

impl LadderCounts {
    /// Finer cells can never hold more respondents than their ancestors
    pub fn validate(&self) -> Result<()> {
        if self.district_tenure > self.district_only {
            return Err(crate::error::Error::InvalidInput(format!(
                "district+tenure count {} exceeds district count {}",
                self.district_tenure, self.district_only
            )));
        }
        if self.district_tenure_subject > self.district_tenure {
            return Err(crate::error::Error::InvalidInput(format!(
                "district+tenure+subject count {} exceeds district+tenure count {}",
                self.district_tenure_subject, self.district_tenure
            )));
        }
        Ok(())
    }
}

/// Result type for the engine
pub type Result<T> = std::result::Result<T, crate::error::Error>;
