use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Result, TENURE_EARLY_MAX, TENURE_MID_MAX};

/// Coarse replacement for exact years of teaching experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TenureBucket {
    #[serde(rename = "0-5 years")]
    Early,
    #[serde(rename = "6-15 years")]
    Mid,
    #[serde(rename = "16+ years")]
    Senior,
}

/// Width of a tenure bucket in whole years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketWidth {
    Finite(u32),
    /// The top bucket has no upper bound
    Unbounded,
}

impl TenureBucket {
    pub const ALL: [TenureBucket; 3] = [TenureBucket::Early, TenureBucket::Mid, TenureBucket::Senior];

    pub fn label(&self) -> &'static str {
        match self {
            TenureBucket::Early => "0-5 years",
            TenureBucket::Mid => "6-15 years",
            TenureBucket::Senior => "16+ years",
        }
    }

    pub fn lower_bound(&self) -> u32 {
        match self {
            TenureBucket::Early => 0,
            TenureBucket::Mid => TENURE_EARLY_MAX + 1,
            TenureBucket::Senior => TENURE_MID_MAX + 1,
        }
    }

    /// Inclusive upper bound; `None` for the open-ended bucket
    pub fn upper_bound(&self) -> Option<u32> {
        match self {
            TenureBucket::Early => Some(TENURE_EARLY_MAX),
            TenureBucket::Mid => Some(TENURE_MID_MAX),
            TenureBucket::Senior => None,
        }
    }

    /// Number of distinct whole years the bucket covers
    pub fn width(&self) -> BucketWidth {
        match self.upper_bound() {
            Some(upper) => BucketWidth::Finite(upper - self.lower_bound() + 1),
            None => BucketWidth::Unbounded,
        }
    }

    /// Midpoint of the bucket; the open-ended bucket has none
    pub fn midpoint(&self) -> Option<f64> {
        self.upper_bound()
            .map(|upper| (self.lower_bound() as f64 + upper as f64) / 2.0)
    }
}

impl fmt::Display for TenureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TenureBucket {
    type Err = Error;

    /// Only the three canonical labels are accepted
    fn from_str(s: &str) -> Result<Self> {
        TenureBucket::ALL
            .iter()
            .copied()
            .find(|bucket| bucket.label() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Non-canonical tenure bucket: '{}'", s)))
    }
}

/// Map exact years of experience to a bucket
pub fn bucket_of(years: i64) -> Result<TenureBucket> {
    if years < 0 {
        return Err(Error::InvalidInput(format!(
            "Years of experience cannot be negative: {}",
            years
        )));
    }
    Ok(match years {
        y if y <= TENURE_EARLY_MAX as i64 => TenureBucket::Early,
        y if y <= TENURE_MID_MAX as i64 => TenureBucket::Mid,
        _ => TenureBucket::Senior,
    })
}

/// Tenure-related fields of a survey submission as they are stored.
///
/// The bucket is kept as its stored text so that non-canonical values coming
/// back from storage can be reported by [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub district: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Exact years; must be `None` once a bucket is assigned
    pub years_experience: Option<i64>,

    pub tenure_bucket: Option<String>,
}

impl Submission {
    pub fn new(district: &str, subject: Option<&str>) -> Self {
        Self {
            district: district.to_string(),
            subject: subject.map(str::to_string),
            years_experience: None,
            tenure_bucket: None,
        }
    }

    /// Parsed bucket, if present and canonical
    pub fn tenure(&self) -> Option<TenureBucket> {
        self.tenure_bucket.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Replace exact years with a bucket.
///
/// Takes the submission by value and always returns it with
/// `years_experience` cleared. `exact_years` overrides whatever the
/// submission already carries.
pub fn apply_bucketing(mut submission: Submission, exact_years: Option<i64>) -> Result<Submission> {
    let years = exact_years.or(submission.years_experience);
    submission.years_experience = None;
    if let Some(years) = years {
        submission.tenure_bucket = Some(bucket_of(years)?.label().to_string());
    }
    Ok(submission)
}

/// A tenure-related problem in a stored submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenureViolation {
    /// Exact years retained next to a bucket
    BothPresent,
    /// Bucket text is not one of the canonical labels
    NonCanonicalBucket(String),
}

impl fmt::Display for TenureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenureViolation::BothPresent => {
                write!(f, "Exact years of experience stored alongside a tenure bucket")
            }
            TenureViolation::NonCanonicalBucket(value) => {
                write!(f, "Tenure bucket '{}' is not a canonical bucket", value)
            }
        }
    }
}

/// Check a stored submission for tenure violations
pub fn validate(submission: &Submission) -> Vec<TenureViolation> {
    let mut violations = Vec::new();

    if submission.years_experience.is_some() && submission.tenure_bucket.is_some() {
        violations.push(TenureViolation::BothPresent);
    }

    if let Some(ref label) = submission.tenure_bucket {
        if label.parse::<TenureBucket>().is_err() {
            violations.push(TenureViolation::NonCanonicalBucket(label.clone()));
        }
    }

    violations
}
