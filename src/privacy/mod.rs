pub mod gating;
pub mod identifiers;
pub mod noise;
pub mod suppression;
pub mod tenure;

pub use gating::{ensure_consistent, GatingThreshold};
pub use identifiers::{check_district, check_subject};
pub use noise::{methodology_text, sanity_check, LaplaceNoiser, NoiseParams, SanityCheck};
pub use suppression::{explain, LadderResults, SuppressionEngine, SuppressionResult, SuppressionRule};
pub use tenure::{apply_bucketing, bucket_of, validate, BucketWidth, Submission, TenureBucket, TenureViolation};
