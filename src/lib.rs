//! Statistical disclosure control for aggregated survey counts.
//!
//! Decides whether a (district, tenure, subject) slice may be published,
//! rolled up to a coarser slice, or withheld; coarsens tenure irreversibly;
//! adds Laplace noise to published counts; and records every decision for
//! audit. Counts come from an external aggregation query and audit entries
//! go to an external [`audit::AuditRepository`].

pub mod audit;
pub mod config;
pub mod error;
pub mod methodology;
pub mod pipeline;
pub mod privacy;
pub mod types;

pub use audit::{AuditRepository, InMemoryAuditLog, JsonLinesAuditWriter, SuppressionAuditEntry};
pub use config::DisclosureConfig;
pub use error::Error;
pub use methodology::MethodologyRecord;
pub use pipeline::{DisclosureEngine, PublishedCell, PublishedView};
pub use types::{AggregationCell, AggregationLevel, Granularity, LadderCounts, Result};
