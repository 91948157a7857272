use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::privacy::suppression::SuppressionResult;
use crate::privacy::tenure::TenureBucket;
use crate::types::{AggregationLevel, Result};

/// Immutable record that the cascade ran on a slice and what it decided.
///
/// Only the decision is kept; an entry never carries anything that would
/// help reconstruct a suppressed value beyond the count the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionAuditEntry {
    timestamp: DateTime<Utc>,
    district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenure: Option<TenureBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    n: u64,
    suppressed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_applied: Option<String>,
    aggregation_level: AggregationLevel,
}

impl SuppressionAuditEntry {
    /// Build an entry stamped with the current time
    pub fn record(
        district: &str,
        tenure: Option<TenureBucket>,
        subject: Option<&str>,
        n: u64,
        result: &SuppressionResult,
    ) -> Self {
        Self::record_at(district, tenure, subject, n, result, Utc::now())
    }

    pub fn record_at(
        district: &str,
        tenure: Option<TenureBucket>,
        subject: Option<&str>,
        n: u64,
        result: &SuppressionResult,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            district: district.to_string(),
            tenure,
            subject: subject.map(str::to_string),
            n,
            suppressed: result.is_suppressed(),
            rule_applied: result.rule_applied().map(str::to_string),
            aggregation_level: result.aggregation_level(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn tenure(&self) -> Option<TenureBucket> {
        self.tenure
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn rule_applied(&self) -> Option<&str> {
        self.rule_applied.as_deref()
    }

    pub fn aggregation_level(&self) -> AggregationLevel {
        self.aggregation_level
    }
}

/// Append-only sink for audit entries
pub trait AuditRepository {
    fn append(&mut self, entry: &SuppressionAuditEntry) -> Result<()>;
}

/// Vec-backed repository, mainly for tests and batch runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Vec<SuppressionAuditEntry>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SuppressionAuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AuditRepository for InMemoryAuditLog {
    fn append(&mut self, entry: &SuppressionAuditEntry) -> Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

/// Writes one JSON object per line to any writer
#[derive(Debug)]
pub struct JsonLinesAuditWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesAuditWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> AuditRepository for JsonLinesAuditWriter<W> {
    fn append(&mut self, entry: &SuppressionAuditEntry) -> Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
