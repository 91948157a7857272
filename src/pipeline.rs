use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::audit::{AuditRepository, SuppressionAuditEntry};
use crate::config::DisclosureConfig;
use crate::methodology::MethodologyRecord;
use crate::privacy::gating::{ensure_consistent, GatingThreshold};
use crate::privacy::noise::{sanity_check, LaplaceNoiser, NoiseParams, SanityCheck};
use crate::privacy::suppression::{explain, SuppressionEngine, SuppressionResult};
use crate::privacy::tenure::TenureBucket;
use crate::types::{AggregationCell, AggregationLevel, Result};

/// A cell after the full disclosure pipeline.
///
/// `result` and `audit` hold the true count for internal use. Serializing a
/// `PublishedCell` goes through [`PublishedView`], which carries only the
/// noisy count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "PublishedView")]
pub struct PublishedCell {
    pub result: SuppressionResult,
    /// Present only when the cell cleared suppression
    pub noisy_count: Option<f64>,
    pub sanity: Option<SanityCheck>,
    pub audit: SuppressionAuditEntry,
}

impl PublishedCell {
    /// Text for an interactive view of the cell
    pub fn display_text(&self) -> String {
        match self.noisy_count {
            Some(count) => format!("Showing approximately {} responses.", count.round()),
            None => format!("Insufficient data for privacy: {}", explain(&self.result)),
        }
    }

    /// What rendering and export code may show or write out
    pub fn export_view(&self) -> PublishedView {
        let text = match self.noisy_count {
            Some(count) => format!("Showing approximately {} responses.", count.round()),
            None => format!(
                "Insufficient data for privacy: fewer than {} responses.",
                self.result.min_required()
            ),
        };
        PublishedView {
            district: self.audit.district().to_string(),
            tenure: self.audit.tenure(),
            subject: self.audit.subject().map(str::to_string),
            suppressed: self.result.is_suppressed(),
            aggregation_level: self.result.aggregation_level(),
            rule_applied: self.result.rule_applied().map(str::to_string),
            noisy_count: self.noisy_count,
            display_text: text,
        }
    }
}

/// Export form of a [`PublishedCell`]; never holds the true count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedView {
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure: Option<TenureBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub suppressed: bool,
    pub aggregation_level: AggregationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_applied: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noisy_count: Option<f64>,
    pub display_text: String,
}

impl From<PublishedCell> for PublishedView {
    fn from(cell: PublishedCell) -> Self {
        cell.export_view()
    }
}

/// Cascade, noise and audit wired from one config
pub struct DisclosureEngine<R: Rng, A: AuditRepository> {
    config: DisclosureConfig,
    suppression: SuppressionEngine,
    gating: GatingThreshold,
    noiser: LaplaceNoiser<R>,
    audit: A,
}

impl<A: AuditRepository> DisclosureEngine<StdRng, A> {
    /// Engine with an entropy-seeded noise source
    pub fn with_entropy(config: DisclosureConfig, audit: A) -> Result<Self> {
        Self::new(config, StdRng::from_entropy(), audit)
    }
}

impl<R: Rng, A: AuditRepository> DisclosureEngine<R, A> {
    /// The noiser is built from `config`, so the disclosed and the applied
    /// noise parameters are the same values.
    pub fn new(config: DisclosureConfig, rng: R, audit: A) -> Result<Self> {
        let suppression = SuppressionEngine::new(&config)?;
        let gating = GatingThreshold::from_config(&config)?;
        ensure_consistent(&suppression, &gating)?;
        let noiser = LaplaceNoiser::new(NoiseParams::from_config(&config)?, rng);

        Ok(Self {
            config,
            suppression,
            gating,
            noiser,
            audit,
        })
    }

    pub fn config(&self) -> &DisclosureConfig {
        &self.config
    }

    pub fn suppression(&self) -> &SuppressionEngine {
        &self.suppression
    }

    pub fn gating(&self) -> &GatingThreshold {
        &self.gating
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Parameters the noise is actually drawn with
    pub fn noise_params(&self) -> &NoiseParams {
        self.noiser.params()
    }

    pub fn methodology(&self) -> Result<MethodologyRecord> {
        MethodologyRecord::from_config(&self.config)
    }

    /// Run one cell through cascade, noise and audit
    pub fn publish(&mut self, cell: &AggregationCell) -> Result<PublishedCell> {
        let n = i64::try_from(cell.n).map_err(|_| {
            crate::error::Error::InvalidInput(format!("Respondent count too large: {}", cell.n))
        })?;
        let result = self.suppression.evaluate(
            &cell.district,
            cell.tenure,
            cell.subject.as_deref(),
            n,
        )?;

        let (noisy_count, sanity) = if result.is_suppressed() {
            (None, None)
        } else {
            let noisy = self.noiser.add_noise(cell.n);
            let check = sanity_check(
                cell.n,
                noisy,
                self.noiser.params().epsilon(),
                self.config.max_noise_deviation,
            );
            (Some(noisy), Some(check))
        };

        let audit = SuppressionAuditEntry::record(
            &cell.district,
            cell.tenure,
            cell.subject.as_deref(),
            cell.n,
            &result,
        );
        self.audit.append(&audit)?;

        Ok(PublishedCell {
            result,
            noisy_count,
            sanity,
            audit,
        })
    }

    pub fn into_audit(self) -> A {
        self.audit
    }
}
