use serde::{Deserialize, Serialize};
use tracing::debug;

use super::identifiers::{check_district, check_subject};
use super::tenure::TenureBucket;
use crate::config::DisclosureConfig;
use crate::error::Error;
use crate::types::{AggregationLevel, Granularity, LadderCounts, Result};

/// Rules in precedence order, finest granularity first
const PRECEDENCE: [Granularity; 4] = [
    Granularity::DistrictTenureSubject,
    Granularity::DistrictTenure,
    Granularity::DistrictSubject,
    Granularity::DistrictOnly,
];

/// What to do with a cell that falls below the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Lock the district; nothing is shown
    Suppress,
    /// Publish the coarser ancestor cell instead
    AggregateTo(AggregationLevel),
}

impl RuleAction {
    fn level(&self) -> AggregationLevel {
        match self {
            RuleAction::Suppress => AggregationLevel::None,
            RuleAction::AggregateTo(level) => *level,
        }
    }
}

/// One entry of the suppression cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressionRule {
    pub id: &'static str,
    pub description: &'static str,
    pub granularity: Granularity,
    pub action: RuleAction,
    pub target_threshold: u64,
}

impl SuppressionRule {
    fn for_granularity(granularity: Granularity, target_threshold: u64) -> Self {
        let (id, description, action) = match granularity {
            Granularity::DistrictTenureSubject => (
                "rule2",
                "District + tenure + subject below threshold; fall back to district + tenure",
                RuleAction::AggregateTo(AggregationLevel::DistrictTenure),
            ),
            Granularity::DistrictTenure => (
                "rule3",
                "District + tenure below threshold; fall back to district only",
                RuleAction::AggregateTo(AggregationLevel::DistrictOnly),
            ),
            Granularity::DistrictSubject => (
                "rule3s",
                "District + subject below threshold; fall back to district only",
                RuleAction::AggregateTo(AggregationLevel::DistrictOnly),
            ),
            Granularity::DistrictOnly => (
                "rule4",
                "District below threshold; district locked",
                RuleAction::Suppress,
            ),
        };
        Self {
            id,
            description,
            granularity,
            action,
            target_threshold,
        }
    }

    pub fn applies(&self, granularity: Granularity, n: u64) -> bool {
        self.granularity == granularity && n < self.target_threshold
    }
}

/// Outcome of running the cascade on one cell.
///
/// Built only by [`SuppressionEngine`]; fields are read through accessors so a
/// decision cannot be rewritten after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionResult {
    is_suppressed: bool,
    aggregation_level: AggregationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_applied: Option<String>,
    n: u64,
    min_required: u64,
    message: String,
}

impl SuppressionResult {
    pub fn is_suppressed(&self) -> bool {
        self.is_suppressed
    }

    pub fn aggregation_level(&self) -> AggregationLevel {
        self.aggregation_level
    }

    pub fn rule_applied(&self) -> Option<&str> {
        self.rule_applied.as_deref()
    }

    /// True respondent count; never exported next to a noisy count
    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn min_required(&self) -> u64 {
        self.min_required
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The k-anonymity suppression cascade
#[derive(Debug, Clone)]
pub struct SuppressionEngine {
    min_cell_size: u64,
    rules: Vec<SuppressionRule>,
}

impl SuppressionEngine {
    pub fn new(config: &DisclosureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_threshold(config.min_cell_size))
    }

    fn with_threshold(min_cell_size: u64) -> Self {
        let rules = PRECEDENCE
            .iter()
            .map(|&granularity| SuppressionRule::for_granularity(granularity, min_cell_size))
            .collect();
        Self {
            min_cell_size,
            rules,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.min_cell_size
    }

    /// The rule table in precedence order
    pub fn rules(&self) -> &[SuppressionRule] {
        &self.rules
    }

    /// Decide how a requested slice may be published
    pub fn evaluate(
        &self,
        district: &str,
        tenure: Option<TenureBucket>,
        subject: Option<&str>,
        n: i64,
    ) -> Result<SuppressionResult> {
        check_district(district)?;
        if let Some(subject) = subject {
            check_subject(subject)?;
        }
        if n < 0 {
            return Err(Error::InvalidInput(format!(
                "Respondent count cannot be negative: {}",
                n
            )));
        }

        let granularity = Granularity::from_presence(tenure.is_some(), subject.is_some());
        let result = self.evaluate_at(granularity, n as u64);
        debug!(
            district,
            tenure = tenure.map(|t| t.label()),
            subject,
            n,
            suppressed = result.is_suppressed(),
            rule = result.rule_applied(),
            "suppression cascade evaluated"
        );
        Ok(result)
    }

    /// Run the cascade for an already-validated granularity
    pub fn evaluate_at(&self, granularity: Granularity, n: u64) -> SuppressionResult {
        match self.rules.iter().find(|rule| rule.applies(granularity, n)) {
            Some(rule) => SuppressionResult {
                is_suppressed: true,
                aggregation_level: rule.action.level(),
                rule_applied: Some(rule.id.to_string()),
                n,
                min_required: self.min_cell_size,
                message: rule.description.to_string(),
            },
            None => SuppressionResult {
                is_suppressed: false,
                aggregation_level: AggregationLevel::Full,
                rule_applied: None,
                n,
                min_required: self.min_cell_size,
                message: format!("At least {} responses; published in full", self.min_cell_size),
            },
        }
    }

    /// Evaluate every rung of a district's ladder in one call
    pub fn check_all_aggregation_levels(
        &self,
        district: &str,
        counts: &LadderCounts,
    ) -> Result<LadderResults> {
        check_district(district)?;
        counts.validate()?;

        Ok(LadderResults {
            district_only: self.evaluate_at(Granularity::DistrictOnly, counts.district_only),
            district_tenure: self.evaluate_at(Granularity::DistrictTenure, counts.district_tenure),
            district_tenure_subject: self.evaluate_at(
                Granularity::DistrictTenureSubject,
                counts.district_tenure_subject,
            ),
        })
    }
}

impl Default for SuppressionEngine {
    fn default() -> Self {
        Self::with_threshold(DisclosureConfig::default().min_cell_size)
    }
}

/// Results for each rung of a district's cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderResults {
    pub district_only: SuppressionResult,
    pub district_tenure: SuppressionResult,
    pub district_tenure_subject: SuppressionResult,
}

impl LadderResults {
    /// Most detailed rung that may be published as-is
    pub fn richest_publishable(&self) -> Option<Granularity> {
        if !self.district_tenure_subject.is_suppressed() {
            Some(Granularity::DistrictTenureSubject)
        } else if !self.district_tenure.is_suppressed() {
            Some(Granularity::DistrictTenure)
        } else if !self.district_only.is_suppressed() {
            Some(Granularity::DistrictOnly)
        } else {
            None
        }
    }
}

/// Human-readable explanation of a result
pub fn explain(result: &SuppressionResult) -> String {
    if result.is_suppressed() {
        let needed = result.min_required().saturating_sub(result.n());
        let noun = if needed == 1 { "response" } else { "responses" };
        match result.aggregation_level() {
            AggregationLevel::None => format!(
                "{} of {} required responses. {} more {} needed before this district can be shown.",
                result.n(), result.min_required(), needed, noun
            ),
            _ => format!(
                "{} of {} required responses. {} more {} needed to unlock the next level of detail.",
                result.n(), result.min_required(), needed, noun
            ),
        }
    } else {
        format!("Showing {} responses.", result.n())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SuppressionEngine {
        SuppressionEngine::default()
    }

    #[test]
    fn test_full_slice_below_threshold() {
        let result = engine()
            .evaluate("Edmonton", Some(TenureBucket::Early), Some("Math"), 12)
            .unwrap();
        assert!(result.is_suppressed());
        assert_eq!(result.aggregation_level(), AggregationLevel::DistrictTenure);
        assert_eq!(result.rule_applied(), Some("rule2"));
        assert_eq!(result.min_required(), 20);
        assert_eq!(result.n(), 12);
    }

    #[test]
    fn test_district_tenure_below_threshold() {
        let result = engine()
            .evaluate("Calgary", Some(TenureBucket::Mid), None, 15)
            .unwrap();
        assert!(result.is_suppressed());
        assert_eq!(result.aggregation_level(), AggregationLevel::DistrictOnly);
        assert_eq!(result.rule_applied(), Some("rule3"));
    }

    #[test]
    fn test_district_subject_below_threshold() {
        let result = engine().evaluate("Calgary", None, Some("Science"), 7).unwrap();
        assert!(result.is_suppressed());
        assert_eq!(result.aggregation_level(), AggregationLevel::DistrictOnly);
        assert_eq!(result.rule_applied(), Some("rule3s"));
    }

    #[test]
    fn test_district_only_locked() {
        let result = engine().evaluate("Red Deer", None, None, 19).unwrap();
        assert!(result.is_suppressed());
        assert_eq!(result.aggregation_level(), AggregationLevel::None);
        assert_eq!(result.rule_applied(), Some("rule4"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let result = engine().evaluate("Red Deer", None, None, 20).unwrap();
        assert!(!result.is_suppressed());
        assert_eq!(result.aggregation_level(), AggregationLevel::Full);
        assert_eq!(result.rule_applied(), None);
    }

    #[test]
    fn test_publishable_at_every_granularity() {
        let e = engine();
        for (tenure, subject) in [
            (None, None),
            (Some(TenureBucket::Senior), None),
            (None, Some("Math")),
            (Some(TenureBucket::Senior), Some("Math")),
        ] {
            let result = e.evaluate("Calgary", tenure, subject, 40).unwrap();
            assert!(!result.is_suppressed());
            assert_eq!(result.aggregation_level(), AggregationLevel::Full);
        }
    }

    #[test]
    fn test_zero_count_is_suppressed() {
        let result = engine().evaluate("Calgary", None, None, 0).unwrap();
        assert!(result.is_suppressed());
    }

    #[test]
    fn test_negative_count_rejected() {
        let result = engine().evaluate("Calgary", None, None, -1);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_malformed_identifiers_rejected() {
        assert!(engine().evaluate("", None, None, 30).is_err());
        assert!(engine().evaluate("Calgary", None, Some("  "), 30).is_err());
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let e = engine();
        let a = e.evaluate("Calgary", Some(TenureBucket::Early), Some("Math"), 5).unwrap();
        let b = e.evaluate("Calgary", Some(TenureBucket::Early), Some("Math"), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rule_table_order() {
        let ids: Vec<_> = engine().rules().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["rule2", "rule3", "rule3s", "rule4"]);
        assert!(engine().rules().iter().all(|r| r.target_threshold == 20));
    }

    #[test]
    fn test_custom_threshold() {
        let config = DisclosureConfig {
            min_cell_size: 10,
            ..DisclosureConfig::default()
        };
        let e = SuppressionEngine::new(&config).unwrap();
        assert!(!e.evaluate("Calgary", None, None, 10).unwrap().is_suppressed());
        assert!(e.evaluate("Calgary", None, None, 9).unwrap().is_suppressed());
    }

    #[test]
    fn test_ladder_scenario() {
        let counts = LadderCounts {
            district_only: 25,
            district_tenure: 15,
            district_tenure_subject: 5,
        };
        let ladder = engine().check_all_aggregation_levels("Calgary", &counts).unwrap();

        assert_eq!(ladder.district_tenure_subject.rule_applied(), Some("rule2"));
        assert_eq!(
            ladder.district_tenure_subject.aggregation_level(),
            AggregationLevel::DistrictTenure
        );
        assert_eq!(ladder.district_tenure.rule_applied(), Some("rule3"));
        assert_eq!(ladder.district_tenure.aggregation_level(), AggregationLevel::DistrictOnly);
        assert!(!ladder.district_only.is_suppressed());
        assert_eq!(ladder.richest_publishable(), Some(Granularity::DistrictOnly));
    }

    #[test]
    fn test_ladder_fully_locked() {
        let counts = LadderCounts {
            district_only: 8,
            district_tenure: 4,
            district_tenure_subject: 1,
        };
        let ladder = engine().check_all_aggregation_levels("Calgary", &counts).unwrap();
        assert_eq!(ladder.district_only.aggregation_level(), AggregationLevel::None);
        assert_eq!(ladder.richest_publishable(), None);
    }

    #[test]
    fn test_ladder_rejects_non_monotonic_counts() {
        let counts = LadderCounts {
            district_only: 10,
            district_tenure: 30,
            district_tenure_subject: 5,
        };
        assert!(engine().check_all_aggregation_levels("Calgary", &counts).is_err());
    }

    #[test]
    fn test_explain_suppressed() {
        let result = engine().evaluate("Calgary", Some(TenureBucket::Mid), None, 15).unwrap();
        let text = explain(&result);
        assert!(text.contains("5 more responses"));
        assert!(text.contains("next level of detail"));
    }

    #[test]
    fn test_explain_locked_singular() {
        let result = engine().evaluate("Calgary", None, None, 19).unwrap();
        assert!(explain(&result).contains("1 more response needed"));
    }

    #[test]
    fn test_explain_published() {
        let result = engine().evaluate("Calgary", None, None, 42).unwrap();
        assert_eq!(explain(&result), "Showing 42 responses.");
    }

    #[test]
    fn test_message_names_rule() {
        let result = engine().evaluate("Calgary", None, None, 3).unwrap();
        assert!(result.message().contains("district locked"));
    }
}
