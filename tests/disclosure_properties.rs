use proptest::prelude::*;
use sdc_engine::privacy::{
    apply_bucketing, bucket_of, validate, GatingThreshold, Submission, SuppressionEngine,
    TenureBucket,
};
use sdc_engine::types::MIN_CELL_SIZE;
use sdc_engine::{AggregationLevel, LadderCounts};

fn tenure_strategy() -> impl Strategy<Value = Option<TenureBucket>> {
    prop_oneof![
        Just(None),
        Just(Some(TenureBucket::Early)),
        Just(Some(TenureBucket::Mid)),
        Just(Some(TenureBucket::Senior)),
    ]
}

fn subject_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[A-Z][a-z]{2,10}".prop_map(Some)]
}

// ── Tenure bucketing ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_non_negative_year_lands_in_a_canonical_bucket(years in 0i64..200) {
        let bucket = bucket_of(years).unwrap();
        prop_assert!(TenureBucket::ALL.contains(&bucket));
        prop_assert!(years >= bucket.lower_bound() as i64);
        if let Some(upper) = bucket.upper_bound() {
            prop_assert!(years <= upper as i64);
        }
    }

    #[test]
    fn negative_years_are_rejected(years in i64::MIN..0) {
        prop_assert!(bucket_of(years).is_err());
    }

    #[test]
    fn bucketing_never_keeps_exact_years(years in 0i64..80, stored in proptest::option::of(0i64..80)) {
        let mut submission = Submission::new("Calgary", Some("Math"));
        submission.years_experience = stored;
        let bucketed = apply_bucketing(submission, Some(years)).unwrap();
        prop_assert_eq!(bucketed.years_experience, None);
        prop_assert!(validate(&bucketed).is_empty());
    }
}

// ── Suppression cascade ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn cells_at_or_above_threshold_publish_in_full(
        n in 20i64..100_000,
        tenure in tenure_strategy(),
        subject in subject_strategy(),
    ) {
        let result = SuppressionEngine::default()
            .evaluate("Calgary", tenure, subject.as_deref(), n)
            .unwrap();
        prop_assert!(!result.is_suppressed());
        prop_assert_eq!(result.aggregation_level(), AggregationLevel::Full);
        prop_assert_eq!(result.rule_applied(), None);
    }

    #[test]
    fn cells_below_threshold_follow_precedence(
        n in 0i64..20,
        tenure in tenure_strategy(),
        subject in subject_strategy(),
    ) {
        let result = SuppressionEngine::default()
            .evaluate("Calgary", tenure, subject.as_deref(), n)
            .unwrap();
        prop_assert!(result.is_suppressed());
        let (level, rule) = match (tenure.is_some(), subject.is_some()) {
            (true, true) => (AggregationLevel::DistrictTenure, "rule2"),
            (true, false) => (AggregationLevel::DistrictOnly, "rule3"),
            (false, true) => (AggregationLevel::DistrictOnly, "rule3s"),
            (false, false) => (AggregationLevel::None, "rule4"),
        };
        prop_assert_eq!(result.aggregation_level(), level);
        prop_assert_eq!(result.rule_applied(), Some(rule));
        prop_assert_eq!(result.min_required(), MIN_CELL_SIZE);
    }

    #[test]
    fn evaluate_is_idempotent(
        n in 0i64..200,
        tenure in tenure_strategy(),
        subject in subject_strategy(),
    ) {
        let engine = SuppressionEngine::default();
        let first = engine.evaluate("Lethbridge", tenure, subject.as_deref(), n).unwrap();
        let second = engine.evaluate("Lethbridge", tenure, subject.as_deref(), n).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn gating_agrees_with_district_rule(n in 0u64..100) {
        let gate = GatingThreshold::default();
        let result = SuppressionEngine::default()
            .evaluate("Calgary", None, None, n as i64)
            .unwrap();
        prop_assert_eq!(gate.meets(n), !result.is_suppressed());
    }

    #[test]
    fn ladder_never_publishes_finer_than_allowed(
        district_only in 0u64..200,
        tenure_share in 0u64..=100,
        subject_share in 0u64..=100,
    ) {
        let district_tenure = district_only * tenure_share / 100;
        let district_tenure_subject = district_tenure * subject_share / 100;
        let counts = LadderCounts { district_only, district_tenure, district_tenure_subject };

        let ladder = SuppressionEngine::default()
            .check_all_aggregation_levels("Calgary", &counts)
            .unwrap();

        // Monotone counts mean a publishable fine rung implies publishable ancestors
        if !ladder.district_tenure_subject.is_suppressed() {
            prop_assert!(!ladder.district_tenure.is_suppressed());
        }
        if !ladder.district_tenure.is_suppressed() {
            prop_assert!(!ladder.district_only.is_suppressed());
        }
    }
}
