//! Property tests over generated claim sets.

use claimiq::aggregate::alignment::{county_tendencies, TendencyPolicy};
use claimiq::aggregate::overview::severity_distribution;
use claimiq::aggregate::recommendations::{recommend_adjusters, top_variance_features};
use claimiq::aggregate::{tally_by, Tally};
use claimiq::claims::{variance_pct, ClaimRecord, VARIANCE_REL_TOL};
use claimiq::filter::{apply_filters, Band, FilterCriteria, FilterDimension};
use proptest::prelude::*;

const COUNTIES: [&str; 4] = ["Cook", "Harris", "King", "Bexar"];
const GROUPS: [&str; 3] = ["Group_NB", "Group_JFL", "Group_ARM"];
const ADJUSTERS: [&str; 3] = ["Emily Chen", "Mike Johnson", "Lisa Anderson"];
const RATINGS: [&str; 4] = ["moderate", "conservative", "liberal", "extreme"];

prop_compose! {
    fn claim_strategy()(
        county in 0..COUNTIES.len(),
        group in 0..GROUPS.len(),
        adjuster in 0..ADJUSTERS.len(),
        rating in 0..RATINGS.len(),
        year in 2023u32..=2025,
        month in 1u32..=12,
        severity in 1u32..=15,
        caution in 0u32..=10,
        impact in 0i64..=4,
        settlement in 2_000.0f64..152_000.0,
        ratio in 0.7f64..1.3,
    ) -> ClaimRecord {
        let predicted = settlement * ratio;
        ClaimRecord {
            claim_id: format!("CLM-{}-{}", county, month),
            claim_date: format!("{}-{:02}-15", year, month),
            days_to_settlement: 60,
            county: COUNTIES[county].to_string(),
            state: "TX".to_string(),
            injury_group: GROUPS[group].to_string(),
            severity: severity as f64,
            caution_score: caution as f64,
            venue_rating: RATINGS[rating].to_string(),
            impact_life: impact,
            final_settlement: settlement,
            predicted_pain_suffering: predicted,
            variance_pct: variance_pct(settlement, predicted),
            adjuster: ADJUSTERS[adjuster].to_string(),
            ..Default::default()
        }
    }
}

fn records_strategy() -> impl Strategy<Value = Vec<ClaimRecord>> {
    prop::collection::vec(claim_strategy(), 0..60)
}

fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
    (
        prop::option::of(0..COUNTIES.len()),
        prop::option::of(prop_oneof![Just("low"), Just("Medium"), Just("high")]),
        prop::option::of(prop_oneof![Just("low"), Just("medium"), Just("HIGH")]),
        prop::option::of(0i64..=4),
        prop::option::of(prop_oneof![Just("2023"), Just("2024"), Just("2025")]),
    )
        .prop_map(|(county, severity, caution, impact, year)| {
            let mut c = FilterCriteria::new();
            if let Some(i) = county {
                c.set(FilterDimension::County, COUNTIES[i]);
            }
            if let Some(s) = severity {
                c.set(FilterDimension::Severity, s);
            }
            if let Some(s) = caution {
                c.set(FilterDimension::Caution, s);
            }
            if let Some(i) = impact {
                c.set(FilterDimension::ImpactLife, &i.to_string());
            }
            if let Some(y) = year {
                c.set(FilterDimension::Year, y);
            }
            c
        })
}

proptest! {
    #[test]
    fn filter_is_idempotent(records in records_strategy(), criteria in criteria_strategy()) {
        let once = apply_filters(&records, &criteria);
        let twice = apply_filters(&once, &criteria);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn adding_a_restriction_never_grows(
        records in records_strategy(),
        criteria in criteria_strategy(),
        group in 0..GROUPS.len(),
    ) {
        let before = apply_filters(&records, &criteria).len();
        let narrowed = criteria.clone().with(FilterDimension::InjuryGroup, GROUPS[group]);
        prop_assert!(apply_filters(&records, &narrowed).len() <= before);
    }

    #[test]
    fn filter_output_is_ordered_subsequence(records in records_strategy(), criteria in criteria_strategy()) {
        let out = apply_filters(&records, &criteria);
        let mut it = records.iter();
        for kept in &out {
            prop_assert!(it.any(|r| r == kept));
        }
    }

    #[test]
    fn severity_bands_partition(s in 1u32..=15) {
        let s = s as f64;
        let hits = Band::ALL
            .iter()
            .filter(|b| **b == Band::for_severity(s))
            .count();
        prop_assert_eq!(hits, 1);
    }

    #[test]
    fn caution_bands_partition_with_filters(c in 0u32..=10) {
        let record = ClaimRecord { caution_score: c as f64, ..Default::default() };
        let passing = Band::ALL
            .iter()
            .filter(|b| {
                let criteria = FilterCriteria::new().with(FilterDimension::Caution, b.as_str());
                criteria.matches(&record)
            })
            .count();
        prop_assert_eq!(passing, 1);
    }

    #[test]
    fn grouping_conserves_counts(records in records_strategy()) {
        let n = records.len();
        prop_assert_eq!(tally_by(&records, |c| c.county.clone()).total_count(), n);
        prop_assert_eq!(tally_by(&records, |c| c.month().to_string()).total_count(), n);
        prop_assert_eq!(
            severity_distribution(&records).iter().map(|b| b.value).sum::<usize>(),
            n
        );
        prop_assert_eq!(
            county_tendencies(&records, &TendencyPolicy::default())
                .iter()
                .map(|c| c.count)
                .sum::<usize>(),
            n
        );
        prop_assert_eq!(Tally::from_records(&records).count, n);
    }

    #[test]
    fn rankings_are_sorted(records in records_strategy(), group in 0..GROUPS.len()) {
        let features = top_variance_features(&records, 5);
        prop_assert!(features.len() <= 5);
        prop_assert!(features.windows(2).all(|w| w[0].avg_variance >= w[1].avg_variance));

        let adjusters = recommend_adjusters(&records, Some(GROUPS[group]), 5);
        prop_assert!(adjusters.windows(2).all(|w| w[0].avg_variance <= w[1].avg_variance));
        prop_assert!(recommend_adjusters(&records, None, 5).is_empty());
    }

    #[test]
    fn generated_variance_is_consistent(record in claim_strategy()) {
        prop_assert!(record.is_variance_consistent(VARIANCE_REL_TOL));
    }
}
