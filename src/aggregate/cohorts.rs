//! Injury and adjuster tabs: one row per cohort with its headline means.

use serde::Serialize;

use super::{ascending, descending, rollup, Tally};
use crate::claims::ClaimRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryProfile {
    pub name: String,
    pub count: usize,
    pub avg_settlement: f64,
    pub avg_predicted: f64,
    pub avg_variance: f64,
    pub avg_severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjusterScore {
    pub name: String,
    pub count: usize,
    pub avg_variance: f64,
    pub avg_settlement: f64,
    pub avg_days_to_settlement: f64,
}

/// Injury groups by claim volume.
pub fn injury_profiles(records: &[ClaimRecord]) -> Vec<InjuryProfile> {
    rollup(
        records,
        |c| c.injury_group.clone(),
        Tally::absorb,
        |name, t: Tally| InjuryProfile {
            name,
            count: t.count,
            avg_settlement: t.avg_settlement(),
            avg_predicted: t.avg_predicted(),
            avg_variance: t.avg_abs_variance(),
            avg_severity: t.avg_severity(),
        },
        descending(|r: &InjuryProfile| r.count as f64),
        None,
    )
}

/// All adjusters, closest to the model first.
pub fn adjuster_scorecard(records: &[ClaimRecord]) -> Vec<AdjusterScore> {
    rollup(
        records,
        |c| c.adjuster.clone(),
        Tally::absorb,
        |name, t: Tally| AdjusterScore {
            name,
            count: t.count,
            avg_variance: t.avg_abs_variance(),
            avg_settlement: t.avg_settlement(),
            avg_days_to_settlement: t.avg_days_to_settlement(),
        },
        ascending(|r: &AdjusterScore| r.avg_variance),
        None,
    )
}
