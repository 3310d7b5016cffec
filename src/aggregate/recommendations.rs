//! Recommendations tab: where the model struggles, and who handles it best.

use serde::Serialize;

use super::{ascending, descending, rollup, Tally};
use crate::claims::ClaimRecord;

pub const DEFAULT_TOP_FEATURES: usize = 5;
pub const DEFAULT_TOP_ADJUSTERS: usize = 5;

/// Mean absolute variance for one named group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupVariance {
    pub name: String,
    pub avg_variance: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyPerformance {
    pub name: String,
    pub avg_variance: f64,
    pub avg_settlement: f64,
    pub count: usize,
}

fn group_variance(name: String, t: Tally) -> GroupVariance {
    GroupVariance {
        name,
        avg_variance: t.avg_abs_variance(),
        count: t.count,
    }
}

/// Injury groups with the highest mean absolute variance.
pub fn top_variance_features(records: &[ClaimRecord], limit: usize) -> Vec<GroupVariance> {
    rollup(
        records,
        |c| c.injury_group.clone(),
        Tally::absorb,
        group_variance,
        descending(|r: &GroupVariance| r.avg_variance),
        Some(limit),
    )
}

/// Adjusters with the lowest mean absolute variance on the selected injury
/// group. No selection yields no recommendations.
pub fn recommend_adjusters(
    records: &[ClaimRecord],
    selected_feature: Option<&str>,
    limit: usize,
) -> Vec<GroupVariance> {
    let Some(feature) = selected_feature else {
        return Vec::new();
    };
    let matching: Vec<ClaimRecord> = records
        .iter()
        .filter(|c| c.injury_group == feature)
        .cloned()
        .collect();
    rollup(
        &matching,
        |c| c.adjuster.clone(),
        Tally::absorb,
        group_variance,
        ascending(|r: &GroupVariance| r.avg_variance),
        Some(limit),
    )
}

/// Every county, worst mean absolute variance first.
pub fn county_performance(records: &[ClaimRecord]) -> Vec<CountyPerformance> {
    rollup(
        records,
        |c| c.county.clone(),
        Tally::absorb,
        |name, t: Tally| CountyPerformance {
            name,
            avg_variance: t.avg_abs_variance(),
            avg_settlement: t.avg_settlement(),
            count: t.count,
        },
        descending(|r: &CountyPerformance| r.avg_variance),
        None,
    )
}
