//! Overview tab: monthly actual vs predicted, severity mix, variance trend.

use serde::Serialize;

use super::{by_label, rollup, Tally};
use crate::claims::ClaimRecord;
use crate::filter::Band;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySettlement {
    pub month: String,
    /// Mean final settlement
    pub actual: f64,
    /// Mean predicted pain and suffering
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityBucket {
    pub name: String,
    pub band: Band,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyVariance {
    pub month: String,
    pub avg_variance: f64,
    pub count: usize,
}

/// Headline numbers for the filtered slice. All zero on empty input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    pub total_claims: usize,
    pub avg_settlement: f64,
    pub avg_predicted: f64,
    pub avg_variance: f64,
    pub avg_days_to_settlement: f64,
    pub underprediction_rate: f64,
}

pub fn monthly_settlements(records: &[ClaimRecord]) -> Vec<MonthlySettlement> {
    rollup(
        records,
        |c| c.month().to_string(),
        Tally::absorb,
        |month, t: Tally| MonthlySettlement {
            month,
            actual: t.avg_settlement(),
            predicted: t.avg_predicted(),
        },
        by_label(|r: &MonthlySettlement| r.month.as_str()),
        None,
    )
}

/// Fixed three-bucket histogram; every band is emitted even at zero.
pub fn severity_distribution(records: &[ClaimRecord]) -> Vec<SeverityBucket> {
    let counts = records.iter().fold([0usize; 3], |mut acc, c| {
        acc[Band::for_severity(c.severity) as usize] += 1;
        acc
    });
    Band::ALL
        .iter()
        .map(|band| SeverityBucket {
            name: band.severity_label().to_string(),
            band: *band,
            value: counts[*band as usize],
        })
        .collect()
}

pub fn monthly_variance(records: &[ClaimRecord]) -> Vec<MonthlyVariance> {
    rollup(
        records,
        |c| c.month().to_string(),
        Tally::absorb,
        |month, t: Tally| MonthlyVariance {
            month,
            avg_variance: t.avg_abs_variance(),
            count: t.count,
        },
        by_label(|r: &MonthlyVariance| r.month.as_str()),
        None,
    )
}

pub fn overview_summary(records: &[ClaimRecord]) -> OverviewSummary {
    let t = Tally::from_records(records);
    OverviewSummary {
        total_claims: t.count,
        avg_settlement: t.avg_settlement(),
        avg_predicted: t.avg_predicted(),
        avg_variance: t.avg_abs_variance(),
        avg_days_to_settlement: t.avg_days_to_settlement(),
        underprediction_rate: t.underprediction_rate(),
    }
}
