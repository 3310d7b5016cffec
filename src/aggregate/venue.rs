//! Venue tab: state-level settlement and volume, regional trends, and a
//! county risk heatmap.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::{by_label, descending, rollup, tally_by, Tally};
use crate::claims::ClaimRecord;

pub const DEFAULT_REGIONAL_STATES: usize = 5;
pub const DEFAULT_HEATMAP_LIMIT: usize = 10;
pub const DEFAULT_RISK_SETTLEMENT_SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSettlement {
    pub name: String,
    pub avg_settlement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVolume {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueRisk {
    pub name: String,
    pub risk_score: f64,
}

/// Which per-cell value the regional series carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionalMetric {
    /// Mean final settlement
    #[default]
    Settlement,
    /// Mean absolute variance
    Variance,
    /// Raw claim count
    Claims,
}

impl RegionalMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionalMetric::Settlement => "settlement",
            RegionalMetric::Variance => "variance",
            RegionalMetric::Claims => "claims",
        }
    }

    fn cell(&self, t: &Tally) -> f64 {
        match self {
            RegionalMetric::Settlement => t.avg_settlement(),
            RegionalMetric::Variance => t.avg_abs_variance(),
            RegionalMetric::Claims => t.count as f64,
        }
    }
}

impl FromStr for RegionalMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "settlement" => Ok(RegionalMetric::Settlement),
            "variance" => Ok(RegionalMetric::Variance),
            "claims" | "volume" => Ok(RegionalMetric::Claims),
            other => Err(anyhow!("unknown regional metric: {:?}", other)),
        }
    }
}

/// Key of the month label in a serialized row; never used as a state column.
const MONTH_KEY: &str = "month";

/// One month of the regional series. States with no claims that month are
/// absent from `values`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalRow {
    pub month: String,
    /// Flattened next to `month`, so a state named `month` is never a key here
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalSeries {
    pub metric: RegionalMetric,
    /// Column order: first appearance in the data
    pub states: Vec<String>,
    pub rows: Vec<RegionalRow>,
}

pub fn state_settlements(records: &[ClaimRecord]) -> Vec<StateSettlement> {
    rollup(
        records,
        |c| c.state.clone(),
        Tally::absorb,
        |name, t: Tally| StateSettlement {
            name,
            avg_settlement: t.avg_settlement(),
        },
        descending(|r: &StateSettlement| r.avg_settlement),
        None,
    )
}

pub fn state_volume(records: &[ClaimRecord]) -> Vec<StateVolume> {
    rollup(
        records,
        |c| c.state.clone(),
        |n: usize, _| n + 1,
        |name, value| StateVolume { name, value },
        descending(|r: &StateVolume| r.value as f64),
        None,
    )
}

/// Month-by-state series over the first `max_states` states to appear.
/// A state literally named `month` is left out of the columns.
pub fn regional_series(
    records: &[ClaimRecord],
    metric: RegionalMetric,
    max_states: usize,
) -> RegionalSeries {
    let states: Vec<String> = tally_by(records, |c| c.state.clone())
        .keys()
        .filter(|s| s.as_str() != MONTH_KEY)
        .take(max_states)
        .cloned()
        .collect();
    let cells = tally_by(records, |c| (c.month().to_string(), c.state.clone()));

    let mut rows = rollup(
        records,
        |c| c.month().to_string(),
        |n: usize, _| n + 1,
        |month, _| RegionalRow {
            month,
            values: BTreeMap::new(),
        },
        by_label(|r: &RegionalRow| r.month.as_str()),
        None,
    );
    for row in rows.iter_mut() {
        for state in &states {
            if let Some(t) = cells.get(&(row.month.clone(), state.clone())) {
                row.values.insert(state.clone(), metric.cell(t));
            }
        }
    }

    RegionalSeries {
        metric,
        states,
        rows,
    }
}

/// risk = mean |variance| * (mean settlement / `settlement_scale`), top `limit`.
pub fn venue_risk(records: &[ClaimRecord], settlement_scale: f64, limit: usize) -> Vec<VenueRisk> {
    rollup(
        records,
        |c| c.county.clone(),
        Tally::absorb,
        |name, t: Tally| VenueRisk {
            name,
            risk_score: t.avg_abs_variance() * (t.avg_settlement() / settlement_scale),
        },
        descending(|r: &VenueRisk| r.risk_score),
        Some(limit),
    )
}
