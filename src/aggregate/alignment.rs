//! Alignment tab: per-county prediction bias.
//!
//! A county is `Liberal` when juries there settle well above the model
//! (positive signed variance, mostly underpredicted) and `Conservative` in
//! the opposite case. Thresholds live in [`TendencyPolicy`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{descending, rollup, Tally};
use crate::claims::ClaimRecord;

pub const DEFAULT_HIGH_VARIANCE_PCT: f64 = 20.0;
pub const DEFAULT_HIGH_VARIANCE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tendency {
    /// Model underpredicts
    Liberal,
    /// Model overpredicts
    Conservative,
    Neutral,
}

impl Tendency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tendency::Liberal => "Liberal",
            Tendency::Conservative => "Conservative",
            Tendency::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Tendency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification thresholds. All rates and variances are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TendencyPolicy {
    /// |mean signed variance| must exceed this (strictly)
    pub variance_threshold: f64,
    /// Underprediction rate above which a county can be Liberal
    pub liberal_rate: f64,
    /// Underprediction rate below which a county can be Conservative
    pub conservative_rate: f64,
    /// Share of the observed bias proposed as a prediction adjustment
    pub damping: f64,
}

impl Default for TendencyPolicy {
    fn default() -> Self {
        Self {
            variance_threshold: 10.0,
            liberal_rate: 55.0,
            conservative_rate: 45.0,
            damping: 0.8,
        }
    }
}

impl TendencyPolicy {
    /// Rules are checked in order: Liberal, Conservative, else Neutral.
    pub fn classify(&self, mean_signed_variance: f64, underprediction_rate: f64) -> Tendency {
        if mean_signed_variance > self.variance_threshold
            && underprediction_rate > self.liberal_rate
        {
            Tendency::Liberal
        } else if mean_signed_variance < -self.variance_threshold
            && underprediction_rate < self.conservative_rate
        {
            Tendency::Conservative
        } else {
            Tendency::Neutral
        }
    }

    /// Proposed prediction adjustment in whole percentage points.
    pub fn adjustment_pct(&self, mean_signed_variance: f64) -> i64 {
        (self.damping * mean_signed_variance.abs()).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyTendency {
    pub name: String,
    /// Mean signed variance
    pub avg_variance: f64,
    pub avg_abs_variance: f64,
    pub count: usize,
    pub avg_settlement: f64,
    pub avg_severity: f64,
    pub avg_caution: f64,
    /// Percent of claims with positive variance
    pub underprediction_rate: f64,
    pub tendency: Tendency,
    pub adjustment_pct: i64,
    pub insight: String,
}

pub fn insight_text(county: &str, tendency: Tendency, adjustment_pct: i64) -> String {
    match tendency {
        Tendency::Liberal => format!(
            "{} settles above prediction; raise predictions by about {}%",
            county, adjustment_pct
        ),
        Tendency::Conservative => format!(
            "{} settles below prediction; lower predictions by about {}%",
            county, adjustment_pct
        ),
        Tendency::Neutral => format!("{} is well calibrated; no adjustment needed", county),
    }
}

/// Every county, classified and sorted by mean absolute variance descending.
pub fn county_tendencies(records: &[ClaimRecord], policy: &TendencyPolicy) -> Vec<CountyTendency> {
    rollup(
        records,
        |c| c.county.clone(),
        Tally::absorb,
        |name, t: Tally| {
            let signed = t.avg_signed_variance();
            let rate = t.underprediction_rate();
            let tendency = policy.classify(signed, rate);
            let adjustment_pct = policy.adjustment_pct(signed);
            CountyTendency {
                insight: insight_text(&name, tendency, adjustment_pct),
                name,
                avg_variance: signed,
                avg_abs_variance: t.avg_abs_variance(),
                count: t.count,
                avg_settlement: t.avg_settlement(),
                avg_severity: t.avg_severity(),
                avg_caution: t.avg_caution(),
                underprediction_rate: rate,
                tendency,
                adjustment_pct,
            }
        },
        descending(|r: &CountyTendency| r.avg_abs_variance),
        None,
    )
}

/// Counties whose mean absolute variance exceeds `threshold`, keeping the
/// input order (already worst first), capped at `limit`.
pub fn high_variance_counties(
    tendencies: &[CountyTendency],
    threshold: f64,
    limit: usize,
) -> Vec<CountyTendency> {
    tendencies
        .iter()
        .filter(|c| c.avg_abs_variance > threshold)
        .take(limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::fixtures::{claim, with_variance};

    #[test]
    fn test_cook_scenario_is_neutral() {
        let records = vec![
            ClaimRecord {
                variance_pct: 20.0,
                ..claim("Cook", "2024-01-01", 10_000.0, 8_333.3)
            },
            ClaimRecord {
                variance_pct: -5.0,
                ..claim("Cook", "2024-01-02", 9_500.0, 10_000.0)
            },
        ];
        let rows = county_tendencies(&records, &TendencyPolicy::default());
        assert_eq!(rows.len(), 1);
        let cook = &rows[0];
        assert_eq!(cook.name, "Cook");
        assert!((cook.avg_variance - 7.5).abs() < 1e-9);
        assert!((cook.underprediction_rate - 50.0).abs() < 1e-9);
        assert_eq!(cook.count, 2);
        assert_eq!(cook.tendency, Tendency::Neutral);
        assert_eq!(cook.adjustment_pct, 6);
    }

    #[test]
    fn test_classification_boundaries() {
        let p = TendencyPolicy::default();
        assert_eq!(p.classify(10.0, 100.0), Tendency::Neutral);
        assert_eq!(p.classify(15.0, 60.0), Tendency::Liberal);
        assert_eq!(p.classify(15.0, 55.0), Tendency::Neutral);
        assert_eq!(p.classify(-10.0, 0.0), Tendency::Neutral);
        assert_eq!(p.classify(-12.0, 40.0), Tendency::Conservative);
        assert_eq!(p.classify(-12.0, 45.0), Tendency::Neutral);
    }

    #[test]
    fn test_synthetic_liberal_county() {
        // signed mean 15, 3 of 5 underpredicted = 60%
        let records: Vec<ClaimRecord> = [40.0, 30.0, 20.0, -5.0, -10.0]
            .iter()
            .map(|v| with_variance("Harris", *v))
            .collect();
        let rows = county_tendencies(&records, &TendencyPolicy::default());
        assert!((rows[0].avg_variance - 15.0).abs() < 1e-9);
        assert!((rows[0].underprediction_rate - 60.0).abs() < 1e-9);
        assert_eq!(rows[0].tendency, Tendency::Liberal);
        assert_eq!(rows[0].adjustment_pct, 12);
        assert!(rows[0].insight.contains("raise predictions by about 12%"));
    }

    #[test]
    fn test_conservative_county_and_sorting() {
        let mut records: Vec<ClaimRecord> = [-30.0, -20.0, 5.0]
            .iter()
            .map(|v| with_variance("King", *v))
            .collect();
        records.push(with_variance("Dallas", 2.0));
        let rows = county_tendencies(&records, &TendencyPolicy::default());
        assert_eq!(rows[0].name, "King");
        assert_eq!(rows[0].tendency, Tendency::Conservative);
        assert_eq!(rows[1].name, "Dallas");
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), records.len());
    }

    #[test]
    fn test_high_variance_filter() {
        let records: Vec<ClaimRecord> = (0..14)
            .map(|i| with_variance(&format!("County{}", i), 15.0 + i as f64))
            .collect();
        let rows = county_tendencies(&records, &TendencyPolicy::default());
        let high = high_variance_counties(
            &rows,
            DEFAULT_HIGH_VARIANCE_PCT,
            DEFAULT_HIGH_VARIANCE_LIMIT,
        );
        // 21..=28 exceed 20 strictly; 20 itself does not
        assert_eq!(high.len(), 8);
        assert_eq!(high[0].name, "County13");
        assert!(high.iter().all(|c| c.avg_abs_variance > 20.0));
    }

    #[test]
    fn test_empty_input() {
        let rows = county_tendencies(&[], &TendencyPolicy::default());
        assert!(rows.is_empty());
        assert!(high_variance_counties(&rows, 20.0, 10).is_empty());
    }
}
