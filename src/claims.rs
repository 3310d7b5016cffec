//! Claim record model.
//!
//! Records arrive fully typed from the CSV boundary (`crate::data`) or the
//! synthetic generator (`crate::synth`); missing values are already
//! normalized to `0` / `""` by then. Nothing here validates.

use serde::{Deserialize, Serialize};

/// Relative tolerance used when checking a stored variance against the
/// value recomputed from settlement and prediction.
pub const VARIANCE_REL_TOL: f64 = 1e-6;

/// Optional causation/severity factor weights attached to a claim.
///
/// Opaque to the aggregation layer; carried through for export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub causation_probability: f64,
    pub causation_tx_delay: f64,
    pub causation_tx_gaps: f64,
    pub causation_compliance: f64,
    pub severity_allowed_tx_period: f64,
    pub severity_initial_tx: f64,
    pub severity_injections: f64,
    pub severity_objective_findings: f64,
    pub severity_pain_mgmt: f64,
    pub severity_type_tx: f64,
    pub severity_injury_site: f64,
    pub severity_code: f64,
}

/// One insurance claim observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    /// `YYYY-MM-DD`
    pub claim_date: String,
    pub days_to_settlement: u32,
    pub county: String,
    pub state: String,
    pub body_part: String,
    pub primary_injury: String,
    pub injury_group: String,
    /// Observed range 1..=15
    pub severity: f64,
    /// Observed range 0..=10
    pub caution_score: f64,
    pub venue_rating: String,
    /// 0..=4
    pub impact_life: i64,
    pub final_settlement: f64,
    pub predicted_pain_suffering: f64,
    /// (final - predicted) / predicted * 100
    pub variance_pct: f64,
    pub adjuster: String,
    #[serde(default)]
    pub factors: FactorWeights,
}

impl ClaimRecord {
    /// Year-month key (`YYYY-MM`). Short dates are returned whole.
    pub fn month(&self) -> &str {
        prefix(&self.claim_date, 7)
    }

    /// Four character year prefix of the claim date.
    pub fn year(&self) -> &str {
        prefix(&self.claim_date, 4)
    }

    pub fn abs_variance(&self) -> f64 {
        self.variance_pct.abs()
    }

    /// Actual settlement exceeded the model prediction.
    pub fn is_underpredicted(&self) -> bool {
        self.variance_pct > 0.0
    }

    pub fn recomputed_variance_pct(&self) -> f64 {
        variance_pct(self.final_settlement, self.predicted_pain_suffering)
    }

    pub fn is_variance_consistent(&self, rel_tol: f64) -> bool {
        let expected = self.recomputed_variance_pct();
        let scale = expected.abs().max(1.0);
        (self.variance_pct - expected).abs() <= rel_tol * scale
    }
}

/// Signed percentage deviation of `actual` from `predicted`; 0 when there
/// is no prediction to compare against.
pub fn variance_pct(actual: f64, predicted: f64) -> f64 {
    if predicted == 0.0 {
        return 0.0;
    }
    (actual - predicted) / predicted * 100.0
}

fn prefix(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
