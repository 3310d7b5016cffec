use std::str::FromStr;

use anyhow::Result;

use crate::aggregate::alignment::{
    TendencyPolicy, DEFAULT_HIGH_VARIANCE_LIMIT, DEFAULT_HIGH_VARIANCE_PCT,
};
use crate::aggregate::recommendations::{DEFAULT_TOP_ADJUSTERS, DEFAULT_TOP_FEATURES};
use crate::aggregate::venue::{
    RegionalMetric, DEFAULT_HEATMAP_LIMIT, DEFAULT_REGIONAL_STATES, DEFAULT_RISK_SETTLEMENT_SCALE,
};
use crate::claims::ClaimRecord;
use crate::dashboard::{Dashboard, DashboardRequest};
use crate::filter::{apply_filters, distinct_counties, distinct_years, FilterCriteria, FilterDimension};
use crate::logging::log_filter_update;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub dataset_path: String,
    pub top_features: usize,
    pub top_adjusters: usize,
    /// Mean absolute variance (%) above which a county is flagged
    pub high_variance_pct: f64,
    pub high_variance_limit: usize,
    pub heatmap_limit: usize,
    pub regional_states: usize,
    pub tendency: TendencyPolicy,
    /// Divisor applied to mean settlement in the venue risk score
    pub risk_settlement_scale: f64,
    pub synth_seed: u64,
    pub synth_claims: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: "data/claims.csv".to_string(),
            top_features: DEFAULT_TOP_FEATURES,
            top_adjusters: DEFAULT_TOP_ADJUSTERS,
            high_variance_pct: DEFAULT_HIGH_VARIANCE_PCT,
            high_variance_limit: DEFAULT_HIGH_VARIANCE_LIMIT,
            heatmap_limit: DEFAULT_HEATMAP_LIMIT,
            regional_states: DEFAULT_REGIONAL_STATES,
            tendency: TendencyPolicy::default(),
            risk_settlement_scale: DEFAULT_RISK_SETTLEMENT_SCALE,
            synth_seed: 42,
            synth_claims: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            dataset_path: std::env::var("CLAIMS_CSV").unwrap_or(d.dataset_path),
            top_features: env_or("TOP_FEATURES", d.top_features),
            top_adjusters: env_or("TOP_ADJUSTERS", d.top_adjusters),
            high_variance_pct: env_or("HIGH_VARIANCE_PCT", d.high_variance_pct),
            high_variance_limit: env_or("HIGH_VARIANCE_LIMIT", d.high_variance_limit),
            heatmap_limit: env_or("HEATMAP_LIMIT", d.heatmap_limit),
            regional_states: env_or("REGIONAL_STATES", d.regional_states),
            tendency: TendencyPolicy {
                variance_threshold: env_or("TENDENCY_VARIANCE_PCT", d.tendency.variance_threshold),
                liberal_rate: env_or("LIBERAL_RATE_PCT", d.tendency.liberal_rate),
                conservative_rate: env_or("CONSERVATIVE_RATE_PCT", d.tendency.conservative_rate),
                damping: env_or("INSIGHT_DAMPING", d.tendency.damping),
            },
            risk_settlement_scale: env_or("RISK_SETTLEMENT_SCALE", d.risk_settlement_scale),
            synth_seed: env_or("SYNTH_SEED", d.synth_seed),
            synth_claims: env_or("SYNTH_CLAIMS", d.synth_claims),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// One user's view of a loaded dataset: header filters, the selected
/// injury-group feature and the regional metric toggle.
///
/// Records never change after load; the filtered slice is recomputed on
/// every filter update.
#[derive(Debug, Clone)]
pub struct Session {
    records: Vec<ClaimRecord>,
    criteria: FilterCriteria,
    filtered: Vec<ClaimRecord>,
    selected_feature: Option<String>,
    regional_metric: RegionalMetric,
}

impl Session {
    pub fn new(records: Vec<ClaimRecord>) -> Self {
        let filtered = records.clone();
        Self {
            records,
            criteria: FilterCriteria::default(),
            filtered,
            selected_feature: None,
            regional_metric: RegionalMetric::default(),
        }
    }

    pub fn records(&self) -> &[ClaimRecord] {
        &self.records
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filtered(&self) -> &[ClaimRecord] {
        &self.filtered
    }

    pub fn selected_feature(&self) -> Option<&str> {
        self.selected_feature.as_deref()
    }

    pub fn regional_metric(&self) -> RegionalMetric {
        self.regional_metric
    }

    /// Header update by string key, e.g. `("county", "Cook")`.
    pub fn update_filter(&mut self, key: &str, value: &str) -> Result<()> {
        self.criteria.update(key, value)?;
        self.refilter();
        log_filter_update(key, value, self.filtered.len(), self.records.len());
        Ok(())
    }

    pub fn set_filter(&mut self, dim: FilterDimension, value: &str) {
        self.criteria.set(dim, value);
        self.refilter();
        log_filter_update(dim.as_str(), value, self.filtered.len(), self.records.len());
    }

    pub fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.refilter();
    }

    /// An empty or blank feature clears the selection.
    pub fn select_feature(&mut self, feature: Option<&str>) {
        self.selected_feature = feature
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
    }

    pub fn set_regional_metric(&mut self, metric: RegionalMetric) {
        self.regional_metric = metric;
    }

    /// County selector options; drawn from the full dataset.
    pub fn counties(&self) -> Vec<String> {
        distinct_counties(&self.records)
    }

    pub fn years(&self) -> Vec<String> {
        distinct_years(&self.records)
    }

    pub fn request(&self) -> DashboardRequest {
        DashboardRequest {
            criteria: self.criteria.clone(),
            selected_feature: self.selected_feature.clone(),
            regional_metric: self.regional_metric,
        }
    }

    pub fn dashboard(&self, cfg: &Config) -> Dashboard {
        Dashboard::from_filtered(&self.filtered, &self.request(), cfg)
    }

    fn refilter(&mut self) {
        self.filtered = apply_filters(&self.records, &self.criteria);
    }
}
