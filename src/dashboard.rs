//! Every tab's series for one filtered slice, as one serializable snapshot.
//!
//! Building is pure: the same records and request always produce the same
//! dashboard, so callers may cache by (slice, request).

use serde::Serialize;

use crate::aggregate::alignment::{county_tendencies, high_variance_counties, CountyTendency};
use crate::aggregate::cohorts::{adjuster_scorecard, injury_profiles, AdjusterScore, InjuryProfile};
use crate::aggregate::overview::{
    monthly_settlements, monthly_variance, overview_summary, severity_distribution,
    MonthlySettlement, MonthlyVariance, OverviewSummary, SeverityBucket,
};
use crate::aggregate::recommendations::{
    county_performance, recommend_adjusters, top_variance_features, CountyPerformance,
    GroupVariance,
};
use crate::aggregate::venue::{
    regional_series, state_settlements, state_volume, venue_risk, RegionalMetric, RegionalSeries,
    StateSettlement, StateVolume, VenueRisk,
};
use crate::claims::ClaimRecord;
use crate::filter::{apply_filters, FilterCriteria};
use crate::state::Config;

/// What the user currently has selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    pub criteria: FilterCriteria,
    pub selected_feature: Option<String>,
    pub regional_metric: RegionalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTab {
    pub summary: OverviewSummary,
    pub monthly_settlements: Vec<MonthlySettlement>,
    pub severity: Vec<SeverityBucket>,
    pub variance_trend: Vec<MonthlyVariance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsTab {
    pub features: Vec<GroupVariance>,
    pub selected_feature: Option<String>,
    pub adjusters: Vec<GroupVariance>,
    pub county_performance: Vec<CountyPerformance>,
    pub temporal: Vec<MonthlyVariance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentTab {
    pub counties: Vec<CountyTendency>,
    pub high_variance: Vec<CountyTendency>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueTab {
    pub state_settlements: Vec<StateSettlement>,
    pub state_volume: Vec<StateVolume>,
    pub county_performance: Vec<CountyPerformance>,
    pub regional: RegionalSeries,
    pub risk_heatmap: Vec<VenueRisk>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub request: DashboardRequest,
    pub total_claims: usize,
    pub overview: OverviewTab,
    pub recommendations: RecommendationsTab,
    pub alignment: AlignmentTab,
    pub injury: Vec<InjuryProfile>,
    pub adjuster: Vec<AdjusterScore>,
    pub venue: VenueTab,
}

impl Dashboard {
    /// Filter `records` with the request's criteria, then build.
    pub fn build(records: &[ClaimRecord], request: &DashboardRequest, cfg: &Config) -> Self {
        let filtered = apply_filters(records, &request.criteria);
        Self::from_filtered(&filtered, request, cfg)
    }

    /// Build from an already filtered slice.
    pub fn from_filtered(filtered: &[ClaimRecord], request: &DashboardRequest, cfg: &Config) -> Self {
        let temporal = monthly_variance(filtered);
        let counties = county_performance(filtered);
        let tendencies = county_tendencies(filtered, &cfg.tendency);
        let high_variance =
            high_variance_counties(&tendencies, cfg.high_variance_pct, cfg.high_variance_limit);

        Dashboard {
            request: request.clone(),
            total_claims: filtered.len(),
            overview: OverviewTab {
                summary: overview_summary(filtered),
                monthly_settlements: monthly_settlements(filtered),
                severity: severity_distribution(filtered),
                variance_trend: temporal.clone(),
            },
            recommendations: RecommendationsTab {
                features: top_variance_features(filtered, cfg.top_features),
                selected_feature: request.selected_feature.clone(),
                adjusters: recommend_adjusters(
                    filtered,
                    request.selected_feature.as_deref(),
                    cfg.top_adjusters,
                ),
                county_performance: counties.clone(),
                temporal,
            },
            alignment: AlignmentTab {
                counties: tendencies,
                high_variance,
            },
            injury: injury_profiles(filtered),
            adjuster: adjuster_scorecard(filtered),
            venue: VenueTab {
                state_settlements: state_settlements(filtered),
                state_volume: state_volume(filtered),
                county_performance: counties,
                regional: regional_series(filtered, request.regional_metric, cfg.regional_states),
                risk_heatmap: venue_risk(filtered, cfg.risk_settlement_scale, cfg.heatmap_limit),
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
