//! Filter engine: restricts the full record set to the slice selected in
//! the dashboard header.
//!
//! Every dimension is either unrestricted (`None`) or narrows the set; a
//! record passes only when all active dimensions pass. Unknown values never
//! error: equality dimensions simply match nothing, and band dimensions
//! fall back to unrestricted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::claims::ClaimRecord;
use crate::logging::{log, obj, v_str, Domain, Level};

/// Sentinel meaning "no restriction" for any dimension.
pub const ALL: &str = "all";

// =============================================================================
// Bands
// =============================================================================

/// Contiguous range bucket over severity or caution.
///
/// Severity: low <= 5 < medium <= 10 < high.
/// Caution:  low <= 3 < medium <= 7  < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Low, Band::Medium, Band::High];

    pub fn for_severity(severity: f64) -> Band {
        if severity <= 5.0 {
            Band::Low
        } else if severity <= 10.0 {
            Band::Medium
        } else {
            Band::High
        }
    }

    pub fn for_caution(caution: f64) -> Band {
        if caution <= 3.0 {
            Band::Low
        } else if caution <= 7.0 {
            Band::Medium
        } else {
            Band::High
        }
    }

    /// Case-insensitive band name; `None` for anything unrecognized.
    pub fn parse(value: &str) -> Option<Band> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Band::Low),
            "medium" => Some(Band::Medium),
            "high" => Some(Band::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Low => "low",
            Band::Medium => "medium",
            Band::High => "high",
        }
    }

    /// Histogram label over the observed 1..=15 severity range.
    pub fn severity_label(&self) -> &'static str {
        match self {
            Band::Low => "Low (1-5)",
            Band::Medium => "Medium (6-10)",
            Band::High => "High (11-15)",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Dimensions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    InjuryGroup,
    County,
    Severity,
    Caution,
    VenueRating,
    ImpactLife,
    Year,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 7] = [
        FilterDimension::InjuryGroup,
        FilterDimension::County,
        FilterDimension::Severity,
        FilterDimension::Caution,
        FilterDimension::VenueRating,
        FilterDimension::ImpactLife,
        FilterDimension::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterDimension::InjuryGroup => "injuryGroup",
            FilterDimension::County => "county",
            FilterDimension::Severity => "severity",
            FilterDimension::Caution => "caution",
            FilterDimension::VenueRating => "venueRating",
            FilterDimension::ImpactLife => "impactLife",
            FilterDimension::Year => "year",
        }
    }
}

impl FromStr for FilterDimension {
    type Err = anyhow::Error;

    /// Accepts the normalized keys plus the legacy header keys.
    fn from_str(key: &str) -> Result<Self> {
        let dim = match key.trim() {
            "injuryGroup" | "injury_group" | "injuryGroupCode" => FilterDimension::InjuryGroup,
            "county" => FilterDimension::County,
            "severity" | "severityScore" => FilterDimension::Severity,
            "caution" | "cautionLevel" => FilterDimension::Caution,
            "venueRating" | "venue_rating" => FilterDimension::VenueRating,
            "impactLife" | "impact_life" | "impact" => FilterDimension::ImpactLife,
            "year" => FilterDimension::Year,
            other => return Err(anyhow!("unknown filter dimension: {:?}", other)),
        };
        Ok(dim)
    }
}

// =============================================================================
// Criteria
// =============================================================================

/// Current header selection. `None` on a dimension means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub injury_group: Option<String>,
    pub county: Option<String>,
    pub severity: Option<Band>,
    pub caution: Option<Band>,
    pub venue_rating: Option<String>,
    /// Kept as entered; compared after integer parsing.
    pub impact_life: Option<String>,
    pub year: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterCriteria::set`].
    pub fn with(mut self, dim: FilterDimension, value: &str) -> Self {
        self.set(dim, value);
        self
    }

    /// Update one dimension from its string key, as the header does.
    pub fn update(&mut self, key: &str, value: &str) -> Result<()> {
        let dim: FilterDimension = key.parse()?;
        self.set(dim, value);
        Ok(())
    }

    pub fn set(&mut self, dim: FilterDimension, value: &str) {
        let value = value.trim();
        let selected = if is_all(value) {
            None
        } else {
            Some(value.to_string())
        };
        match dim {
            FilterDimension::InjuryGroup => self.injury_group = selected,
            FilterDimension::County => self.county = selected,
            FilterDimension::VenueRating => self.venue_rating = selected,
            FilterDimension::ImpactLife => self.impact_life = selected,
            FilterDimension::Year => self.year = selected,
            FilterDimension::Severity => self.severity = parse_band(dim, selected),
            FilterDimension::Caution => self.caution = parse_band(dim, selected),
        }
    }

    /// True when no dimension restricts anything.
    pub fn is_unrestricted(&self) -> bool {
        *self == FilterCriteria::default()
    }

    pub fn matches(&self, claim: &ClaimRecord) -> bool {
        if let Some(group) = &self.injury_group {
            if claim.injury_group != *group {
                return false;
            }
        }
        if let Some(county) = &self.county {
            if claim.county != *county {
                return false;
            }
        }
        if let Some(rating) = &self.venue_rating {
            if claim.venue_rating != *rating {
                return false;
            }
        }
        if let Some(impact) = &self.impact_life {
            match impact.parse::<i64>() {
                Ok(level) if level == claim.impact_life => {}
                _ => return false,
            }
        }
        if let Some(year) = &self.year {
            if !claim.claim_date.starts_with(year.as_str()) {
                return false;
            }
        }
        if let Some(band) = self.severity {
            if Band::for_severity(claim.severity) != band {
                return false;
            }
        }
        if let Some(band) = self.caution {
            if Band::for_caution(claim.caution_score) != band {
                return false;
            }
        }
        true
    }
}

fn is_all(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

fn parse_band(dim: FilterDimension, selected: Option<String>) -> Option<Band> {
    let raw = selected?;
    let band = Band::parse(&raw);
    if band.is_none() {
        log(
            Level::Warn,
            Domain::Filter,
            "unrecognized_band",
            obj(&[
                ("dimension", v_str(dim.as_str())),
                ("value", v_str(&raw)),
                ("msg", v_str("treating as all")),
            ]),
        );
    }
    band
}

// =============================================================================
// Application
// =============================================================================

/// Order-preserving subsequence of `records` that passes `criteria`.
pub fn apply_filters(records: &[ClaimRecord], criteria: &FilterCriteria) -> Vec<ClaimRecord> {
    if criteria.is_unrestricted() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|claim| criteria.matches(claim))
        .cloned()
        .collect()
}

/// Sorted distinct counties, for the county selector.
pub fn distinct_counties(records: &[ClaimRecord]) -> Vec<String> {
    records
        .iter()
        .map(|c| c.county.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted distinct claim years (empty dates are skipped).
pub fn distinct_years(records: &[ClaimRecord]) -> Vec<String> {
    records
        .iter()
        .map(|c| c.year())
        .filter(|y| !y.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::fixtures::claim;

    fn sample() -> Vec<ClaimRecord> {
        let mut a = claim("Cook", "2023-05-01", 10_000.0, 9_000.0);
        a.severity = 3.0;
        a.caution_score = 8.0;
        a.impact_life = 2;
        a.injury_group = "Group_NB".into();
        let mut b = claim("Harris", "2024-02-11", 5_000.0, 6_000.0);
        b.severity = 7.0;
        b.caution_score = 4.0;
        b.impact_life = 0;
        b.venue_rating = "liberal".into();
        b.injury_group = "Group_JFL".into();
        let mut c = claim("Cook", "2024-09-30", 20_000.0, 15_000.0);
        c.severity = 13.0;
        c.caution_score = 0.0;
        c.impact_life = 4;
        vec![a, b, c]
    }

    #[test]
    fn test_unrestricted_returns_everything() {
        let records = sample();
        let out = apply_filters(&records, &FilterCriteria::new());
        assert_eq!(out, records);
    }

    #[test]
    fn test_equality_dimensions() {
        let records = sample();
        let f = FilterCriteria::new().with(FilterDimension::County, "Cook");
        let out = apply_filters(&records, &f);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.county == "Cook"));

        let f = FilterCriteria::new().with(FilterDimension::VenueRating, "liberal");
        assert_eq!(apply_filters(&records, &f).len(), 1);

        let f = FilterCriteria::new().with(FilterDimension::InjuryGroup, "Group_JFL");
        assert_eq!(apply_filters(&records, &f)[0].county, "Harris");
    }

    #[test]
    fn test_unmatched_value_excludes_all() {
        let records = sample();
        let f = FilterCriteria::new().with(FilterDimension::County, "Atlantis");
        assert!(apply_filters(&records, &f).is_empty());
        let f = FilterCriteria::new().with(FilterDimension::ImpactLife, "lots");
        assert!(apply_filters(&records, &f).is_empty());
    }

    #[test]
    fn test_year_is_prefix_match() {
        let records = sample();
        let f = FilterCriteria::new().with(FilterDimension::Year, "2024");
        assert_eq!(apply_filters(&records, &f).len(), 2);
    }

    #[test]
    fn test_impact_parsed_as_integer() {
        let records = sample();
        let f = FilterCriteria::new().with(FilterDimension::ImpactLife, "4");
        let out = apply_filters(&records, &f);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].impact_life, 4);
    }

    #[test]
    fn test_band_filters() {
        let records = sample();
        for (band, expected) in [("low", 3.0), ("medium", 7.0), ("high", 13.0)] {
            let f = FilterCriteria::new().with(FilterDimension::Severity, band);
            let out = apply_filters(&records, &f);
            assert_eq!(out.len(), 1, "severity band {}", band);
            assert_eq!(out[0].severity, expected);
        }
        let f = FilterCriteria::new().with(FilterDimension::Caution, "High");
        let out = apply_filters(&records, &f);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].caution_score, 8.0);
    }

    #[test]
    fn test_unrecognized_band_is_unrestricted() {
        let records = sample();
        let f = FilterCriteria::new().with(FilterDimension::Severity, "extreme");
        assert_eq!(f.severity, None);
        assert_eq!(apply_filters(&records, &f).len(), records.len());
    }

    #[test]
    fn test_band_boundaries_partition() {
        for s in 1..=15 {
            let hits = Band::ALL
                .iter()
                .filter(|b| Band::for_severity(s as f64) == **b)
                .count();
            assert_eq!(hits, 1);
        }
        assert_eq!(Band::for_severity(5.0), Band::Low);
        assert_eq!(Band::for_severity(6.0), Band::Medium);
        assert_eq!(Band::for_severity(10.0), Band::Medium);
        assert_eq!(Band::for_severity(11.0), Band::High);
        assert_eq!(Band::for_caution(3.0), Band::Low);
        assert_eq!(Band::for_caution(4.0), Band::Medium);
        assert_eq!(Band::for_caution(7.0), Band::Medium);
        assert_eq!(Band::for_caution(8.0), Band::High);
    }

    #[test]
    fn test_update_by_key() {
        let mut f = FilterCriteria::new();
        f.update("injuryGroupCode", "Group_NB").unwrap();
        f.update("severityScore", "medium").unwrap();
        f.update("impact", "3").unwrap();
        assert_eq!(f.injury_group.as_deref(), Some("Group_NB"));
        assert_eq!(f.severity, Some(Band::Medium));
        assert_eq!(f.impact_life.as_deref(), Some("3"));

        f.update("injuryGroup", "ALL").unwrap();
        assert_eq!(f.injury_group, None);
        assert!(f.update("colour", "red").is_err());
    }

    #[test]
    fn test_distinct_selectors() {
        let records = sample();
        assert_eq!(distinct_counties(&records), vec!["Cook", "Harris"]);
        assert_eq!(distinct_years(&records), vec!["2023", "2024"]);
    }
}
