//! Aggregation library.
//!
//! Every report is the same pipeline: fold the filtered records into keyed
//! accumulators, project each group into a summary row, sort, truncate.
//! [`fold_groups`] is the fold; [`rollup`] adds projection, ordering and
//! the top-N limit. The per-tab modules are thin configurations of it.
//!
//! Groups exist only for keys observed in the input, so no projection ever
//! divides by a zero count. Group order before sorting is first appearance
//! and sorting is stable, which keeps ties deterministic.

pub mod alignment;
pub mod cohorts;
pub mod overview;
pub mod recommendations;
pub mod venue;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use crate::claims::ClaimRecord;

// =============================================================================
// Accumulator
// =============================================================================

/// Running sums for one group of claims.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    pub count: usize,
    pub settlement: f64,
    pub predicted: f64,
    pub abs_variance: f64,
    pub signed_variance: f64,
    pub severity: f64,
    pub caution: f64,
    pub days_to_settlement: f64,
    /// Claims whose actual settlement exceeded the prediction.
    pub underpredicted: usize,
}

impl Tally {
    /// Fold step: returns the tally with `claim` added.
    pub fn absorb(self, claim: &ClaimRecord) -> Tally {
        Tally {
            count: self.count + 1,
            settlement: self.settlement + claim.final_settlement,
            predicted: self.predicted + claim.predicted_pain_suffering,
            abs_variance: self.abs_variance + claim.abs_variance(),
            signed_variance: self.signed_variance + claim.variance_pct,
            severity: self.severity + claim.severity,
            caution: self.caution + claim.caution_score,
            days_to_settlement: self.days_to_settlement + claim.days_to_settlement as f64,
            underpredicted: self.underpredicted + usize::from(claim.is_underpredicted()),
        }
    }

    pub fn from_records(records: &[ClaimRecord]) -> Tally {
        records.iter().fold(Tally::default(), Tally::absorb)
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            sum / self.count as f64
        }
    }

    pub fn avg_settlement(&self) -> f64 {
        self.mean(self.settlement)
    }

    pub fn avg_predicted(&self) -> f64 {
        self.mean(self.predicted)
    }

    pub fn avg_abs_variance(&self) -> f64 {
        self.mean(self.abs_variance)
    }

    pub fn avg_signed_variance(&self) -> f64 {
        self.mean(self.signed_variance)
    }

    pub fn avg_severity(&self) -> f64 {
        self.mean(self.severity)
    }

    pub fn avg_caution(&self) -> f64 {
        self.mean(self.caution)
    }

    pub fn avg_days_to_settlement(&self) -> f64 {
        self.mean(self.days_to_settlement)
    }

    /// Share of underpredicted claims, in percent (0..=100).
    pub fn underprediction_rate(&self) -> f64 {
        self.mean(self.underpredicted as f64) * 100.0
    }
}

// =============================================================================
// Grouping fold
// =============================================================================

/// Immutable result of a grouping fold, in first-appearance key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Groups<K, A> {
    entries: Vec<(K, A)>,
}

impl<K, A> Groups<K, A> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, A)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn get(&self, key: &K) -> Option<&A>
    where
        K: PartialEq,
    {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    /// Project every group into an output row.
    pub fn project<R>(self, derive: impl Fn(K, A) -> R) -> Vec<R> {
        self.entries.into_iter().map(|(k, a)| derive(k, a)).collect()
    }
}

impl<K> Groups<K, Tally> {
    /// Sum of group counts; equals the number of folded records.
    pub fn total_count(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.count).sum()
    }
}

/// Fold `records` into one accumulator per distinct key.
pub fn fold_groups<K, A>(
    records: &[ClaimRecord],
    key: impl Fn(&ClaimRecord) -> K,
    step: impl Fn(A, &ClaimRecord) -> A,
) -> Groups<K, A>
where
    K: Eq + Hash + Clone,
    A: Default,
{
    let (_, entries) = records.iter().fold(
        (HashMap::<K, usize>::new(), Vec::<(K, A)>::new()),
        |(mut index, mut entries), claim| {
            let k = key(claim);
            match index.get(&k).copied() {
                Some(slot) => {
                    let acc = std::mem::take(&mut entries[slot].1);
                    entries[slot].1 = step(acc, claim);
                }
                None => {
                    index.insert(k.clone(), entries.len());
                    entries.push((k, step(A::default(), claim)));
                }
            }
            (index, entries)
        },
    );
    Groups { entries }
}

/// [`fold_groups`] with the standard [`Tally`] accumulator.
pub fn tally_by<K>(records: &[ClaimRecord], key: impl Fn(&ClaimRecord) -> K) -> Groups<K, Tally>
where
    K: Eq + Hash + Clone,
{
    fold_groups(records, key, Tally::absorb)
}

// =============================================================================
// Reduction
// =============================================================================

/// Group, project, stable-sort and optionally truncate.
pub fn rollup<K, A, R>(
    records: &[ClaimRecord],
    key: impl Fn(&ClaimRecord) -> K,
    step: impl Fn(A, &ClaimRecord) -> A,
    derive: impl Fn(K, A) -> R,
    order: impl Fn(&R, &R) -> Ordering,
    limit: Option<usize>,
) -> Vec<R>
where
    K: Eq + Hash + Clone,
    A: Default,
{
    let mut rows = fold_groups(records, key, step).project(derive);
    rows.sort_by(order);
    if let Some(n) = limit {
        rows.truncate(n);
    }
    rows
}

/// Comparator: larger metric first. Equal metrics keep input order.
pub fn descending<R>(metric: impl Fn(&R) -> f64) -> impl Fn(&R, &R) -> Ordering {
    move |a, b| metric(b).total_cmp(&metric(a))
}

/// Comparator: smaller metric first. Equal metrics keep input order.
pub fn ascending<R>(metric: impl Fn(&R) -> f64) -> impl Fn(&R, &R) -> Ordering {
    move |a, b| metric(a).total_cmp(&metric(b))
}

/// Comparator on a string label, lexicographic ascending.
pub fn by_label<R>(label: impl Fn(&R) -> &str) -> impl Fn(&R, &R) -> Ordering {
    move |a, b| label(a).cmp(label(b))
}
