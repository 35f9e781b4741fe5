//! Group-by aggregation of flat rows.
//!
//! ```text
//! (key, value, label) rows            →  one Aggregate per key
//! ┌──────────────────────────┐          ┌──────────────────────────┐
//! │ QLD, 120.0, "Alpha"      │          │ QLD: sum 170.0, "Alpha"  │
//! │ QLD,  50.0, "Beta"       │    →     ├──────────────────────────┤
//! │ VIC,  None, "Gamma"      │          │ VIC: sum 0.0, "Gamma"    │
//! └──────────────────────────┘          └──────────────────────────┘
//! ```
//!
//! Keys are kept in a `BTreeMap`, so output is sorted by key. Missing values
//! are skipped by the sum; the label is the first non-missing one seen.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Running aggregate for one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub sum: f64,
    /// Rows in the group, including those with a missing value.
    pub rows: usize,
    /// First non-missing label seen for the group.
    pub first: Option<String>,
}

impl Aggregate {
    fn add(&mut self, value: Option<f64>, label: Option<String>) {
        self.rows += 1;
        if let Some(v) = value {
            self.sum += v;
        }
        if self.first.is_none() {
            self.first = label;
        }
    }
}

/// Sum values per key, remembering the first label of each group.
pub fn aggregate<K, I>(rows: I) -> BTreeMap<K, Aggregate>
where
    K: Ord,
    I: IntoIterator<Item = (K, Option<f64>, Option<String>)>,
{
    let mut groups: BTreeMap<K, Aggregate> = BTreeMap::new();
    for (key, value, label) in rows {
        groups.entry(key).or_default().add(value, label);
    }
    groups
}

/// Sum values per key.
pub fn sum_by<K, I>(rows: I) -> BTreeMap<K, f64>
where
    K: Ord,
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    aggregate(rows.into_iter().map(|(k, v)| (k, v, None)))
        .into_iter()
        .map(|(k, agg)| (k, agg.sum))
        .collect()
}

/// `f64` usable as part of a group key (total order via `total_cmp`).
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_sums_and_first_label() {
        let rows = vec![
            ("QLD", Some(120.0), Some("Alpha".to_string())),
            ("VIC", None, None),
            ("QLD", Some(50.0), Some("Beta".to_string())),
            ("VIC", Some(3.0), Some("Gamma".to_string())),
        ];

        let groups = aggregate(rows);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["QLD", "VIC"]);

        assert_eq!(groups["QLD"].sum, 170.0);
        assert_eq!(groups["QLD"].rows, 2);
        assert_eq!(groups["QLD"].first.as_deref(), Some("Alpha"));
        assert_eq!(groups["VIC"].sum, 3.0);
        assert_eq!(groups["VIC"].first.as_deref(), Some("Gamma"));
    }

    #[test]
    fn test_sum_by_all_missing_is_zero() {
        let sums = sum_by(vec![("NT", None), ("NT", None)]);
        assert_eq!(sums["NT"], 0.0);
    }

    #[test]
    fn test_ordered_float_keys_sort_numerically() {
        let sums = sum_by(vec![
            ((OrderedFloat(-12.4), "b"), Some(1.0)),
            ((OrderedFloat(-33.8), "a"), Some(2.0)),
            ((OrderedFloat(-12.4), "b"), Some(4.0)),
        ]);
        let keys: Vec<f64> = sums.keys().map(|(lat, _)| lat.0).collect();
        assert_eq!(keys, vec![-33.8, -12.4]);
        assert_eq!(sums[&(OrderedFloat(-12.4), "b")], 5.0);
    }
}
