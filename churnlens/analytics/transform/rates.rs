use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category bar of a churn-rate chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRate {
    /// Category label (country, gender, ...).
    pub label: String,
    /// Rate scaled to percent.
    pub rate_pct: f64,
}

/// Category bar of a count chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Category label.
    pub label: String,
    /// Row count.
    pub count: u64,
}

/// Converts rates to percent, keeping the first-seen order of the keys.
#[must_use]
pub fn to_rates(rates: &IndexMap<String, f64>) -> Vec<CategoryRate> {
    rates
        .iter()
        .map(|(label, rate)| CategoryRate {
            label: label.clone(),
            rate_pct: rate * 100.0,
        })
        .collect()
}

/// Converts count-valued mappings (e.g. age-group sizes), keeping key order.
#[must_use]
pub fn to_counts(counts: &IndexMap<String, f64>) -> Vec<CategoryCount> {
    counts
        .iter()
        .map(|(label, count)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = count.max(0.0).round() as u64;
            CategoryCount {
                label: label.clone(),
                count,
            }
        })
        .collect()
}
