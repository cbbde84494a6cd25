use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::formatter::humanize_label;

/// Feature entry of a ranked importance chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    /// Feature key as produced by the model pipeline.
    pub name: String,
    /// Display label with underscores replaced by spaces.
    pub label: String,
    /// Importance weight.
    pub importance: f64,
}

/// Returns the `n` heaviest entries, heaviest first.
///
/// Equal weights are ordered by ascending name so the output does not
/// depend on the map's insertion order. The input map is left untouched.
#[must_use]
pub fn top_n(weights: &IndexMap<String, f64>, n: usize) -> Vec<RankedFeature> {
    let mut ranked: Vec<(&String, f64)> = weights.iter().map(|(k, v)| (k, *v)).collect();
    ranked.sort_by(by_weight_then_name);
    ranked
        .into_iter()
        .take(n)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            label: humanize_label(name),
            importance,
        })
        .collect()
}

fn by_weight_then_name(a: &(&String, f64), b: &(&String, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn sample() -> IndexMap<String, f64> {
        indexmap! {
            "Age".to_string() => 0.05,
            "Lifetime_Value".to_string() => 0.21,
            "Days_Since_Last_Purchase".to_string() => 0.18,
            "Login_Frequency".to_string() => 0.05,
            "Credit_Balance".to_string() => 0.02,
        }
    }

    #[test]
    fn sorts_descending_with_name_tie_break() {
        let ranked = top_n(&sample(), 10);
        let names: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Lifetime_Value",
                "Days_Since_Last_Purchase",
                "Age",
                "Login_Frequency",
                "Credit_Balance"
            ]
        );
        assert!(ranked
            .windows(2)
            .all(|pair| pair[0].importance >= pair[1].importance));
        assert_eq!(ranked[1].label, "Days Since Last Purchase");
    }

    #[test]
    fn truncates_to_n() {
        let map = sample();
        assert_eq!(top_n(&map, 2).len(), 2);
        assert_eq!(top_n(&map, 10).len(), map.len().min(10));
        assert!(top_n(&map, 0).is_empty());
        assert!(top_n(&IndexMap::new(), 10).is_empty());
    }

    #[test]
    fn ignores_insertion_order() {
        let forward = sample();
        let mut reversed = IndexMap::new();
        for (key, value) in forward.iter().rev() {
            reversed.insert(key.clone(), *value);
        }
        assert_eq!(top_n(&forward, 10), top_n(&reversed, 10));
        assert_eq!(forward, sample());
    }
}
