//! Row-set filtering for the views.
//!
//! Filters never mutate their input: they return new, order-preserving
//! subsets.

use rustc_hash::FxHashSet;

use crate::models::{MarketMetricsRow, StateDemographic};

/// Active filter parameters of a view
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub states: FxHashSet<String>,
    pub min_market_potential: f64,
}

impl FilterParams {
    pub fn new<I, S>(states: I, min_market_potential: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            min_market_potential,
        }
    }

    pub fn apply(&self, rows: &[MarketMetricsRow]) -> Vec<MarketMetricsRow> {
        filter(rows, &self.states, self.min_market_potential)
    }
}

/// Rows whose state is whitelisted and whose market potential reaches the threshold.
pub fn filter(
    rows: &[MarketMetricsRow],
    state_whitelist: &FxHashSet<String>,
    min_market_potential: f64,
) -> Vec<MarketMetricsRow> {
    rows.iter()
        .filter(|row| state_whitelist.contains(&row.state.state_name))
        .filter(|row| row.market_potential >= min_market_potential)
        .cloned()
        .collect()
}

/// Demographic rows for the whitelisted states, in input order
pub fn filter_demographics(
    states: &[StateDemographic],
    state_whitelist: &FxHashSet<String>,
) -> Vec<StateDemographic> {
    states
        .iter()
        .filter(|s| state_whitelist.contains(&s.state_name))
        .cloned()
        .collect()
}

/// The `n` most populous states, most populous first. Ties keep input order.
pub fn top_by_population(states: &[StateDemographic], n: usize) -> Vec<&StateDemographic> {
    let mut ranked: Vec<&StateDemographic> = states.iter().collect();
    ranked.sort_by(|a, b| b.indian_population.cmp(&a.indian_population));
    ranked.truncate(n);
    ranked
}

/// Names of the `n` most populous states, the initial selection of a view
pub fn default_selection(states: &[StateDemographic], n: usize) -> Vec<String> {
    top_by_population(states, n)
        .into_iter()
        .map(|s| s.state_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PreferenceVector};

    fn row(state: &str, market_potential: f64) -> MarketMetricsRow {
        let preferences = PreferenceVector::from_raw([50.0; 5]);
        MarketMetricsRow {
            state: StateDemographic::new(state, 1000, 50_000.0),
            preferences,
            dominant_category: Category::BollywoodHindi,
            category_strength: 50.0,
            diversity_score: 0.0,
            market_potential,
        }
    }

    fn whitelist(names: &[&str]) -> FxHashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn names(rows: &[MarketMetricsRow]) -> Vec<&str> {
        rows.iter().map(|r| r.state.state_name.as_str()).collect()
    }

    #[test]
    fn test_empty_whitelist_returns_nothing() {
        let rows = vec![row("CA", 1900.0), row("TX", 375.0)];
        assert!(filter(&rows, &FxHashSet::default(), 0.0).is_empty());
        assert!(filter(&rows, &FxHashSet::default(), f64::NEG_INFINITY).is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let rows = vec![row("CA", 10.0), row("TX", 10.0), row("NY", 10.0)];
        let result = filter(&rows, &whitelist(&["NY", "CA"]), 0.0);
        assert_eq!(names(&result), vec!["CA", "NY"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let rows = vec![row("CA", 500.0), row("TX", 499.9)];
        let result = filter(&rows, &whitelist(&["CA", "TX"]), 500.0);
        assert_eq!(names(&result), vec!["CA"]);
    }

    #[test]
    fn test_input_untouched() {
        let rows = vec![row("CA", 10.0), row("TX", 10.0)];
        let before = rows.clone();
        let _ = FilterParams::new(["TX"], 0.0).apply(&rows);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_default_selection_top_population() {
        let states = vec![
            StateDemographic::new("Ohio", 60_000, 1.0),
            StateDemographic::new("California", 2_000_000, 1.0),
            StateDemographic::new("Utah", 60_000, 1.0),
            StateDemographic::new("Texas", 500_000, 1.0),
        ];
        assert_eq!(default_selection(&states, 3), vec!["California", "Texas", "Ohio"]);
        assert_eq!(default_selection(&states, 10).len(), 4);
        assert!(default_selection(&states, 0).is_empty());
    }

    #[test]
    fn test_filter_demographics() {
        let states = vec![
            StateDemographic::new("Ohio", 60_000, 1.0),
            StateDemographic::new("Texas", 500_000, 1.0),
        ];
        let filtered = filter_demographics(&states, &whitelist(&["Texas", "Nowhere"]));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].state_name, "Texas");
    }
}
