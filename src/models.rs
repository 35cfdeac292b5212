//! Core data models for the market-intelligence pipeline.
//!
//! This module contains the input records, the category enum, preference
//! vectors and the derived per-state metrics row shared by every stage.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Score Bounds
// ============================================================================

/// Lowest preference score a state can hold for any category
pub const MIN_PREFERENCE: f64 = 15.0;

/// Highest preference score a state can hold for any category
pub const MAX_PREFERENCE: f64 = 95.0;

/// Clamp a raw score into the preference range. NaN collapses to the minimum.
pub fn clamp_preference(raw: f64) -> f64 {
    if raw.is_nan() {
        MIN_PREFERENCE
    } else {
        raw.clamp(MIN_PREFERENCE, MAX_PREFERENCE)
    }
}

// ============================================================================
// Type Aliases
// ============================================================================

/// Preference profiles keyed by state name
pub type PreferenceMap = FxHashMap<String, PreferenceVector>;

// ============================================================================
// Input Records
// ============================================================================

/// Playlist row from the playlists table
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PlaylistRecord {
    #[serde(rename = "playlist_name")]
    pub name: String,
    pub search_term: String,
    pub total_tracks: u64,
    pub followers: u64,
}

/// Per-state demographic facts. `state_name` is the unique key.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StateDemographic {
    pub state_name: String,
    #[serde(default)]
    pub state_abbr: Option<String>,
    pub indian_population: u64,
    pub median_income: f64,
    pub median_rent: f64,
}

impl StateDemographic {
    pub fn new(state_name: &str, indian_population: u64, median_income: f64) -> Self {
        Self {
            state_name: state_name.to_string(),
            state_abbr: None,
            indian_population,
            median_income,
            median_rent: 0.0,
        }
    }

    pub fn population(&self) -> f64 {
        self.indian_population as f64
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Music category. Declaration order is the dominant-category tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    BollywoodHindi,
    SouthIndian,
    Classical,
    RegionalFolk,
    Devotional,
    Unclassified,
}

impl Category {
    /// The five categories that carry a preference score, in tie-break order
    pub const SCORED: [Category; 5] = [
        Category::BollywoodHindi,
        Category::SouthIndian,
        Category::Classical,
        Category::RegionalFolk,
        Category::Devotional,
    ];

    /// Position inside a [`PreferenceVector`], `None` for `Unclassified`
    pub fn index(self) -> Option<usize> {
        match self {
            Category::BollywoodHindi => Some(0),
            Category::SouthIndian => Some(1),
            Category::Classical => Some(2),
            Category::RegionalFolk => Some(3),
            Category::Devotional => Some(4),
            Category::Unclassified => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::BollywoodHindi => "Bollywood/Hindi",
            Category::SouthIndian => "South Indian",
            Category::Classical => "Classical",
            Category::RegionalFolk => "Regional/Folk",
            Category::Devotional => "Devotional",
            Category::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Preference Vector
// ============================================================================

/// Per-state preference scores over the five scored categories.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PreferenceVector {
    scores: [f64; 5],
}

impl PreferenceVector {
    /// Build from raw scores in [`Category::SCORED`] order, clamping each one.
    pub fn from_raw(raw: [f64; 5]) -> Self {
        Self {
            scores: raw.map(clamp_preference),
        }
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        category.index().map(|i| self.scores[i])
    }

    pub fn scores(&self) -> &[f64; 5] {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::SCORED.iter().copied().zip(self.scores.iter().copied())
    }

    /// Highest-scoring category. Strict comparison keeps the earliest on ties.
    pub fn dominant(&self) -> (Category, f64) {
        let mut best = (Category::SCORED[0], self.scores[0]);
        for (category, score) in self.iter().skip(1) {
            if score > best.1 {
                best = (category, score);
            }
        }
        best
    }

    /// Population standard deviation (ddof = 0) of the five scores
    pub fn diversity(&self) -> f64 {
        let n = self.scores.len() as f64;
        let mean = self.scores.iter().sum::<f64>() / n;
        let variance = self.scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    }
}

// ============================================================================
// Output Models
// ============================================================================

/// Derived market indicators for one state.
///
/// Only constructed by [`crate::metrics::compute`]; view-specific metrics
/// (tiers, content gap) depend on the surrounding row set and live on
/// [`crate::metrics::MarketView`] instead.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketMetricsRow {
    pub state: StateDemographic,
    pub preferences: PreferenceVector,
    pub dominant_category: Category,
    pub category_strength: f64,
    pub diversity_score: f64,
    pub market_potential: f64,
}

/// Investment priority bucket relative to the current row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriorityTier::Low => "Low",
            PriorityTier::Medium => "Medium",
            PriorityTier::High => "High",
        };
        f.write_str(s)
    }
}

/// Header metrics of the dashboard view
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub state_count: usize,
    pub playlist_count: usize,
    pub total_population: u64,
}

/// Fully derived row as exported in the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub state: String,
    pub state_abbr: Option<String>,
    pub indian_population: u64,
    pub median_income: f64,
    pub dominant_category: Category,
    pub category_strength: f64,
    pub diversity_score: f64,
    pub market_potential: f64,
    pub cultural_index: f64,
    pub investment_score: f64,
    pub priority: PriorityTier,
    pub projected_revenue_musd: f64,
    pub content_gap: Option<f64>,
}

/// Market report written by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub summary: DashboardSummary,
    pub category_distribution: Vec<(Category, usize)>,
    /// Most populous selected states, largest first
    pub top_states: Vec<StateDemographic>,
    pub rows: Vec<ReportRow>,
}

impl MarketReport {
    /// Write the report to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_preference_bounds() {
        assert_eq!(clamp_preference(-40.0), MIN_PREFERENCE);
        assert_eq!(clamp_preference(400.0), MAX_PREFERENCE);
        assert_eq!(clamp_preference(50.0), 50.0);
        assert_eq!(clamp_preference(f64::NAN), MIN_PREFERENCE);
        assert_eq!(clamp_preference(f64::INFINITY), MAX_PREFERENCE);
    }

    #[test]
    fn test_dominant_tie_prefers_earlier_category() {
        let prefs = PreferenceVector::from_raw([80.0, 80.0, 10.0, 10.0, 10.0]);
        let (dominant, strength) = prefs.dominant();
        assert_eq!(dominant, Category::BollywoodHindi);
        assert_eq!(strength, 80.0);
    }

    #[test]
    fn test_dominant_tie_classical_before_regional() {
        let prefs = PreferenceVector::from_raw([20.0, 30.0, 70.0, 70.0, 70.0]);
        assert_eq!(prefs.dominant().0, Category::Classical);
    }

    #[test]
    fn test_diversity_zero_iff_equal() {
        let flat = PreferenceVector::from_raw([42.0; 5]);
        assert_eq!(flat.diversity(), 0.0);

        let spread = PreferenceVector::from_raw([20.0, 40.0, 60.0, 80.0, 90.0]);
        assert!(spread.diversity() > 0.0);
    }

    #[test]
    fn test_diversity_is_population_std() {
        // mean 50, deviations ±20 on two entries -> variance 160
        let prefs = PreferenceVector::from_raw([30.0, 70.0, 50.0, 50.0, 50.0]);
        assert!((prefs.diversity() - 160f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_unclassified_has_no_score() {
        let prefs = PreferenceVector::from_raw([50.0; 5]);
        assert_eq!(prefs.get(Category::Unclassified), None);
        assert_eq!(prefs.get(Category::Devotional), Some(50.0));
    }
}
