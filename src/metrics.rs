//! Market metrics: per-state rows and the metrics derived from them.
//!
//! Row-level metrics (dominant category, diversity, market potential) are
//! fixed once computed. Set-level metrics (priority tiers, content gap) are
//! relative to whatever row set the caller currently holds, so they live on
//! [`MarketView`] and change when the filter changes.

use tracing::debug;

use crate::classify::{category_distribution, classified_count};
use crate::config::ProfileConfig;
use crate::filter::top_by_population;
use crate::models::{
    Category, DashboardSummary, MarketMetricsRow, MarketReport, PlaylistRecord, PreferenceMap,
    PriorityTier, ReportRow, StateDemographic,
};

// ============================================================================
// Weights
// ============================================================================

const CULTURAL_CLASSICAL_WEIGHT: f64 = 0.4;
const CULTURAL_DEVOTIONAL_WEIGHT: f64 = 0.3;
const CULTURAL_DIVERSITY_WEIGHT: f64 = 0.3;

const INVESTMENT_POTENTIAL_WEIGHT: f64 = 0.4;
const INVESTMENT_DIVERSITY_WEIGHT: f64 = 0.3;
const INVESTMENT_INCOME_WEIGHT: f64 = 0.3;

/// Share of the population assumed to subscribe
const REVENUE_ADOPTION_RATE: f64 = 0.3;
/// Annual revenue per subscriber at the reference income, in dollars
const REVENUE_PER_SUBSCRIBER: f64 = 120.0;
const REVENUE_REFERENCE_INCOME: f64 = 50_000.0;

/// Length of the population ranking in the report
pub const TOP_STATES_SHOWN: usize = 10;

// ============================================================================
// Row Metrics
// ============================================================================

/// `population/1000 * income/100000`
pub fn market_potential(state: &StateDemographic) -> f64 {
    state.population() / 1000.0 * state.median_income / 100_000.0
}

/// One row per state that has a profile, in the order of `states`.
pub fn compute(states: &[StateDemographic], preferences: &PreferenceMap) -> Vec<MarketMetricsRow> {
    let rows: Vec<MarketMetricsRow> = states
        .iter()
        .filter_map(|state| {
            let prefs = preferences.get(&state.state_name)?;
            let (dominant_category, category_strength) = prefs.dominant();
            Some(MarketMetricsRow {
                state: state.clone(),
                preferences: *prefs,
                dominant_category,
                category_strength,
                diversity_score: prefs.diversity(),
                market_potential: market_potential(state),
            })
        })
        .collect();
    debug!(states = states.len(), rows = rows.len(), "computed market metrics");
    rows
}

fn score(row: &MarketMetricsRow, category: Category) -> f64 {
    row.preferences.get(category).unwrap_or_default()
}

/// `0.4*Classical + 0.3*Devotional + 0.3*diversity`
pub fn cultural_index(row: &MarketMetricsRow) -> f64 {
    CULTURAL_CLASSICAL_WEIGHT * score(row, Category::Classical)
        + CULTURAL_DEVOTIONAL_WEIGHT * score(row, Category::Devotional)
        + CULTURAL_DIVERSITY_WEIGHT * row.diversity_score
}

/// `0.4*market_potential + 0.3*diversity + 0.3*(income/100000)`
pub fn investment_score(row: &MarketMetricsRow) -> f64 {
    INVESTMENT_POTENTIAL_WEIGHT * row.market_potential
        + INVESTMENT_DIVERSITY_WEIGHT * row.diversity_score
        + INVESTMENT_INCOME_WEIGHT * (row.state.median_income / 100_000.0)
}

/// Projected annual revenue in millions of dollars
pub fn projected_revenue(row: &MarketMetricsRow) -> f64 {
    row.state.population()
        * REVENUE_ADOPTION_RATE
        * (row.state.median_income / REVENUE_REFERENCE_INCOME)
        * REVENUE_PER_SUBSCRIBER
        / 1_000_000.0
}

/// Three equal-width tiers over `[min, max]` of `scores`.
///
/// Edges are right-inclusive and the lowest edge includes the minimum. A
/// degenerate range puts every score in `Medium`.
pub fn tiers_for(scores: &[f64]) -> Vec<PriorityTier> {
    let Some(lo) = scores.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let hi = scores.iter().copied().fold(lo, f64::max);
    if hi <= lo {
        return vec![PriorityTier::Medium; scores.len()];
    }

    let width = (hi - lo) / 3.0;
    scores
        .iter()
        .map(|&s| {
            if s <= lo + width {
                PriorityTier::Low
            } else if s <= lo + 2.0 * width {
                PriorityTier::Medium
            } else {
                PriorityTier::High
            }
        })
        .collect()
}

// ============================================================================
// Market View
// ============================================================================

/// Read-only query surface over the row set a view currently shows.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    rows: &'a [MarketMetricsRow],
    classified_playlists: usize,
}

impl<'a> MarketView<'a> {
    pub fn new(rows: &'a [MarketMetricsRow], playlists: &[PlaylistRecord]) -> Self {
        Self::with_classified_count(rows, classified_count(playlists))
    }

    pub fn with_classified_count(rows: &'a [MarketMetricsRow], classified_playlists: usize) -> Self {
        Self {
            rows,
            classified_playlists,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn investment_scores(&self) -> Vec<f64> {
        self.rows.iter().map(investment_score).collect()
    }

    /// Priority tier per row, relative to this row set
    pub fn priority_tiers(&self) -> Vec<PriorityTier> {
        tiers_for(&self.investment_scores())
    }

    /// `population/100000 - classified/row_count`; `None` when the view is empty.
    pub fn content_gap(&self, row: &MarketMetricsRow) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let supply = self.classified_playlists as f64 / self.rows.len() as f64;
        Some(row.state.population() / 100_000.0 - supply)
    }

    pub fn report_rows(&self, config: &ProfileConfig) -> Vec<ReportRow> {
        self.rows
            .iter()
            .zip(self.priority_tiers())
            .map(|(row, priority)| ReportRow {
                state: row.state.state_name.clone(),
                state_abbr: config.abbreviation(&row.state).map(str::to_string),
                indian_population: row.state.indian_population,
                median_income: row.state.median_income,
                dominant_category: row.dominant_category,
                category_strength: row.category_strength,
                diversity_score: row.diversity_score,
                market_potential: row.market_potential,
                cultural_index: cultural_index(row),
                investment_score: investment_score(row),
                priority,
                projected_revenue_musd: projected_revenue(row),
                content_gap: self.content_gap(row),
            })
            .collect()
    }
}

// ============================================================================
// Dashboard Summary
// ============================================================================

pub fn summary(states: &[StateDemographic], playlists: &[PlaylistRecord]) -> DashboardSummary {
    DashboardSummary {
        state_count: states.len(),
        playlist_count: playlists.len(),
        total_population: states
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.indian_population)),
    }
}

/// Assemble the exported report for the selected states and their filtered rows
pub fn build_report(
    view: &MarketView<'_>,
    selected_states: &[StateDemographic],
    playlists: &[PlaylistRecord],
    config: &ProfileConfig,
) -> MarketReport {
    MarketReport {
        summary: summary(selected_states, playlists),
        category_distribution: category_distribution(playlists),
        top_states: top_by_population(selected_states, TOP_STATES_SHOWN)
            .into_iter()
            .cloned()
            .collect(),
        rows: view.report_rows(config),
    }
}
