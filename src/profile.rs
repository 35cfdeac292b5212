//! Per-state category preference profiles.
//!
//! [`PreferenceSource`] is the seam between demographic data and the metrics
//! engine. Two sources exist:
//! - [`SyntheticProfileGenerator`]: seeded Gaussian draws parameterized by
//!   cohort bucket, standing in for real listening data
//! - [`TableProfileSource`]: measured scores read from a CSV table
//!
//! Both only profile the `top_n` most populous states; every other state
//! gets no profile and therefore no metrics row.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{BucketParams, ProfileConfig, CLASSICAL_INCOME_SCALE};
use crate::dataset::read_rows;
use crate::error::{DataLoadError, Result};
use crate::filter::top_by_population;
use crate::models::{Category, PreferenceMap, PreferenceVector, StateDemographic};

pub trait PreferenceSource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Preference vectors keyed by state name
    fn profiles(&self, states: &[StateDemographic]) -> PreferenceMap;
}

// ============================================================================
// Synthetic Generator
// ============================================================================

/// Deterministic synthetic profiles drawn from per-bucket Gaussians.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProfileGenerator {
    config: ProfileConfig,
}

impl SyntheticProfileGenerator {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Generate profiles for the top-N states using `seed`.
    ///
    /// States are visited in population-descending order and each draws its
    /// five categories in `Category::SCORED` order from one RNG, so identical
    /// inputs reproduce identical vectors.
    pub fn generate(&self, states: &[StateDemographic], seed: u64) -> PreferenceMap {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut profiles = PreferenceMap::default();

        for state in top_by_population(states, self.config.top_n) {
            let bucket = self.config.bucket_for(&state.state_name);
            let vector = draw_vector(&mut rng, bucket.params(), state.median_income);
            debug!(state = %state.state_name, ?bucket, "generated synthetic profile");
            profiles.insert(state.state_name.clone(), vector);
        }
        profiles
    }
}

impl PreferenceSource for SyntheticProfileGenerator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn profiles(&self, states: &[StateDemographic]) -> PreferenceMap {
        self.generate(states, self.config.seed)
    }
}

fn draw_vector(rng: &mut StdRng, params: &BucketParams, income: f64) -> PreferenceVector {
    let mut raw = [0.0; 5];
    for (slot, (category, dist)) in raw
        .iter_mut()
        .zip(Category::SCORED.iter().zip(params.categories.iter()))
    {
        let mut mean = dist.mean;
        if *category == Category::Classical {
            mean += income / CLASSICAL_INCOME_SCALE * params.classical_income_coef;
        }
        let z: f64 = rng.sample(StandardNormal);
        *slot = mean + dist.std_dev * z;
    }
    PreferenceVector::from_raw(raw)
}

// ============================================================================
// Table-backed Source
// ============================================================================

pub const PREFERENCE_COLUMNS: [&str; 6] = [
    "state_name",
    "bollywood_hindi",
    "south_indian",
    "classical",
    "regional_folk",
    "devotional",
];

#[derive(Debug, Deserialize)]
struct PreferenceRow {
    state_name: String,
    bollywood_hindi: f64,
    south_indian: f64,
    classical: f64,
    regional_folk: f64,
    devotional: f64,
}

/// Measured preference scores loaded from a CSV table.
#[derive(Debug, Clone)]
pub struct TableProfileSource {
    scores: FxHashMap<String, PreferenceVector>,
    top_n: usize,
}

impl TableProfileSource {
    pub fn new(scores: FxHashMap<String, PreferenceVector>, top_n: usize) -> Self {
        Self { scores, top_n }
    }

    /// Load scores; out-of-range values are clamped into the preference range.
    pub fn load(path: &Path, top_n: usize) -> Result<Self> {
        let mut scores = FxHashMap::default();
        for (_, row) in read_rows::<PreferenceRow>(path, &PREFERENCE_COLUMNS)? {
            let vector = PreferenceVector::from_raw([
                row.bollywood_hindi,
                row.south_indian,
                row.classical,
                row.regional_folk,
                row.devotional,
            ]);
            if scores.insert(row.state_name.clone(), vector).is_some() {
                return Err(DataLoadError::DuplicateState {
                    path: path.to_path_buf(),
                    state: row.state_name,
                });
            }
        }
        info!(path = %path.display(), count = scores.len(), "loaded preference table");
        Ok(Self::new(scores, top_n))
    }
}

impl PreferenceSource for TableProfileSource {
    fn name(&self) -> &'static str {
        "table"
    }

    fn profiles(&self, states: &[StateDemographic]) -> PreferenceMap {
        top_by_population(states, self.top_n)
            .into_iter()
            .filter_map(|state| {
                self.scores
                    .get(&state.state_name)
                    .map(|v| (state.state_name.clone(), *v))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAX_PREFERENCE, MIN_PREFERENCE};
    use std::io::Write;

    fn sample_states() -> Vec<StateDemographic> {
        vec![
            StateDemographic::new("Ohio", 60_000, 62_000.0),
            StateDemographic::new("California", 2_000_000, 95_000.0),
            StateDemographic::new("Texas", 500_000, 75_000.0),
            StateDemographic::new("New York", 400_000, 80_000.0),
        ]
    }

    fn assert_in_range(profiles: &PreferenceMap) {
        for vector in profiles.values() {
            for &score in vector.scores() {
                assert!((MIN_PREFERENCE..=MAX_PREFERENCE).contains(&score), "score {}", score);
            }
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let generator = SyntheticProfileGenerator::default();
        let states = sample_states();
        let a = generator.generate(&states, 42);
        let b = generator.generate(&states, 42);
        assert_eq!(a.len(), 4);
        for (state, vector) in &a {
            let other = &b[state];
            for (x, y) in vector.scores().iter().zip(other.scores()) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_different_seed_changes_profiles() {
        let generator = SyntheticProfileGenerator::default();
        let states = sample_states();
        let a = generator.generate(&states, 1);
        let b = generator.generate(&states, 2);
        assert_ne!(a["California"], b["California"]);
    }

    #[test]
    fn test_draw_order_follows_population_not_input() {
        let generator = SyntheticProfileGenerator::default();
        let states = sample_states();
        let mut reversed = states.clone();
        reversed.reverse();
        assert_eq!(generator.generate(&states, 9), generator.generate(&reversed, 9));
    }

    #[test]
    fn test_only_top_n_profiled() {
        let mut config = ProfileConfig::default();
        config.top_n = 2;
        let profiles = SyntheticProfileGenerator::new(config).generate(&sample_states(), 42);
        assert_eq!(profiles.len(), 2);
        assert!(profiles.contains_key("California"));
        assert!(profiles.contains_key("Texas"));
        assert!(!profiles.contains_key("Ohio"));
    }

    #[test]
    fn test_default_top_n_excludes_small_states() {
        let states: Vec<StateDemographic> = (0..20)
            .map(|i| StateDemographic::new(&format!("State {}", i), 1000 * (i + 1), 50_000.0))
            .collect();
        let profiles = SyntheticProfileGenerator::default().generate(&states, 42);
        assert_eq!(profiles.len(), 15);
        assert!(!profiles.contains_key("State 0"));
        assert!(profiles.contains_key("State 19"));
    }

    #[test]
    fn test_scores_clamped_for_extreme_inputs() {
        let states = vec![
            StateDemographic::new("California", 0, 0.0),
            StateDemographic::new("Texas", u64::MAX, 1e12),
            StateDemographic::new("Ohio", 0, f64::MAX),
        ];
        let generator = SyntheticProfileGenerator::default();
        for seed in 0..50 {
            assert_in_range(&generator.generate(&states, seed));
        }
        let rich = generator.generate(&states, 3);
        assert_eq!(rich["Texas"].get(Category::Classical), Some(MAX_PREFERENCE));
    }

    #[test]
    fn test_empty_states_yield_no_profiles() {
        assert!(SyntheticProfileGenerator::default().generate(&[], 42).is_empty());
    }

    #[test]
    fn test_trait_uses_configured_seed() {
        let mut config = ProfileConfig::default();
        config.seed = 11;
        let generator = SyntheticProfileGenerator::new(config);
        let states = sample_states();
        assert_eq!(generator.profiles(&states), generator.generate(&states, 11));
    }

    #[test]
    fn test_table_source_loads_and_clamps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"state_name,bollywood_hindi,south_indian,classical,regional_folk,devotional\n\
              California,70,99,40,60,5\n\
              Texas,80,55,25,65,50\n",
        )
        .unwrap();
        file.flush().unwrap();

        let source = TableProfileSource::load(file.path(), 15).unwrap();
        let profiles = source.profiles(&sample_states());
        assert_eq!(profiles.len(), 2);
        let ca = profiles["California"];
        assert_eq!(ca.get(Category::SouthIndian), Some(MAX_PREFERENCE));
        assert_eq!(ca.get(Category::Devotional), Some(MIN_PREFERENCE));
        assert!(!profiles.contains_key("Ohio"));
    }

    #[test]
    fn test_table_source_respects_top_n() {
        let mut scores = FxHashMap::default();
        scores.insert("Ohio".to_string(), PreferenceVector::from_raw([50.0; 5]));
        scores.insert("California".to_string(), PreferenceVector::from_raw([50.0; 5]));
        let source = TableProfileSource::new(scores, 1);
        let profiles = source.profiles(&sample_states());
        assert_eq!(profiles.len(), 1);
        assert!(profiles.contains_key("California"));
    }

    #[test]
    fn test_table_source_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"state_name,bollywood_hindi\nOhio,50\n").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            TableProfileSource::load(file.path(), 15).unwrap_err(),
            DataLoadError::MissingColumn { .. }
        ));
    }
}
