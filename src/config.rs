//! Profile configuration: cohort buckets, generator parameters and state
//! abbreviations.
//!
//! Built-in defaults cover the usual run; a TOML file can override the
//! population cut, the seed, bucket membership and abbreviations.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::dataset::is_state_abbr;
use crate::models::StateDemographic;

pub const DEFAULT_TOP_N: usize = 15;
pub const DEFAULT_SEED: u64 = 42;

/// Income divisor for the Classical income term
pub const CLASSICAL_INCOME_SCALE: f64 = 70_000.0;

// ============================================================================
// Cohort Buckets
// ============================================================================

/// Hand-picked state grouping that parameterizes synthetic preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortBucket {
    TechHub,
    MetroDiversity,
    GrowthMarket,
    Other,
}

impl CohortBucket {
    pub fn params(self) -> &'static BucketParams {
        match self {
            CohortBucket::TechHub => &TECH_HUB,
            CohortBucket::MetroDiversity => &METRO_DIVERSITY,
            CohortBucket::GrowthMarket => &GROWTH_MARKET,
            CohortBucket::Other => &OTHER,
        }
    }
}

/// Normal distribution parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
}

const fn g(mean: f64, std_dev: f64) -> Gaussian {
    Gaussian { mean, std_dev }
}

/// Per-bucket score distributions, in `Category::SCORED` order.
/// For Classical, `mean` is the base before the income term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketParams {
    pub categories: [Gaussian; 5],
    pub classical_income_coef: f64,
}

//                                       Bollywood     South         Classical     Regional      Devotional
const TECH_HUB: BucketParams = BucketParams {
    categories: [g(70.0, 8.0), g(85.0, 5.0), g(40.0, 5.0), g(60.0, 10.0), g(30.0, 8.0)],
    classical_income_coef: 35.0,
};
const METRO_DIVERSITY: BucketParams = BucketParams {
    categories: [g(85.0, 5.0), g(65.0, 8.0), g(35.0, 5.0), g(75.0, 8.0), g(40.0, 10.0)],
    classical_income_coef: 45.0,
};
const GROWTH_MARKET: BucketParams = BucketParams {
    categories: [g(80.0, 6.0), g(55.0, 12.0), g(25.0, 8.0), g(65.0, 10.0), g(50.0, 8.0)],
    classical_income_coef: 30.0,
};
const OTHER: BucketParams = BucketParams {
    categories: [g(75.0, 10.0), g(50.0, 15.0), g(30.0, 10.0), g(60.0, 12.0), g(35.0, 10.0)],
    classical_income_coef: 35.0,
};

static DEFAULT_MEMBERSHIP: Lazy<Vec<(CohortBucket, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (CohortBucket::TechHub, vec!["California", "Washington"]),
        (
            CohortBucket::MetroDiversity,
            vec!["New York", "New Jersey", "Illinois", "Massachusetts"],
        ),
        (
            CohortBucket::GrowthMarket,
            vec!["Texas", "Georgia", "North Carolina", "Virginia", "Florida"],
        ),
    ]
});

static DEFAULT_ABBREVIATIONS: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("Alabama", "AL"), ("Alaska", "AK"), ("Arizona", "AZ"), ("Arkansas", "AR"),
        ("California", "CA"), ("Colorado", "CO"), ("Connecticut", "CT"), ("Delaware", "DE"),
        ("District of Columbia", "DC"), ("Florida", "FL"), ("Georgia", "GA"), ("Hawaii", "HI"),
        ("Idaho", "ID"), ("Illinois", "IL"), ("Indiana", "IN"), ("Iowa", "IA"),
        ("Kansas", "KS"), ("Kentucky", "KY"), ("Louisiana", "LA"), ("Maine", "ME"),
        ("Maryland", "MD"), ("Massachusetts", "MA"), ("Michigan", "MI"), ("Minnesota", "MN"),
        ("Mississippi", "MS"), ("Missouri", "MO"), ("Montana", "MT"), ("Nebraska", "NE"),
        ("Nevada", "NV"), ("New Hampshire", "NH"), ("New Jersey", "NJ"), ("New Mexico", "NM"),
        ("New York", "NY"), ("North Carolina", "NC"), ("North Dakota", "ND"), ("Ohio", "OH"),
        ("Oklahoma", "OK"), ("Oregon", "OR"), ("Pennsylvania", "PA"), ("Rhode Island", "RI"),
        ("South Carolina", "SC"), ("South Dakota", "SD"), ("Tennessee", "TN"), ("Texas", "TX"),
        ("Utah", "UT"), ("Vermont", "VT"), ("Virginia", "VA"), ("Washington", "WA"),
        ("West Virginia", "WV"), ("Wisconsin", "WI"), ("Wyoming", "WY"),
    ]
    .into_iter()
    .collect()
});

// ============================================================================
// Profile Config
// ============================================================================

/// Resolved configuration passed into profile generation and reporting
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Only the `top_n` most populous states receive a profile
    pub top_n: usize,
    pub seed: u64,
    membership: FxHashMap<String, CohortBucket>,
    abbreviations: FxHashMap<String, String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let mut config = Self {
            top_n: DEFAULT_TOP_N,
            seed: DEFAULT_SEED,
            membership: FxHashMap::default(),
            abbreviations: DEFAULT_ABBREVIATIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        for (bucket, states) in DEFAULT_MEMBERSHIP.iter() {
            for state in states {
                config.membership.insert(state.to_string(), *bucket);
            }
        }
        config
    }
}

impl ProfileConfig {
    /// Bucket for a state; states in no bucket fall into `Other`
    pub fn bucket_for(&self, state_name: &str) -> CohortBucket {
        self.membership
            .get(state_name)
            .copied()
            .unwrap_or(CohortBucket::Other)
    }

    /// Apply bucket lists, given in precedence order, over the current
    /// membership. A listed bucket loses its previous members and a listed
    /// state leaves whatever bucket it was in. A state listed twice keeps
    /// its first bucket.
    pub fn set_buckets(&mut self, lists: Vec<(CohortBucket, Vec<String>)>) {
        for (bucket, _) in &lists {
            self.membership.retain(|_, b| *b != *bucket);
        }
        let mut listed: FxHashMap<String, CohortBucket> = FxHashMap::default();
        for (bucket, states) in lists {
            for state in states {
                if let Some(&kept) = listed.get(&state) {
                    warn!(state = %state, ?kept, ignored = ?bucket, "state listed in two buckets");
                    continue;
                }
                listed.insert(state.clone(), bucket);
                self.membership.insert(state, bucket);
            }
        }
    }

    /// Two-letter code from the row itself, falling back to the configured table
    pub fn abbreviation<'a>(&'a self, state: &'a StateDemographic) -> Option<&'a str> {
        state
            .state_abbr
            .as_deref()
            .or_else(|| self.abbreviations.get(&state.state_name).map(String::as_str))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(top_n) = file.top_n {
            config.top_n = top_n;
        }
        if let Some(seed) = file.seed {
            config.seed = seed;
        }
        if let Some(buckets) = file.buckets {
            if buckets.other.is_some() {
                bail!("'other' is the fallback bucket and takes no members");
            }
            let lists = [
                (CohortBucket::TechHub, buckets.tech_hub),
                (CohortBucket::MetroDiversity, buckets.metro_diversity),
                (CohortBucket::GrowthMarket, buckets.growth_market),
            ];
            config.set_buckets(
                lists
                    .into_iter()
                    .filter_map(|(bucket, states)| states.map(|s| (bucket, s)))
                    .collect(),
            );
        }
        if let Some(abbreviations) = file.abbreviations {
            for (state, abbr) in abbreviations {
                if !is_state_abbr(&abbr) {
                    bail!("abbreviation for '{}' must be two capital letters, got '{}'", state, abbr);
                }
                config.abbreviations.insert(state, abbr);
            }
        }
        Ok(config)
    }
}

/// On-disk shape of the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    top_n: Option<usize>,
    seed: Option<u64>,
    buckets: Option<BucketsFile>,
    abbreviations: Option<FxHashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BucketsFile {
    tech_hub: Option<Vec<String>>,
    metro_diversity: Option<Vec<String>>,
    growth_market: Option<Vec<String>>,
    other: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buckets() {
        let config = ProfileConfig::default();
        assert_eq!(config.bucket_for("California"), CohortBucket::TechHub);
        assert_eq!(config.bucket_for("Washington"), CohortBucket::TechHub);
        assert_eq!(config.bucket_for("New Jersey"), CohortBucket::MetroDiversity);
        assert_eq!(config.bucket_for("Texas"), CohortBucket::GrowthMarket);
        assert_eq!(config.bucket_for("Ohio"), CohortBucket::Other);
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_bucket_table_values() {
        let tech = CohortBucket::TechHub.params();
        assert_eq!(tech.categories[1], g(85.0, 5.0));
        assert_eq!(tech.classical_income_coef, 35.0);
        let other = CohortBucket::Other.params();
        assert_eq!(other.categories[1], g(50.0, 15.0));
        assert_eq!(CohortBucket::MetroDiversity.params().classical_income_coef, 45.0);
    }

    #[test]
    fn test_toml_overrides() {
        let config = ProfileConfig::from_toml(
            r#"
            top_n = 5
            seed = 7

            [buckets]
            tech_hub = ["Oregon"]

            [abbreviations]
            Oregon = "OR"
            "#,
        )
        .unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.bucket_for("Oregon"), CohortBucket::TechHub);
        assert_eq!(config.bucket_for("California"), CohortBucket::Other);
        // untouched buckets keep defaults
        assert_eq!(config.bucket_for("Texas"), CohortBucket::GrowthMarket);
    }

    #[test]
    fn test_toml_list_moves_state_out_of_default_bucket() {
        let config = ProfileConfig::from_toml(
            r#"
            [buckets]
            metro_diversity = ["California", "Ohio"]
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket_for("California"), CohortBucket::MetroDiversity);
        assert_eq!(config.bucket_for("Ohio"), CohortBucket::MetroDiversity);
        assert_eq!(config.bucket_for("New York"), CohortBucket::Other);
        assert_eq!(config.bucket_for("Washington"), CohortBucket::TechHub);
    }

    #[test]
    fn test_toml_state_in_two_buckets_keeps_first() {
        let config = ProfileConfig::from_toml(
            r#"
            [buckets]
            tech_hub = ["Oregon"]
            growth_market = ["Oregon", "Ohio"]
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket_for("Oregon"), CohortBucket::TechHub);
        assert_eq!(config.bucket_for("Ohio"), CohortBucket::GrowthMarket);
    }

    #[test]
    fn test_toml_rejects_bad_abbreviation() {
        assert!(ProfileConfig::from_toml("[abbreviations]\nOregon = \"or\"\n").is_err());
        assert!(ProfileConfig::from_toml("[abbreviations]\nOregon = \"ORE\"\n").is_err());
    }

    #[test]
    fn test_toml_rejects_other_members() {
        assert!(ProfileConfig::from_toml("[buckets]\nother = [\"Ohio\"]\n").is_err());
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        assert!(ProfileConfig::from_toml("seeds = 3\n").is_err());
    }

    #[test]
    fn test_abbreviation_prefers_row_value() {
        let config = ProfileConfig::default();
        let mut state = StateDemographic::new("California", 10, 1.0);
        assert_eq!(config.abbreviation(&state), Some("CA"));
        state.state_abbr = Some("XX".to_string());
        assert_eq!(config.abbreviation(&state), Some("XX"));
        let unknown = StateDemographic::new("Atlantis", 10, 1.0);
        assert_eq!(config.abbreviation(&unknown), None);
    }
}
