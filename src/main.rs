use anyhow::{Context, Result};
use clap::Parser;
use music_market::classify::{playlist_category, search_term_counts};
use music_market::config::ProfileConfig;
use music_market::dataset::DatasetCache;
use music_market::filter::{default_selection, filter_demographics, FilterParams};
use music_market::metrics::{self, build_report, MarketView};
use music_market::models::{MarketReport, PlaylistRecord, StateDemographic};
use music_market::profile::{PreferenceSource, SyntheticProfileGenerator, TableProfileSource};
use music_market::progress::{create_spinner, finish_phase, format_duration, set_log_only};
use music_market::safety::validate_output_path;
use std::path::PathBuf;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// States selected when `--states` is not given
const DEFAULT_SELECTION: usize = 5;

#[derive(Parser)]
#[command(name = "music-market")]
#[command(about = "Indian music market intelligence across US states")]
struct Args {
    /// Playlists CSV (playlist_name, search_term, total_tracks, followers)
    playlists: PathBuf,

    /// Demographics CSV (state_name, indian_population, median_income, median_rent[, state_abbr])
    demographics: PathBuf,

    /// Filter by state names (comma-separated); defaults to the most populous states
    #[arg(long)]
    states: Option<String>,

    /// Minimum market potential a state needs to be shown
    #[arg(long, default_value = "0")]
    min_potential: f64,

    /// Number of most populous states that receive a preference profile
    #[arg(long)]
    top_n: Option<usize>,

    /// Seed for synthetic preference profiles
    #[arg(long)]
    seed: Option<u64>,

    /// TOML profile configuration (buckets, abbreviations, top_n, seed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Measured preference scores CSV; replaces the synthetic generator
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Write the market report as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Hide spinners and print one line per phase
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let args = Args::parse();
    set_log_only(args.log_only);
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => ProfileConfig::from_file(path)?,
        None => ProfileConfig::default(),
    };
    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if let Some(output) = &args.output {
        let mut sources = vec![args.playlists.as_path(), args.demographics.as_path()];
        if let Some(prefs) = &args.preferences {
            sources.push(prefs.as_path());
        }
        validate_output_path(output, &sources)?;
    }

    // Phase 1: load
    let spinner = create_spinner("Phase 1: Loading tables");
    let mut cache = DatasetCache::new();
    let dataset = cache
        .dataset(&args.playlists, &args.demographics)
        .context("Failed to load source tables")?;
    finish_phase(
        &spinner,
        "load",
        format!(
            "Phase 1: Loaded {} playlists, {} states",
            dataset.playlists.len(),
            dataset.demographics.len()
        ),
    );

    // Phase 2: profiles + metrics
    let spinner = create_spinner("Phase 2: Computing market metrics");
    let source: Box<dyn PreferenceSource> = match &args.preferences {
        Some(path) => Box::new(
            TableProfileSource::load(path, config.top_n)
                .context("Failed to load preference table")?,
        ),
        None => Box::new(SyntheticProfileGenerator::new(config.clone())),
    };
    let profiles = source.profiles(&dataset.demographics);
    let rows = metrics::compute(&dataset.demographics, &profiles);
    info!(source = source.name(), profiled = profiles.len(), "profiles ready");
    finish_phase(
        &spinner,
        "metrics",
        format!("Phase 2: Computed {} market rows", rows.len()),
    );

    // Phase 3: filter
    let selection: Vec<String> = match &args.states {
        Some(s) => s
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        None => default_selection(&dataset.demographics, DEFAULT_SELECTION),
    };
    println!("Selected states: {:?}", selection);

    let params = FilterParams::new(selection, args.min_potential);
    let filtered = params.apply(&rows);
    let selected_states = filter_demographics(&dataset.demographics, &params.states);
    let view = MarketView::new(&filtered, &dataset.playlists);

    let report = build_report(&view, &selected_states, &dataset.playlists, &config);
    print_summary(&report, &selected_states, &dataset.playlists);

    if let Some(output) = &args.output {
        report
            .write_to_file(output)
            .with_context(|| format!("Failed to write report to {}", output.display()))?;
        println!("Report written to {}", output.display());
    }

    println!("Elapsed: {}", format_duration(start.elapsed()));
    Ok(())
}

fn print_summary(
    report: &MarketReport,
    selected_states: &[StateDemographic],
    playlists: &[PlaylistRecord],
) {
    let summary = &report.summary;

    println!("\n{:=<100}", "");
    println!(
        "States: {}   Playlists: {}   Population: {}",
        summary.state_count, summary.playlist_count, summary.total_population
    );
    println!("{:=<100}", "");

    if report.rows.is_empty() {
        println!("No states match the current filters.");
    } else {
        println!(
            "{:<4} {:<16} {:>10} {:<16} {:>8} {:>10} {:>9} {:>10} {:<6} {:>9} {:>8}",
            "", "State", "Population", "Dominant", "Strength", "Potential", "Cultural", "Invest",
            "Tier", "Rev($M)", "Gap"
        );
        println!("{:-<100}", "");
        for r in &report.rows {
            println!(
                "{:<4} {:<16} {:>10} {:<16} {:>8.1} {:>10.1} {:>9.1} {:>10.1} {:<6} {:>9.2} {:>8.2}",
                r.state_abbr.as_deref().unwrap_or("--"),
                r.state,
                r.indian_population,
                r.dominant_category.label(),
                r.category_strength,
                r.market_potential,
                r.cultural_index,
                r.investment_score,
                r.priority.to_string(),
                r.projected_revenue_musd,
                r.content_gap.unwrap_or(f64::NAN),
            );
        }
    }

    println!("\nTop states by Indian population:");
    for (rank, state) in report.top_states.iter().enumerate() {
        println!("  {:>2}. {:<20} {:>10}", rank + 1, state.state_name, state.indian_population);
    }

    println!("\nDemographics:");
    println!("  {:<20} {:>10} {:>12} {:>10}", "State", "Population", "Income", "Rent");
    for state in selected_states {
        println!(
            "  {:<20} {:>10} {:>12.0} {:>10.0}",
            state.state_name, state.indian_population, state.median_income, state.median_rent
        );
    }

    println!("\nMusic categories:");
    for (category, count) in &report.category_distribution {
        println!("  {:<16} {}", category.label(), count);
    }
    println!("\nSearch terms:");
    for (term, count) in search_term_counts(playlists) {
        println!("  {:<24} {}", term, count);
    }

    println!("\nPlaylists:");
    println!(
        "  {:<32} {:<24} {:<16} {:>7} {:>10}",
        "Name", "Search term", "Category", "Tracks", "Followers"
    );
    for playlist in playlists {
        println!(
            "  {:<32} {:<24} {:<16} {:>7} {:>10}",
            playlist.name,
            playlist.search_term,
            playlist_category(playlist).label(),
            playlist.total_tracks,
            playlist.followers
        );
    }
}
