//! Loading of the playlist and demographics tables.
//!
//! Loads are all-or-nothing: the first bad record aborts the whole table
//! with a [`DataLoadError`] naming the file. [`DatasetCache`] memoizes loaded
//! tables by file identity so repeated recomputations do not touch disk.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::error::{DataLoadError, Result};
use crate::models::{PlaylistRecord, StateDemographic};

// ============================================================================
// Schemas
// ============================================================================

pub const PLAYLIST_COLUMNS: [&str; 4] = ["playlist_name", "search_term", "total_tracks", "followers"];

pub const DEMOGRAPHIC_COLUMNS: [&str; 4] = [
    "state_name",
    "indian_population",
    "median_income",
    "median_rent",
];

static STATE_ABBR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// Two capital letters, as in `CA`
pub(crate) fn is_state_abbr(abbr: &str) -> bool {
    STATE_ABBR.is_match(abbr)
}

// ============================================================================
// CSV Reading
// ============================================================================

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// Read every record of `path` as `T`, after checking the header row carries
/// all `required` columns. Returns each row with its 1-based line number.
pub(crate) fn read_rows<T: DeserializeOwned>(
    path: &Path,
    required: &[&'static str],
) -> Result<Vec<(u64, T)>> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Malformed {
            path: path.to_path_buf(),
            line: 1,
            source,
        })?
        .clone();

    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(DataLoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| DataLoadError::Malformed {
            path: path.to_path_buf(),
            line: source.position().map_or(0, |p| p.line()),
            source,
        })?;
        let line = record.position().map_or(0, |p| p.line());
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|source| DataLoadError::Malformed {
                path: path.to_path_buf(),
                line,
                source,
            })?;
        rows.push((line, row));
    }
    Ok(rows)
}

// ============================================================================
// Table Loaders
// ============================================================================

pub fn load_playlists(path: &Path) -> Result<Vec<PlaylistRecord>> {
    let rows = read_rows::<PlaylistRecord>(path, &PLAYLIST_COLUMNS)?;
    let playlists: Vec<PlaylistRecord> = rows.into_iter().map(|(_, p)| p).collect();
    info!(path = %path.display(), count = playlists.len(), "loaded playlists");
    Ok(playlists)
}

pub fn load_demographics(path: &Path) -> Result<Vec<StateDemographic>> {
    let rows = read_rows::<StateDemographic>(path, &DEMOGRAPHIC_COLUMNS)?;

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut states = Vec::with_capacity(rows.len());
    for (line, state) in rows {
        validate_demographic(path, line, &state)?;
        if !seen.insert(state.state_name.clone()) {
            return Err(DataLoadError::DuplicateState {
                path: path.to_path_buf(),
                state: state.state_name,
            });
        }
        states.push(state);
    }

    info!(path = %path.display(), count = states.len(), "loaded demographics");
    Ok(states)
}

fn validate_demographic(path: &Path, line: u64, state: &StateDemographic) -> Result<()> {
    let invalid = |reason: String| DataLoadError::InvalidValue {
        path: path.to_path_buf(),
        line,
        reason,
    };

    if state.state_name.is_empty() {
        return Err(invalid("empty state_name".to_string()));
    }
    if !(state.median_income.is_finite() && state.median_income > 0.0) {
        return Err(invalid(format!(
            "median_income must be positive, got {}",
            state.median_income
        )));
    }
    if !(state.median_rent.is_finite() && state.median_rent >= 0.0) {
        return Err(invalid(format!(
            "median_rent must be non-negative, got {}",
            state.median_rent
        )));
    }
    if let Some(abbr) = &state.state_abbr {
        if !is_state_abbr(abbr) {
            return Err(invalid(format!("state_abbr '{}' is not two capital letters", abbr)));
        }
    }
    Ok(())
}

// ============================================================================
// Raw Dataset
// ============================================================================

/// The two source tables, shared read-only.
#[derive(Clone, Debug)]
pub struct RawDataset {
    pub playlists: Arc<[PlaylistRecord]>,
    pub demographics: Arc<[StateDemographic]>,
}

// ============================================================================
// Memoization
// ============================================================================

/// Identity of a file on disk at load time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CacheEntry<T> {
    stamp: FileStamp,
    rows: Arc<[T]>,
}

/// Process-wide memo of loaded tables, keyed by canonical path and file stamp.
///
/// A table is re-read when its modification time or length changes, or after
/// an explicit [`DatasetCache::invalidate`] / [`DatasetCache::clear`].
#[derive(Default)]
pub struct DatasetCache {
    playlists: FxHashMap<PathBuf, CacheEntry<PlaylistRecord>>,
    demographics: FxHashMap<PathBuf, CacheEntry<StateDemographic>>,
    loads: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playlists(&mut self, path: &Path) -> Result<Arc<[PlaylistRecord]>> {
        get_or_load(&mut self.playlists, &mut self.loads, path, load_playlists)
    }

    pub fn demographics(&mut self, path: &Path) -> Result<Arc<[StateDemographic]>> {
        get_or_load(&mut self.demographics, &mut self.loads, path, load_demographics)
    }

    /// Both tables as a [`RawDataset`]
    pub fn dataset(&mut self, playlists: &Path, demographics: &Path) -> Result<RawDataset> {
        Ok(RawDataset {
            playlists: self.playlists(playlists)?,
            demographics: self.demographics(demographics)?,
        })
    }

    /// Drop any cached table loaded from `path`
    pub fn invalidate(&mut self, path: &Path) {
        let key = cache_key(path);
        self.playlists.remove(&key);
        self.demographics.remove(&key);
    }

    pub fn clear(&mut self) {
        self.playlists.clear();
        self.demographics.clear();
    }

    /// Number of disk reads performed so far
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn get_or_load<T>(
    entries: &mut FxHashMap<PathBuf, CacheEntry<T>>,
    loads: &mut usize,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<Vec<T>>,
) -> Result<Arc<[T]>> {
    let key = cache_key(path);
    let stamp = FileStamp::of(path)?;

    if let Some(entry) = entries.get(&key) {
        if entry.stamp == stamp {
            debug!(path = %path.display(), "table cache hit");
            return Ok(Arc::clone(&entry.rows));
        }
        debug!(path = %path.display(), "table changed on disk, reloading");
    }

    let rows: Arc<[T]> = load(path)?.into();
    *loads += 1;
    entries.insert(
        key,
        CacheEntry {
            stamp,
            rows: Arc::clone(&rows),
        },
    );
    Ok(rows)
}
