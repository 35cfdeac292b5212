//! Playlist search term → music category classification.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::models::{Category, PlaylistRecord};

/// Known search terms and their categories. Matching is exact.
pub static SEARCH_TERM_CATEGORIES: Lazy<FxHashMap<&'static str, Category>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    // Bollywood / Hindi film music
    m.insert("bollywood", Category::BollywoodHindi);
    m.insert("bollywood hits", Category::BollywoodHindi);
    m.insert("hindi songs", Category::BollywoodHindi);
    m.insert("arijit singh", Category::BollywoodHindi);
    // South Indian film music
    m.insert("tamil songs", Category::SouthIndian);
    m.insert("telugu songs", Category::SouthIndian);
    m.insert("malayalam songs", Category::SouthIndian);
    m.insert("kannada songs", Category::SouthIndian);
    // Classical traditions
    m.insert("carnatic", Category::Classical);
    m.insert("hindustani classical", Category::Classical);
    m.insert("indian classical", Category::Classical);
    // Regional and folk
    m.insert("punjabi", Category::RegionalFolk);
    m.insert("bhangra", Category::RegionalFolk);
    m.insert("gujarati garba", Category::RegionalFolk);
    m.insert("bengali folk", Category::RegionalFolk);
    // Devotional
    m.insert("bhajan", Category::Devotional);
    m.insert("kirtan", Category::Devotional);
    m.insert("devotional songs", Category::Devotional);
    m
});

/// Category for a playlist search term. Any term not in the table,
/// including case or whitespace variants, is `Unclassified`.
pub fn classify(search_term: &str) -> Category {
    match SEARCH_TERM_CATEGORIES.get(search_term) {
        Some(&category) => category,
        None => {
            debug!(term = search_term, "unclassified search term");
            Category::Unclassified
        }
    }
}

pub fn playlist_category(playlist: &PlaylistRecord) -> Category {
    classify(&playlist.search_term)
}

/// Number of playlists that map to one of the scored categories
pub fn classified_count(playlists: &[PlaylistRecord]) -> usize {
    playlists
        .iter()
        .filter(|p| playlist_category(p) != Category::Unclassified)
        .count()
}

/// Playlist count per category, in category order, omitting empty ones.
pub fn category_distribution(playlists: &[PlaylistRecord]) -> Vec<(Category, usize)> {
    let mut counts: FxHashMap<Category, usize> = FxHashMap::default();
    for playlist in playlists {
        *counts.entry(playlist_category(playlist)).or_default() += 1;
    }
    let mut dist: Vec<(Category, usize)> = counts.into_iter().collect();
    dist.sort_by_key(|(category, _)| *category);
    dist
}

/// Raw search term frequencies, most frequent first; ties keep first appearance.
pub fn search_term_counts(playlists: &[PlaylistRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    for playlist in playlists {
        match index.get(playlist.search_term.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(&playlist.search_term, counts.len());
                counts.push((playlist.search_term.clone(), 1));
            }
        }
    }
    // Stable sort keeps first-appearance order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
