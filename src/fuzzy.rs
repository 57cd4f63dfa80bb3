use std::path::Path;

use crate::scanner::Directory;

// Scoring weights. Bonuses are additive on purpose: a candidate can collect
// substring, subsequence, and several word-boundary bonuses at once, and the
// stacking is what keeps short queries ranking well.
const EXACT_SUBSTRING_MULTIPLIER: i64 = 3;
const CHARACTER_MATCH_POINTS: i64 = 2;
const FULL_MATCH_BONUS: i64 = 5;
const WORD_BOUNDARY_BONUS: i64 = 4;

/// A directory scored against the current filter query. `match_indices` are
/// char offsets into the displayed path, used only for highlighting.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub directory: Directory,
    pub score: i64,
    pub match_indices: Vec<usize>,
}

/// Collapses the home-directory prefix to `~`. Both matching and rendering
/// operate on this display form.
pub fn display_path(full_path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = full_path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    full_path.display().to_string()
}

/// Scores and ranks `directories` against `query`.
///
/// An empty (trimmed) query returns every directory with score 0 in scan
/// order. Otherwise zero-scoring directories are dropped and the rest are
/// sorted by descending score alone; the sort is stable, so equal scores
/// keep their scan order.
pub fn match_directories(query: &str, directories: &[Directory]) -> Vec<MatchResult> {
    if query.trim().is_empty() {
        return directories
            .iter()
            .map(|directory| MatchResult {
                directory: directory.clone(),
                score: 0,
                match_indices: Vec::new(),
            })
            .collect();
    }

    let query_lower = query.to_lowercase();
    let query_chars: Vec<char> = query_lower.chars().collect();

    let mut results: Vec<MatchResult> = directories
        .iter()
        .filter_map(|directory| {
            let display = display_path(&directory.full_path);
            let (score, match_indices) = score_path(&display, &query_lower, &query_chars);
            if score > 0 {
                Some(MatchResult {
                    directory: directory.clone(),
                    score,
                    match_indices,
                })
            } else {
                None
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

fn score_path(display: &str, query_lower: &str, query_chars: &[char]) -> (i64, Vec<usize>) {
    let display_lower = display.to_lowercase();
    let mut score = 0;
    let mut match_indices = Vec::new();

    if display_lower.contains(query_lower) {
        score += query_chars.len() as i64 * EXACT_SUBSTRING_MULTIPLIER;
    }

    // Left-to-right single pass: every display char that matches the next
    // unmatched query char scores and records its position. A partially
    // consumed query still counts.
    let mut query_index = 0;
    for (index, ch) in display_lower.chars().enumerate() {
        if query_index >= query_chars.len() {
            break;
        }
        if ch == query_chars[query_index] {
            match_indices.push(index);
            score += CHARACTER_MATCH_POINTS;
            query_index += 1;
        }
    }

    if query_index == query_chars.len() {
        score += FULL_MATCH_BONUS;
    }

    for word in display.split(is_word_separator) {
        if word.to_lowercase().starts_with(query_lower) {
            score += WORD_BOUNDARY_BONUS;
        }
    }

    (score, match_indices)
}

fn is_word_separator(ch: char) -> bool {
    ch == '-' || ch == '_' || ch == '/' || ch.is_whitespace()
}
