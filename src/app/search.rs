use std::cmp::Ordering;

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32String};

#[derive(Debug, Clone, Copy)]
struct Ranked {
    index: usize,
    score: u16,
    exact: bool,
    case_hits: usize,
    first_match: u32,
    len: usize,
}

impl Ranked {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(other.exact.cmp(&self.exact))
            .then(other.case_hits.cmp(&self.case_hits))
            .then(self.first_match.cmp(&other.first_match))
            .then(self.len.cmp(&other.len))
            .then(self.index.cmp(&other.index))
    }
}

/// Fuzzy-filters `inventory` by `query`, best match first.
///
/// A candidate matches when every character of the query appears in it in
/// order, ignoring case. Matches are ordered by score (contiguous runs and
/// word-boundary hits score higher), then by exact case-sensitive equality,
/// then by how many matched characters also agree in case, then by how early
/// the match starts, then by candidate length, then by inventory order.
///
/// Leading and trailing whitespace in `query` is ignored, so `" com "` searches
/// for `"com"`. An empty or whitespace-only query returns the inventory
/// unchanged.
pub fn fuzzy_filter(inventory: &[String], query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return inventory.to_vec();
    }
    let query_chars: Vec<char> = query.chars().collect();

    // Atom rather than Pattern::parse: package names are matched literally, no
    // `^`/`$`/`!` operators.
    let atom = Atom::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
        false,
    );
    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut indices: Vec<u32> = Vec::new();

    let mut ranked: Vec<Ranked> = inventory
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            indices.clear();
            let haystack = Utf32String::from(candidate.as_str());
            let score = atom.indices(haystack.slice(..), &mut matcher, &mut indices)?;
            indices.sort_unstable();
            let candidate_chars: Vec<char> = candidate.chars().collect();
            let case_hits = indices
                .iter()
                .zip(&query_chars)
                .filter(|(at, wanted)| candidate_chars.get(**at as usize) == Some(*wanted))
                .count();
            Some(Ranked {
                index,
                score,
                exact: candidate == query,
                case_hits,
                first_match: indices.iter().copied().min().unwrap_or(0),
                len: candidate.chars().count(),
            })
        })
        .collect();

    ranked.sort_by(Ranked::rank);
    ranked
        .into_iter()
        .map(|entry| inventory[entry.index].clone())
        .collect()
}
