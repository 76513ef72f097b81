use crate::data::Location;
use crate::risk::{classify, RiskLevel};

/// Level predicate of the filter pipeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LevelFilter {
    #[default]
    All,
    Only(RiskLevel),
}

impl LevelFilter {
    pub fn matches(self, level: RiskLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => wanted == level,
        }
    }

    /// Legend-click semantics: picking the active level again goes back to All
    pub fn toggle(self, level: RiskLevel) -> Self {
        if self == LevelFilter::Only(level) {
            LevelFilter::All
        } else {
            LevelFilter::Only(level)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LevelFilter::All => "All Levels",
            LevelFilter::Only(level) => level.label(),
        }
    }
}

/// Does `location` satisfy the search query?
///
/// Names match case-insensitively, ids match as a literal substring of their
/// printed form. An empty query matches everything.
pub fn matches_query(location: &Location, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    location.name.to_lowercase().contains(&query.to_lowercase())
        || location.id.as_str().contains(query)
}

/// Narrow `locations` by level and search query, preserving input order
pub fn filter_locations(locations: &[Location], level: LevelFilter, query: &str) -> Vec<Location> {
    filter_indices(locations, level, query)
        .into_iter()
        .map(|i| locations[i].clone())
        .collect()
}

/// Same as [`filter_locations`] but yields positions into `locations`
pub fn filter_indices(locations: &[Location], level: LevelFilter, query: &str) -> Vec<usize> {
    locations
        .iter()
        .enumerate()
        .filter(|(_, loc)| level.matches(classify(loc.risk_score)))
        .filter(|(_, loc)| matches_query(loc, query))
        .map(|(i, _)| i)
        .collect()
}
