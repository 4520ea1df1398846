//! Sort orders understood by Reddit listings and search.

use clap::ValueEnum;
use std::fmt;

/// The order in which Reddit returns posts or comments.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, ValueEnum)]
pub enum Sort {
    /// Currently popular.
    Hot,

    /// Most recent first.
    New,

    /// Gaining popularity.
    Rising,

    /// Highest score within a time window.
    Top,

    /// Most divisive within a time window.
    Controversial,

    /// Best match for a search query.
    Relevance,

    /// Most commented, for searches.
    Comments,
}

impl Sort {
    /// True if Reddit scopes this sort to a [time filter](crate::timefilter::TimeFilter).
    pub fn uses_time_filter(&self) -> bool {
        matches!(self, Sort::Top | Sort::Controversial)
    }

    /// The value Reddit expects in a path segment or `sort` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Hot => "hot",
            Sort::New => "new",
            Sort::Rising => "rising",
            Sort::Top => "top",
            Sort::Controversial => "controversial",
            Sort::Relevance => "relevance",
            Sort::Comments => "comments",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_only_uses_time_filters_for_top_and_controversial() {
        let scoped: Vec<_> = Sort::value_variants()
            .iter()
            .filter(|sort| sort.uses_time_filter())
            .collect();
        assert_eq!(scoped, vec![&Sort::Top, &Sort::Controversial]);
    }

    #[test]
    fn it_matches_command_line_names() {
        for sort in Sort::value_variants() {
            let name = sort.to_possible_value().unwrap();
            assert_eq!(name.get_name(), sort.as_str());
        }
    }
}
