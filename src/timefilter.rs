// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reddit's fixed look-back windows for `top` and `controversial` sorts.

use clap::ValueEnum;
use std::fmt;

/// A time filter ("t" parameter) accepted by Reddit listings.
///
/// Variants are declared from the shortest to the longest window, so the
/// derived ordering follows window size.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, ValueEnum)]
pub enum TimeFilter {
    /// The last 24 hours.
    Day,

    /// The last seven days.
    #[default]
    Week,

    /// The last 30 days.
    Month,

    /// The last 365 days.
    Year,

    /// All time.
    All,
}

/// The result of mapping an arbitrary day count onto a [`TimeFilter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snap {
    /// The selected time filter.
    pub filter: TimeFilter,

    /// True if the requested day count did not exactly match the size of
    /// the selected filter.
    pub snapped: bool,
}

impl TimeFilter {
    /// Maps a number of days to the smallest window that covers it.
    ///
    /// Values are floored to the next bucket boundary rather than to the
    /// closest bucket: 20 days maps to a month, not a week.
    ///
    /// # Examples
    ///
    /// ```
    /// use reddit_cli::timefilter::TimeFilter;
    /// assert_eq!(TimeFilter::from_days(7).filter, TimeFilter::Week);
    /// assert_eq!(TimeFilter::from_days(20).filter, TimeFilter::Month);
    /// assert!(TimeFilter::from_days(20).snapped);
    /// ```
    pub fn from_days(days: i64) -> Snap {
        let filter = match days {
            i64::MIN..=1 => TimeFilter::Day,
            2..=7 => TimeFilter::Week,
            8..=30 => TimeFilter::Month,
            31..=365 => TimeFilter::Year,
            _ => TimeFilter::All,
        };
        let snapped = filter.days().is_some_and(|canonical| canonical != days);
        Snap { filter, snapped }
    }

    /// Number of days covered by the window, or `None` for [`TimeFilter::All`].
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeFilter::Day => Some(1),
            TimeFilter::Week => Some(7),
            TimeFilter::Month => Some(30),
            TimeFilter::Year => Some(365),
            TimeFilter::All => None,
        }
    }

    /// The value Reddit expects in the `t` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
