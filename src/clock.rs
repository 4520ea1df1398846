// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! All things time-related.

pub use chrono::{DateTime, Utc};

/// Format used for calendar dates in every output format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Marks a thing that has a creation time.
pub trait HasDate {
    /// The time the item was created, as seconds since the Unix epoch (UTC).
    ///
    /// Reddit reports timestamps as floating-point numbers.
    fn created_utc(&self) -> f64;

    /// The calendar date (`YYYY-MM-DD`) the item was created, in UTC.
    fn created_date(&self) -> String {
        format_date(self.created_utc())
    }
}

/// Converts a Unix timestamp in seconds to a UTC date and time.
///
/// Fractional seconds are discarded. Timestamps that cannot be represented
/// fall back to the Unix epoch rather than failing.
pub fn timestamp_to_datetime(timestamp: f64) -> DateTime<Utc> {
    if !timestamp.is_finite() {
        return DateTime::UNIX_EPOCH;
    }
    DateTime::from_timestamp(timestamp.trunc() as i64, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Converts a Unix timestamp in seconds to a `YYYY-MM-DD` date in UTC.
///
/// # Examples
///
/// ```
/// use reddit_cli::clock::format_date;
/// assert_eq!(format_date(1_700_000_000.0), "2023-11-14");
/// ```
pub fn format_date(timestamp: f64) -> String {
    timestamp_to_datetime(timestamp)
        .format(DATE_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    mod format_date {
        use super::super::*;

        #[test]
        fn it_formats_a_timestamp_as_a_utc_date() {
            assert_eq!(format_date(1_206_993_326.0), "2008-03-31");
        }

        #[test]
        fn it_ignores_the_time_of_day() {
            // 2025-05-23T23:59:59Z, which is already the 24th east of UTC
            assert_eq!(format_date(1_748_044_799.0), "2025-05-23");
        }

        #[test]
        fn it_truncates_fractional_seconds() {
            assert_eq!(format_date(1_748_044_799.999), "2025-05-23");
        }

        #[test]
        fn it_falls_back_to_the_epoch_for_invalid_timestamps() {
            assert_eq!(format_date(f64::NAN), "1970-01-01");
            assert_eq!(format_date(f64::INFINITY), "1970-01-01");
            assert_eq!(format_date(1e300), "1970-01-01");
        }
    }

    mod has_date {
        use super::super::*;

        #[derive(Debug)]
        struct ThingWithDate {
            created_utc: f64,
        }

        impl HasDate for ThingWithDate {
            fn created_utc(&self) -> f64 {
                self.created_utc
            }
        }

        #[test]
        fn it_returns_its_creation_date() {
            let thing = ThingWithDate {
                created_utc: 1_276_582_426.0,
            };
            assert_eq!(thing.created_date(), "2010-06-15");
        }
    }
}
