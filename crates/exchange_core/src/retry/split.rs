//! Date-range bisection for count-limited finds.
//!
//! # Invariants
//! - Both halves are strictly shorter than the input, share the midpoint
//!   as their common boundary and together cover the input exactly.
//! - Intervals no longer than the minimum granularity are never split.

use crate::model::interval::DateInterval;
use chrono::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeSplitter {
    min_granularity: Duration,
}

impl DateRangeSplitter {
    /// Non-positive granularities are raised to one second.
    pub fn new(min_granularity: Duration) -> Self {
        Self {
            min_granularity: min_granularity.max(Duration::seconds(1)),
        }
    }

    pub fn min_granularity(&self) -> Duration {
        self.min_granularity
    }

    /// Bisects `interval`, or returns `None` when it is irreducible.
    pub fn split(&self, interval: &DateInterval) -> Option<(DateInterval, DateInterval)> {
        let duration = interval.duration();
        if duration <= self.min_granularity {
            return None;
        }
        interval.cut_at(interval.start() + duration / 2)
    }
}

impl Default for DateRangeSplitter {
    fn default() -> Self {
        Self::new(Duration::days(1))
    }
}

#[cfg(test)]
mod tests {
    use super::DateRangeSplitter;
    use crate::model::interval::DateInterval;
    use chrono::{Duration, TimeZone, Utc};

    fn interval(start_secs: i64, len_secs: i64) -> DateInterval {
        let start = Utc.timestamp_opt(start_secs, 0).unwrap();
        DateInterval::new(start, start + Duration::seconds(len_secs)).unwrap()
    }

    #[test]
    fn halves_cover_input_without_gap_or_overlap() {
        let splitter = DateRangeSplitter::new(Duration::seconds(1));
        for len in [2, 3, 7, 86_401, 604_800, 31_536_001] {
            let whole = interval(1_700_000_000, len);
            let (left, right) = splitter.split(&whole).expect("splittable");
            assert_eq!(left.start(), whole.start());
            assert_eq!(left.end(), right.start());
            assert_eq!(right.end(), whole.end());
            assert!(left.duration() < whole.duration());
            assert!(right.duration() < whole.duration());
            assert_eq!(left.duration() + right.duration(), whole.duration());
        }
    }

    #[test]
    fn week_splits_into_half_weeks() {
        let splitter = DateRangeSplitter::default();
        let week = DateInterval::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let (left, right) = splitter.split(&week).unwrap();
        assert_eq!(left.end(), Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap());
        assert_eq!(right.start(), left.end());
    }

    #[test]
    fn intervals_at_or_below_granularity_are_irreducible() {
        let splitter = DateRangeSplitter::default();
        assert!(splitter.split(&interval(0, 86_400)).is_none());
        assert!(splitter.split(&interval(0, 3_600)).is_none());
        assert!(splitter.split(&interval(0, 0)).is_none());
        assert!(splitter.split(&interval(0, 86_401)).is_some());
    }

    #[test]
    fn repeated_splitting_terminates() {
        let splitter = DateRangeSplitter::default();
        let mut pending = vec![interval(0, 365 * 86_400)];
        let mut leaves = 0;
        while let Some(next) = pending.pop() {
            match splitter.split(&next) {
                Some((left, right)) => {
                    pending.push(left);
                    pending.push(right);
                }
                None => leaves += 1,
            }
        }
        assert!(leaves >= 365);
        assert!(leaves <= 512);
    }

    #[test]
    fn non_positive_granularity_is_raised() {
        let splitter = DateRangeSplitter::new(Duration::zero());
        assert_eq!(splitter.min_granularity(), Duration::seconds(1));
    }
}
