//! Date intervals consumed by date-range find operations.
//!
//! # Invariants
//! - `start <= end` always holds; construction and deserialization reject
//!   reversed windows.
//! - Intervals are half-open (`[start, end)`), so two halves sharing a
//!   boundary neither overlap nor leave a gap.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateInterval")]
pub struct DateInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawDateInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawDateInterval> for DateInterval {
    type Error = IntervalError;

    fn try_from(value: RawDateInterval) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}

impl DateInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns whether `instant` falls inside `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Cuts the interval at `at`, which must lie strictly inside it.
    pub(crate) fn cut_at(&self, at: DateTime<Utc>) -> Option<(Self, Self)> {
        if at <= self.start || at >= self.end {
            return None;
        }
        Some((
            Self {
                start: self.start,
                end: at,
            },
            Self {
                start: at,
                end: self.end,
            },
        ))
    }
}

impl Display for DateInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalError {
    Reversed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Display for IntervalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reversed { start, end } => write!(
                f,
                "interval end ({}) must be >= start ({})",
                end.to_rfc3339(),
                start.to_rfc3339()
            ),
        }
    }
}

impl Error for IntervalError {}

#[cfg(test)]
mod tests {
    use super::{DateInterval, IntervalError};
    use chrono::{TimeZone, Utc};

    #[test]
    fn rejects_reversed_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            DateInterval::new(start, end),
            Err(IntervalError::Reversed { start, end })
        );
    }

    #[test]
    fn contains_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let interval = DateInterval::new(start, end).unwrap();
        assert!(interval.contains(start));
        assert!(!interval.contains(end));
    }

    #[test]
    fn deserialize_rejects_reversed_window() {
        let value = serde_json::json!({
            "start": "2024-01-08T00:00:00Z",
            "end": "2024-01-01T00:00:00Z"
        });
        let err = serde_json::from_value::<DateInterval>(value).unwrap_err();
        assert!(
            err.to_string().contains("must be >= start"),
            "unexpected error: {err}"
        );
    }
}
