//! Pure mapping of one call result onto the retry decision.
//!
//! # Invariants
//! - Matching on `ExchangeErrorKind` is exhaustive; a new kind must be
//!   placed explicitly.
//! - Count-limit errors only split when the call had an interval to split.

use crate::error::{ExchangeError, ExchangeErrorKind};
use crate::model::interval::DateInterval;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    RetryableTransient(ExchangeError),
    NeedsIdentityResolution(ExchangeError),
    SplitAndRetry {
        interval: DateInterval,
        error: ExchangeError,
    },
    Fatal(ExchangeError),
}

pub fn classify<T>(
    result: Result<T, ExchangeError>,
    split_interval: Option<&DateInterval>,
) -> Outcome<T> {
    let error = match result {
        Ok(value) => return Outcome::Success(value),
        Err(error) => error,
    };
    match error.kind() {
        ExchangeErrorKind::InvalidPrincipal => Outcome::NeedsIdentityResolution(error),
        ExchangeErrorKind::ExceededFindCountLimit => match split_interval {
            Some(interval) => Outcome::SplitAndRetry {
                interval: *interval,
                error,
            },
            None => Outcome::Fatal(error),
        },
        ExchangeErrorKind::Timeout
        | ExchangeErrorKind::InternalServerError
        | ExchangeErrorKind::MissingEmailAddress
        | ExchangeErrorKind::CannotDeleteObject
        | ExchangeErrorKind::ItemNotFound
        | ExchangeErrorKind::Other => Outcome::RetryableTransient(error),
        ExchangeErrorKind::Unrecognized => Outcome::Fatal(error),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Outcome};
    use crate::error::{ExchangeError, ExchangeErrorKind};
    use crate::model::interval::DateInterval;
    use chrono::{TimeZone, Utc};

    fn failed(kind: ExchangeErrorKind) -> Result<(), ExchangeError> {
        Err(ExchangeError::new(kind, "scripted"))
    }

    fn week() -> DateInterval {
        DateInterval::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn success_passes_value_through() {
        assert_eq!(classify::<u8>(Ok(7), None), Outcome::Success(7));
    }

    #[test]
    fn invalid_principal_needs_identity_resolution() {
        let interval = week();
        assert!(matches!(
            classify(failed(ExchangeErrorKind::InvalidPrincipal), Some(&interval)),
            Outcome::NeedsIdentityResolution(_)
        ));
    }

    #[test]
    fn count_limit_splits_only_with_an_interval() {
        let interval = week();
        match classify(failed(ExchangeErrorKind::ExceededFindCountLimit), Some(&interval)) {
            Outcome::SplitAndRetry { interval: got, .. } => assert_eq!(got, interval),
            other => panic!("expected split, got {other:?}"),
        }
        assert!(matches!(
            classify(failed(ExchangeErrorKind::ExceededFindCountLimit), None),
            Outcome::Fatal(_)
        ));
    }

    #[test]
    fn known_application_errors_are_transient() {
        for kind in [
            ExchangeErrorKind::Timeout,
            ExchangeErrorKind::InternalServerError,
            ExchangeErrorKind::MissingEmailAddress,
            ExchangeErrorKind::CannotDeleteObject,
            ExchangeErrorKind::ItemNotFound,
            ExchangeErrorKind::Other,
        ] {
            assert!(
                matches!(classify(failed(kind), None), Outcome::RetryableTransient(_)),
                "{kind} should be retried"
            );
        }
    }

    #[test]
    fn unrecognized_errors_are_fatal() {
        assert!(matches!(
            classify(failed(ExchangeErrorKind::Unrecognized), None),
            Outcome::Fatal(_)
        ));
    }
}
