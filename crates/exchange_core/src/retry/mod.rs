//! Retry orchestration: backoff, outcome classification, the retry driver
//! and date-range splitting.
//!
//! # Responsibility
//! - Drive remote calls to a single terminal result despite transient
//!   failures, identity rejections and count limits.
//!
//! # Invariants
//! - Only `Outcome::Fatal` and exhausted budgets surface to callers.
//!
//! # See also
//! - crate::paging for page-by-page retrieval on top of the driver.

pub mod backoff;
pub mod classify;
pub mod driver;
pub mod split;

pub use backoff::BackoffPolicy;
pub use classify::{classify, Outcome};
pub use driver::{CancellationToken, RetryDriver, Sleeper, ThreadSleeper};
pub use split::DateRangeSplitter;
