//! Retry engine shared by every data-access operation.
//!
//! # Responsibility
//! - Run one unit of work until it succeeds, its retry budget is spent, its
//!   identity cannot be corrected, or it fails fatally.
//! - Split date-range work on count-limit errors and union the leaves.
//!
//! # Invariants
//! - One chain makes at most `max_retries + 1` calls. Identity rewrites
//!   consume budget like transient retries, and the resolver is not
//!   consulted once the budget is spent.
//! - No sleep happens after the final failed attempt.
//! - A principal is tried at most once per chain; a resolver proposing an
//!   already-tried identity ends the chain with the original error.
//! - Every split leaf starts a fresh chain.
//! - Cancellation is observed before each call and before each sleep.
//!
//! # See also
//! - crate::retry::classify for the outcome rules.

use crate::error::{DaoError, DaoResult, ExchangeError};
use crate::gateway::identity::IdentityResolver;
use crate::model::interval::DateInterval;
use crate::model::refs::Principal;
use crate::retry::backoff::BackoffPolicy;
use crate::retry::classify::{classify, Outcome};
use crate::retry::split::DateRangeSplitter;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Blocking wait used between retries.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Shared cancellation flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Why a single chain stopped without a value.
enum ChainStop {
    Failed(DaoError),
    Split {
        interval: DateInterval,
        error: ExchangeError,
    },
}

impl From<DaoError> for ChainStop {
    fn from(value: DaoError) -> Self {
        Self::Failed(value)
    }
}

pub struct RetryDriver<'a, R: ?Sized, S: ?Sized> {
    max_retries: u32,
    backoff: BackoffPolicy,
    resolver: &'a R,
    sleeper: &'a S,
    cancellation: &'a CancellationToken,
}

impl<'a, R, S> RetryDriver<'a, R, S>
where
    R: IdentityResolver + ?Sized,
    S: Sleeper + ?Sized,
{
    pub fn new(
        max_retries: u32,
        backoff: BackoffPolicy,
        resolver: &'a R,
        sleeper: &'a S,
        cancellation: &'a CancellationToken,
    ) -> Self {
        Self {
            max_retries,
            backoff,
            resolver,
            sleeper,
            cancellation,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Runs `work` under `principal`, rewriting `principal` in place when
    /// identity resolution succeeds.
    pub fn execute<T, F>(
        &self,
        operation: &'static str,
        principal: &mut Principal,
        work: F,
    ) -> DaoResult<T>
    where
        F: FnMut(&Principal) -> Result<T, ExchangeError>,
    {
        match self.run_chain(operation, principal, None, work) {
            Ok(value) => Ok(value),
            Err(ChainStop::Failed(err)) => Err(err),
            // Chains without an interval never classify as a split.
            Err(ChainStop::Split { error, .. }) => Err(DaoError::Fatal {
                operation,
                source: error,
            }),
        }
    }

    /// Runs date-range `work`, bisecting the interval whenever the server
    /// reports that the result count limit was exceeded.
    ///
    /// Leaf results are returned in chronological order of their intervals.
    pub fn execute_splitting<T, F>(
        &self,
        operation: &'static str,
        principal: &mut Principal,
        interval: DateInterval,
        splitter: &DateRangeSplitter,
        mut work: F,
    ) -> DaoResult<Vec<T>>
    where
        F: FnMut(&Principal, &DateInterval) -> Result<T, ExchangeError>,
    {
        let mut pending = vec![interval];
        let mut leaves = Vec::new();
        while let Some(current) = pending.pop() {
            let chain = self.run_chain(
                operation,
                principal,
                Some(&current),
                |principal: &Principal| work(principal, &current),
            );
            let stop = match chain {
                Ok(value) => {
                    leaves.push(value);
                    continue;
                }
                Err(stop) => stop,
            };

            match stop {
                ChainStop::Failed(err) => return Err(err),
                ChainStop::Split { interval, error } => match splitter.split(&interval) {
                    Some((left, right)) => {
                        warn!(
                            "event=range_split module=retry status=split op={} duration_secs={} kind={}",
                            operation,
                            interval.duration().num_seconds(),
                            error.kind()
                        );
                        pending.push(right);
                        pending.push(left);
                    }
                    None => {
                        error!(
                            "event=range_split module=retry status=error op={} reason=irreducible duration_secs={}",
                            operation,
                            interval.duration().num_seconds()
                        );
                        return Err(DaoError::SplitExhausted {
                            interval,
                            source: error,
                        });
                    }
                },
            }
        }
        Ok(leaves)
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), DaoError> {
        if self.cancellation.is_cancelled() {
            warn!("event=retry_chain module=retry status=cancelled op={operation}");
            return Err(DaoError::Cancelled { operation });
        }
        Ok(())
    }

    fn run_chain<T, F>(
        &self,
        operation: &'static str,
        principal: &mut Principal,
        interval: Option<&DateInterval>,
        mut work: F,
    ) -> Result<T, ChainStop>
    where
        F: FnMut(&Principal) -> Result<T, ExchangeError>,
    {
        let chain_id = Uuid::new_v4();
        let mut attempt: u32 = 0;
        let mut tried = vec![principal.clone()];

        loop {
            self.ensure_live(operation)?;
            match classify(work(&*principal), interval) {
                Outcome::Success(value) => {
                    if attempt > 0 {
                        info!(
                            "event=retry_chain module=retry status=ok op={} chain_id={} attempts={}",
                            operation,
                            chain_id,
                            attempt + 1
                        );
                    }
                    return Ok(value);
                }
                Outcome::RetryableTransient(err) => {
                    if attempt >= self.max_retries {
                        return Err(exhausted(operation, chain_id, attempt + 1, err));
                    }
                    let delay = self.backoff.delay_for_attempt(attempt + 1);
                    warn!(
                        "event=retry_chain module=retry status=retry op={} chain_id={} attempt={} delay_ms={} kind={}",
                        operation,
                        chain_id,
                        attempt + 1,
                        delay.as_millis(),
                        err.kind()
                    );
                    self.ensure_live(operation)?;
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
                Outcome::NeedsIdentityResolution(err) => {
                    if attempt >= self.max_retries {
                        return Err(exhausted(operation, chain_id, attempt + 1, err));
                    }
                    let resolved = match self.resolver.resolve_identity(principal) {
                        Ok(resolved) => resolved,
                        Err(resolve_err) => {
                            warn!(
                                "event=identity_resolve module=retry status=error op={} chain_id={} kind={}",
                                operation,
                                chain_id,
                                resolve_err.kind()
                            );
                            None
                        }
                    };
                    let next = match resolved {
                        Some(next) if !tried.iter().any(|seen| seen.same_mailbox(&next)) => next,
                        _ => {
                            error!(
                                "event=retry_chain module=retry status=error op={} chain_id={} reason=identity_unresolved attempts={}",
                                operation,
                                chain_id,
                                attempt + 1
                            );
                            return Err(ChainStop::Failed(DaoError::IdentityUnresolved {
                                principal: principal.clone(),
                                source: err,
                            }));
                        }
                    };
                    warn!(
                        "event=identity_resolve module=retry status=rewritten op={} chain_id={} attempt={}",
                        operation,
                        chain_id,
                        attempt + 1
                    );
                    tried.push(next.clone());
                    *principal = next;
                    attempt += 1;
                }
                Outcome::SplitAndRetry { interval, error } => {
                    return Err(ChainStop::Split { interval, error });
                }
                Outcome::Fatal(err) => {
                    error!(
                        "event=retry_chain module=retry status=error op={} chain_id={} reason=fatal attempts={} kind={}",
                        operation,
                        chain_id,
                        attempt + 1,
                        err.kind()
                    );
                    return Err(ChainStop::Failed(DaoError::Fatal {
                        operation,
                        source: err,
                    }));
                }
            }
        }
    }
}

fn exhausted(
    operation: &'static str,
    chain_id: Uuid,
    attempts: u32,
    source: ExchangeError,
) -> ChainStop {
    error!(
        "event=retry_chain module=retry status=error op={} chain_id={} reason=exhausted attempts={} kind={}",
        operation,
        chain_id,
        attempts,
        source.kind()
    );
    ChainStop::Failed(DaoError::RetriesExhausted {
        operation,
        attempts,
        source,
    })
}
