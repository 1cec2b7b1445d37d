//! Error taxonomy for remote calls and data-access operations.
//!
//! # Responsibility
//! - Describe failures raised by Transport and response parsing
//!   (`ExchangeError`).
//! - Describe the single terminal failure a data-access caller can observe
//!   (`DaoError`).
//!
//! # Invariants
//! - Recoverable `ExchangeError`s never surface through `DaoError` unless
//!   the retry budget, identity resolution or splitting is exhausted.
//! - Every `DaoError` that wraps an `ExchangeError` keeps it as `source()`.

use crate::model::interval::DateInterval;
use crate::model::refs::Principal;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DaoResult<T> = Result<T, DaoError>;

/// Closed set of failure kinds reported by Transport and parsers.
///
/// The outcome classifier matches on this enum exhaustively, so a new kind
/// cannot be added without deciding how it is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeErrorKind {
    Timeout,
    InternalServerError,
    MissingEmailAddress,
    CannotDeleteObject,
    ItemNotFound,
    ExceededFindCountLimit,
    /// Ambiguous or unresolvable mailbox identity.
    InvalidPrincipal,
    /// Generic failure reported by the server.
    Other,
    /// Failure the transport or parser could not classify.
    Unrecognized,
}

impl ExchangeErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::InternalServerError => "internal_server_error",
            Self::MissingEmailAddress => "missing_email_address",
            Self::CannotDeleteObject => "cannot_delete_object",
            Self::ItemNotFound => "item_not_found",
            Self::ExceededFindCountLimit => "exceeded_find_count_limit",
            Self::InvalidPrincipal => "invalid_principal",
            Self::Other => "other",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl Display for ExchangeErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeError {
    kind: ExchangeErrorKind,
    message: String,
}

impl ExchangeError {
    pub fn new(kind: ExchangeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::new(ExchangeErrorKind::Unrecognized, message)
    }

    pub fn kind(&self) -> ExchangeErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "exchange call failed ({}): {}", self.kind, self.message)
    }
}

impl Error for ExchangeError {}

/// Terminal failure of one data-access operation.
#[derive(Debug)]
pub enum DaoError {
    /// Caller input violated an operation precondition; nothing was sent.
    InvalidArgument(String),
    /// Transient failures persisted past the retry budget.
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        source: ExchangeError,
    },
    /// The principal was rejected and could not be rewritten to a new one.
    IdentityUnresolved {
        principal: Principal,
        source: ExchangeError,
    },
    /// The call failed with a kind that is never retried.
    Fatal {
        operation: &'static str,
        source: ExchangeError,
    },
    /// A count-limit error on an interval too small to split again.
    SplitExhausted {
        interval: DateInterval,
        source: ExchangeError,
    },
    /// Paging did not advance or exceeded the configured page budget.
    PagingStalled {
        operation: &'static str,
        pages: u32,
        offset: u32,
    },
    Cancelled {
        operation: &'static str,
    },
    /// Server reply contradicts the request (e.g. create returned no id).
    InconsistentState(&'static str),
}

impl DaoError {
    /// Returns the remote error that ended the operation, if any.
    pub fn exchange_error(&self) -> Option<&ExchangeError> {
        match self {
            Self::RetriesExhausted { source, .. }
            | Self::IdentityUnresolved { source, .. }
            | Self::Fatal { source, .. }
            | Self::SplitExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::RetriesExhausted {
                operation,
                attempts,
                source,
            } => write!(
                f,
                "{operation} failed after {attempts} consecutive attempts: {source}"
            ),
            Self::IdentityUnresolved { principal, source } => {
                write!(f, "principal `{principal}` could not be resolved: {source}")
            }
            Self::Fatal { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::SplitExhausted { interval, source } => write!(
                f,
                "result count limit exceeded for irreducible interval {interval}: {source}"
            ),
            Self::PagingStalled {
                operation,
                pages,
                offset,
            } => write!(
                f,
                "{operation} paging stalled after {pages} pages at offset {offset}"
            ),
            Self::Cancelled { operation } => write!(f, "{operation} was cancelled"),
            Self::InconsistentState(details) => write!(f, "inconsistent server state: {details}"),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.exchange_error().map(|err| err as &(dyn Error + 'static))
    }
}
