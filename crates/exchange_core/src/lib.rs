//! Exchange Web Services calendar data-access core.
//! Drives remote calls to completion with retry, backoff, date-range
//! splitting and pagination behind a blocking calendar/folder façade.

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod paging;
pub mod retry;
pub mod service;

pub use config::{ConfigError, ExchangeConfig};
pub use error::{DaoError, DaoResult, ExchangeError, ExchangeErrorKind};
pub use gateway::identity::{DirectoryIdentityResolver, IdentityResolver, NoIdentityResolution};
pub use gateway::request::{Request, RequestFactory, RequestOptions};
pub use gateway::response::{FindItemResponse, Response, ResponseCode, ResponseMessage};
pub use gateway::transport::Transport;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::interval::{DateInterval, IntervalError};
pub use model::item::{CalendarItem, ExchangeItem, Folder, FolderKind, ItemChange, TaskItem};
pub use model::refs::{DistinguishedFolder, FolderRef, ItemRef, Principal, PrincipalError};
pub use paging::{NextPage, Page, PageCursor, PaginationWalker};
pub use retry::{
    BackoffPolicy, CancellationToken, DateRangeSplitter, Outcome, RetryDriver, Sleeper,
    ThreadSleeper,
};
pub use service::calendar_service::CalendarService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
