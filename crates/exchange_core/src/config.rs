//! Data-access configuration surface.
//!
//! # Responsibility
//! - Hold the retry, paging, splitting and batching limits consumed by the
//!   retry driver, pagination walker and calendar service.
//! - Load from JSON and validate before any service is built.
//!
//! # Invariants
//! - `page_size` never exceeds the server ceiling `MAX_FIND_ITEMS_CEILING`.
//! - `delete_batch_size` never exceeds `page_size`.

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Server-enforced maximum number of entries per FindItem page.
pub const MAX_FIND_ITEMS_CEILING: u32 = 1000;
/// Upper bound on `max_retries`; `2^30` base units is already ~34 years.
pub const MAX_RETRIES_LIMIT: u32 = 30;

pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_MIN_SPLIT_GRANULARITY_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_DELETE_BATCH_SIZE: usize = 250;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
pub const FAST_BACKOFF_BASE_MS: u64 = 100;
pub const DEFAULT_MAX_PAGE_ITERATIONS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeConfig {
    pub max_retries: u32,
    pub page_size: u32,
    pub min_split_granularity_secs: u64,
    pub delete_batch_size: usize,
    pub backoff_base_ms: u64,
    pub max_page_iterations: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            page_size: DEFAULT_PAGE_SIZE,
            min_split_granularity_secs: DEFAULT_MIN_SPLIT_GRANULARITY_SECS,
            delete_batch_size: DEFAULT_DELETE_BATCH_SIZE,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_page_iterations: DEFAULT_MAX_PAGE_ITERATIONS,
        }
    }
}

impl ExchangeConfig {
    /// Defaults with the 100 ms backoff unit used by test harnesses.
    pub fn fast() -> Self {
        Self {
            backoff_base_ms: FAST_BACKOFF_BASE_MS,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON document; missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::OutOfRange {
                field: "max_retries",
                value: u64::from(self.max_retries),
                min: 0,
                max: u64::from(MAX_RETRIES_LIMIT),
            });
        }
        if self.page_size == 0 || self.page_size > MAX_FIND_ITEMS_CEILING {
            return Err(ConfigError::OutOfRange {
                field: "page_size",
                value: u64::from(self.page_size),
                min: 1,
                max: u64::from(MAX_FIND_ITEMS_CEILING),
            });
        }
        if self.delete_batch_size == 0 || self.delete_batch_size > self.page_size as usize {
            return Err(ConfigError::OutOfRange {
                field: "delete_batch_size",
                value: self.delete_batch_size as u64,
                min: 1,
                max: u64::from(self.page_size),
            });
        }
        if self.min_split_granularity_secs == 0 {
            return Err(ConfigError::MustBePositive("min_split_granularity_secs"));
        }
        self.min_split_granularity()?;
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::MustBePositive("backoff_base_ms"));
        }
        if self.max_page_iterations == 0 {
            return Err(ConfigError::MustBePositive("max_page_iterations"));
        }
        Ok(())
    }

    /// Split granularity as a chrono duration.
    ///
    /// Values beyond chrono's range are `OutOfRange`, never wrapped.
    pub fn min_split_granularity(&self) -> Result<ChronoDuration, ConfigError> {
        i64::try_from(self.min_split_granularity_secs)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .ok_or(ConfigError::OutOfRange {
                field: "min_split_granularity_secs",
                value: self.min_split_granularity_secs,
                min: 1,
                max: (i64::MAX / 1000) as u64,
            })
    }

    pub fn backoff_base_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    MustBePositive(&'static str),
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid configuration document: {message}"),
            Self::MustBePositive(field) => write!(f, "`{field}` must be greater than zero"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "`{field}` = {value} is outside {min}..={max}"),
        }
    }
}

impl Error for ConfigError {}
